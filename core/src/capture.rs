use crate::level;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use hound::{SampleFormat, WavSpec, WavWriter};
use log::{info, warn};
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use thiserror::Error;

/// How long one capture runs. Ten seconds matches the collection service's
/// expectations for a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    pub duration_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { duration_secs: 10 }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    /// No usable input device, or the platform refused to open one.
    #[error("microphone access denied: {0}")]
    Denied(String),
    /// A capture is already running on this recorder.
    #[error("recording already in progress")]
    Busy,
    /// The stream opened but produced no usable audio.
    #[error("audio stream failed: {0}")]
    Stream(String),
}

/// Audio fragments accumulated during one capture, in arrival order.
#[derive(Debug, Default)]
pub struct PendingCapture {
    chunks: Vec<Vec<f32>>,
}

impl PendingCapture {
    pub fn append(&mut self, chunk: Vec<f32>) {
        self.chunks.push(chunk);
    }

    pub fn fragment_count(&self) -> usize {
        self.chunks.len()
    }

    /// Assemble the fragments into a finished clip. Capturing nothing at all
    /// is an error; the caller has no sample to submit.
    pub fn finalize(self, sample_rate: u32) -> Result<Clip, CaptureError> {
        let total: usize = self.chunks.iter().map(Vec::len).sum();
        if total == 0 {
            return Err(CaptureError::Stream("no audio fragments captured".into()));
        }
        let mut samples = Vec::with_capacity(total);
        for chunk in &self.chunks {
            samples.extend_from_slice(chunk);
        }
        let estimated_db = level::estimate_db(&samples);
        let wav = encode_wav(&samples, sample_rate)?;
        Ok(Clip {
            wav,
            sample_rate,
            sample_count: samples.len(),
            estimated_db,
        })
    }
}

/// A finished mono recording, already encoded as 16-bit WAV.
#[derive(Debug, Clone)]
pub struct Clip {
    pub wav: Vec<u8>,
    pub sample_rate: u32,
    pub sample_count: usize,
    pub estimated_db: f32,
}

impl Clip {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.sample_count as f64 / self.sample_rate as f64)
    }

    /// Keep a copy on disk so the sample can be replayed locally.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.wav)
    }
}

/// Opens the default input device and records fixed-length clips.
///
/// Only one capture may run at a time; overlapping requests fail fast with
/// [`CaptureError::Busy`] instead of queueing.
#[derive(Debug, Default)]
pub struct Recorder {
    active: AtomicBool,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Record one clip, blocking the calling thread for the whole duration.
    pub fn record(&self, config: &CaptureConfig) -> Result<Clip, CaptureError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CaptureError::Busy);
        }
        let result = run_capture(config);
        self.active.store(false, Ordering::SeqCst);
        result
    }

    /// Async wrapper around [`Recorder::record`]. The cpal stream is not
    /// `Send`, so the whole capture runs on one blocking thread.
    pub async fn record_async(
        self: &Arc<Self>,
        config: CaptureConfig,
    ) -> Result<Clip, CaptureError> {
        let recorder = Arc::clone(self);
        tokio::task::spawn_blocking(move || recorder.record(&config))
            .await
            .map_err(|err| CaptureError::Stream(format!("capture task failed: {err}")))?
    }
}

fn run_capture(config: &CaptureConfig) -> Result<Clip, CaptureError> {
    let (device, supported) = open_input()?;
    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels() as usize;
    let stream_config: cpal::StreamConfig = supported.config();

    let (tx, rx) = mpsc::channel();
    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, channels, tx)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, channels, tx)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, channels, tx)?,
        other => {
            return Err(CaptureError::Stream(format!(
                "unsupported sample format {other:?}"
            )))
        }
    };
    stream
        .play()
        .map_err(|err| CaptureError::Denied(err.to_string()))?;
    info!(
        "recording for {}s at {} Hz ({} channel{})",
        config.duration_secs,
        sample_rate,
        channels,
        if channels == 1 { "" } else { "s" }
    );

    std::thread::sleep(Duration::from_secs(config.duration_secs));
    // Dropping the stream stops the callbacks and closes the sender side.
    drop(stream);

    let mut pending = PendingCapture::default();
    while let Ok(chunk) = rx.recv() {
        pending.append(chunk);
    }
    info!("capture finished with {} fragments", pending.fragment_count());
    pending.finalize(sample_rate)
}

fn open_input() -> Result<(cpal::Device, cpal::SupportedStreamConfig), CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| CaptureError::Denied("no input device available".into()))?;
    let supported = device
        .default_input_config()
        .map_err(|err| CaptureError::Denied(err.to_string()))?;
    info!(
        "using input device {}",
        device.name().unwrap_or_else(|_| "unknown".into())
    );
    Ok((device, supported))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    tx: mpsc::Sender<Vec<f32>>,
) -> Result<cpal::Stream, CaptureError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                // The receiver disappears only during teardown.
                let _ = tx.send(downmix(data, channels));
            },
            |err| warn!("audio stream error: {err}"),
            None,
        )
        .map_err(|err| CaptureError::Denied(err.to_string()))?;
    Ok(stream)
}

/// Average interleaved frames down to mono f32.
fn downmix<T>(input: &[T], channels: usize) -> Vec<f32>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = channels.max(1);
    input
        .chunks(channels)
        .map(|frame| {
            let sum: f32 = frame.iter().map(|sample| f32::from_sample(*sample)).sum();
            sum / frame.len() as f32
        })
        .collect()
}

fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, CaptureError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec)
        .map_err(|err| CaptureError::Stream(err.to_string()))?;
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * i16::MAX as f32).round() as i16)
            .map_err(|err| CaptureError::Stream(err.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|err| CaptureError::Stream(err.to_string()))?;
    Ok(cursor.into_inner())
}
