use anyhow::Context;
use rodio::{Decoder, OutputStream, Sink};
use std::io::Cursor;

/// Replay a WAV clip through the default output device, blocking until it
/// finishes.
pub fn play_wav(bytes: &[u8]) -> anyhow::Result<()> {
    let (_stream, handle) = OutputStream::try_default().context("opening output device")?;
    let sink = Sink::try_new(&handle).context("creating playback sink")?;
    let source = Decoder::new(Cursor::new(bytes.to_vec())).context("decoding clip")?;
    sink.append(source);
    sink.sleep_until_end();
    Ok(())
}
