use anyhow::Context;
use clap::Parser;
use log::warn;
use noisecore::capture::{CaptureConfig, Recorder};
use noisecore::model::Coordinates;
use noisecore::render::NoiseBucket;
use noisecore::session::Session;
use noisecore::store::RecordStore;
use noisecore::telemetry::status;
use service::StubService;
use settings::Settings;
use std::path::PathBuf;
use std::sync::Arc;
use synthetic::SyntheticConfig;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

mod playback;
mod service;
mod settings;
mod synthetic;

#[derive(Parser)]
#[command(author, version, about = "Capture-and-upload driver for the ambient noise map")]
struct Args {
    /// Record one clip and submit it to the collection service
    #[arg(long, default_value_t = false)]
    record: bool,
    /// Generate a synthetic clip instead of opening the microphone
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    /// Seed for --synthetic
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Load settings from YAML
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Collection service origin (overrides the settings file)
    #[arg(long)]
    base_url: Option<String>,
    /// Capture length in seconds (overrides the settings file)
    #[arg(long)]
    duration_secs: Option<u64>,
    /// Fixed latitude for the submission
    #[arg(long, requires = "lon")]
    lat: Option<f64>,
    /// Fixed longitude for the submission
    #[arg(long, requires = "lat")]
    lon: Option<f64>,
    /// Submit without any coordinates
    #[arg(long, default_value_t = false)]
    no_location: bool,
    /// Where to keep the recorded clip
    #[arg(long, default_value = "recording.wav")]
    out: PathBuf,
    /// Replay the clip through the speakers after recording
    #[arg(long, default_value_t = false)]
    play: bool,
    /// Print the records the service currently holds
    #[arg(long, default_value_t = false)]
    fetch: bool,
    /// Host the stub collection service (Ctrl+C to stop)
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut settings = if let Some(path) = args.settings.as_ref() {
        Settings::load(path)?
    } else {
        Settings::default()
    };
    if let Some(base) = args.base_url.clone() {
        settings.base_url = base;
    }
    if let Some(duration) = args.duration_secs {
        settings.duration_secs = duration;
    }

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;
    runtime.block_on(run(args, settings))
}

async fn run(args: Args, settings: Settings) -> anyhow::Result<()> {
    let stub = if args.serve {
        let stub = StubService::spawn(settings.stub_port)?;
        println!(
            "Stub collection service on {} (Ctrl+C to stop)...",
            stub.base_url()
        );
        Some(stub)
    } else {
        None
    };
    // A co-hosted stub takes over as the submission target.
    let base_url = stub
        .as_ref()
        .map(StubService::base_url)
        .unwrap_or_else(|| settings.base_url.clone());

    if args.record {
        record_once(&args, &settings, &base_url).await?;
    }
    if args.fetch {
        list_records(&settings, &base_url).await?;
    }
    if !args.record && !args.fetch && stub.is_none() {
        println!("Nothing to do; pass --record, --fetch, or --serve.");
    }

    if let Some(stub) = stub {
        signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
        println!("Stopping with {} records held.", stub.record_count());
    }
    Ok(())
}

async fn record_once(args: &Args, settings: &Settings, base_url: &str) -> anyhow::Result<()> {
    let duration_secs = settings.duration_secs;
    let clip = if args.synthetic {
        println!("Generating a {} second synthetic clip...", duration_secs);
        synthetic::build_clip(&SyntheticConfig {
            duration_secs,
            seed: args.seed,
            ..Default::default()
        })?
    } else {
        println!("{}", status::PERMISSION_PROMPT);
        println!("{}", status::recording(duration_secs));
        let recorder = Arc::new(Recorder::new());
        match recorder.record_async(CaptureConfig { duration_secs }).await {
            Ok(clip) => clip,
            Err(err) => {
                println!("{}", status::capture_error(&err));
                return Err(err.into());
            }
        }
    };

    clip.save(&args.out)
        .with_context(|| format!("saving clip to {}", args.out.display()))?;
    println!(
        "Captured {:.1}s at {} Hz -> {} (client estimate {:.2} dB)",
        clip.duration().as_secs_f64(),
        clip.sample_rate,
        args.out.display(),
        clip.estimated_db
    );
    if args.play {
        playback::play_wav(&clip.wav).context("replaying the clip")?;
    }

    let override_position = match (args.lat, args.lon) {
        (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
        _ => None,
    };
    let locator = settings.locator(override_position, args.no_location);
    let session = Session::new(base_url, locator);
    let store = RecordStore::new(base_url);

    let report = session.submit_and_refresh(clip, &store).await;
    match report.outcome {
        Ok(outcome) => {
            println!("{}", status::finished(outcome.receipt.db));
            match report.refresh {
                Some(Ok(records)) => println!("Service now holds {} records.", records.len()),
                Some(Err(err)) => warn!("{}", status::fetch_failed(&err)),
                None => {}
            }
        }
        Err(err) => {
            println!("{}", status::upload_error(&err));
            return Err(err.into());
        }
    }
    let (uploads, failures) = session.metrics();
    log::info!("session totals: {} uploaded, {} failed", uploads, failures);
    Ok(())
}

async fn list_records(settings: &Settings, base_url: &str) -> anyhow::Result<()> {
    let store = RecordStore::new(base_url);
    let records = match store.fetch_all().await {
        Ok(records) => records,
        Err(err) => {
            println!("{}", status::fetch_failed(&err));
            return Err(err.into());
        }
    };
    println!("Fetched {} records from {}", records.len(), base_url);
    for record in &records {
        let bucket = NoiseBucket::for_level(record.db, &settings.policy.marker);
        match record.position() {
            Some(position) => println!(
                "  [{:>6}] {:>7.2} dB at ({:.4}, {:.4})  {}",
                bucket.label(),
                record.db,
                position.latitude,
                position.longitude,
                record.timestamp
            ),
            None => println!(
                "  [{:>6}] {:>7.2} dB (no location)  {}",
                bucket.label(),
                record.db,
                record.timestamp
            ),
        }
    }
    Ok(())
}
