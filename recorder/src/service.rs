use anyhow::{anyhow, Context};
use bytes::BufMut;
use chrono::Utc;
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use noisecore::level;
use noisecore::model::NoiseRecord;
use serde_json::json;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use tokio::runtime::Builder;
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::Filter;

const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Default)]
struct ServiceState {
    records: RwLock<Vec<NoiseRecord>>,
    data_hits: AtomicUsize,
    fail_uploads: AtomicBool,
    fail_data: AtomicBool,
}

/// In-memory stand-in for the collection service.
///
/// Speaks the same two endpoints: `POST /upload_audio` takes a multipart
/// form with an `audio` file plus optional `lat`/`lon` fields, measures the
/// loudness itself, and echoes the stored record; `GET /data` returns every
/// record so far. The failure toggles let tests exercise both rejection
/// paths without tearing the server down.
pub struct StubService {
    addr: SocketAddr,
    state: Arc<ServiceState>,
}

impl StubService {
    /// Bind and serve on a background thread. Port 0 picks an ephemeral
    /// port; the bound address is available once this returns.
    pub fn spawn(port: u16) -> anyhow::Result<Self> {
        let state = Arc::new(ServiceState::default());
        let state_for_filter = state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());

        let upload_route = warp::path("upload_audio")
            .and(warp::post())
            .and(warp::multipart::form().max_length(MAX_UPLOAD_BYTES))
            .and(state_filter.clone())
            .and_then(handle_upload);

        let data_route = warp::path("data")
            .and(warp::get())
            .and(state_filter)
            .map(|state: Arc<ServiceState>| {
                state.data_hits.fetch_add(1, Ordering::SeqCst);
                if state.fail_data.load(Ordering::SeqCst) {
                    warp::reply::with_status(
                        warp::reply::json(&json!({"error": "data unavailable"})),
                        StatusCode::INTERNAL_SERVER_ERROR,
                    )
                } else {
                    let records = state.records.read().unwrap().clone();
                    warp::reply::with_status(warp::reply::json(&records), StatusCode::OK)
                }
            });

        let routes = upload_route.or(data_route);
        let (addr_tx, addr_rx) = std::sync::mpsc::channel();
        thread::spawn(move || {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build runtime");
            runtime.block_on(async move {
                match warp::serve(routes).try_bind_ephemeral(([127, 0, 0, 1], port)) {
                    Ok((addr, server)) => {
                        let _ = addr_tx.send(Ok(addr));
                        server.await;
                    }
                    Err(err) => {
                        let _ = addr_tx.send(Err(err));
                    }
                }
            });
        });
        let addr = addr_rx
            .recv()
            .context("stub service thread exited before binding")??;
        info!("stub collection service listening on {addr}");
        Ok(Self { addr, state })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn record_count(&self) -> usize {
        self.state.records.read().unwrap().len()
    }

    pub fn snapshot(&self) -> Vec<NoiseRecord> {
        self.state.records.read().unwrap().clone()
    }

    /// How many times `/data` has been hit, failures included.
    pub fn data_hits(&self) -> usize {
        self.state.data_hits.load(Ordering::SeqCst)
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.state.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_data(&self, fail: bool) {
        self.state.fail_data.store(fail, Ordering::SeqCst);
    }
}

async fn handle_upload(
    form: FormData,
    state: Arc<ServiceState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if state.fail_uploads.load(Ordering::SeqCst) {
        return Ok(reply_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "upload rejected",
        ));
    }
    match ingest(form, &state).await {
        Ok(reply) => Ok(warp::reply::with_status(
            warp::reply::json(&reply),
            StatusCode::OK,
        )),
        Err(err) => {
            warn!("upload rejected: {err}");
            Ok(reply_error(StatusCode::BAD_REQUEST, &err.to_string()))
        }
    }
}

fn reply_error(
    status: StatusCode,
    message: &str,
) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&json!({"error": message})), status)
}

async fn ingest(mut form: FormData, state: &ServiceState) -> anyhow::Result<serde_json::Value> {
    let mut audio: Option<(Vec<u8>, String)> = None;
    let mut latitude = None;
    let mut longitude = None;

    while let Some(part) = form
        .try_next()
        .await
        .map_err(|err| anyhow!("reading multipart body: {err}"))?
    {
        let name = part.name().to_string();
        match name.as_str() {
            "audio" => {
                let filename = part.filename().unwrap_or("upload.wav").to_string();
                audio = Some((collect_part(part).await?, filename));
            }
            "lat" => latitude = parse_coordinate(&collect_part(part).await?, "lat"),
            "lon" => longitude = parse_coordinate(&collect_part(part).await?, "lon"),
            other => debug!("ignoring unexpected field {other}"),
        }
    }

    let (bytes, filename) = audio.ok_or_else(|| anyhow!("No audio file uploaded"))?;
    let db = f64::from(measure_db(&bytes)?);
    let record = NoiseRecord {
        latitude,
        longitude,
        db,
        timestamp: Utc::now().to_rfc3339(),
    };
    state.records.write().unwrap().push(record.clone());
    info!("stored sample {:.2} dB from {}", db, filename);

    Ok(json!({
        "filename": filename,
        "db": record.db,
        "timestamp": record.timestamp,
        "latitude": record.latitude,
        "longitude": record.longitude,
    }))
}

async fn collect_part(part: Part) -> anyhow::Result<Vec<u8>> {
    part.stream()
        .try_fold(Vec::new(), |mut buffer, data| {
            buffer.put(data);
            async move { Ok(buffer) }
        })
        .await
        .map_err(|err| anyhow!("reading field body: {err}"))
}

/// Coordinates arrive as plain form text; anything unparseable is treated
/// the same as absent.
fn parse_coordinate(raw: &[u8], field: &str) -> Option<f64> {
    let text = std::str::from_utf8(raw).ok()?.trim();
    if text.is_empty() {
        return None;
    }
    match text.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("discarding unparseable {} field: {:?}", field, text);
            None
        }
    }
}

/// The service measures loudness from the uploaded audio itself rather than
/// trusting anything the client claims.
fn measure_db(wav: &[u8]) -> anyhow::Result<f32> {
    let reader = hound::WavReader::new(Cursor::new(wav)).context("decoding WAV payload")?;
    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .context("reading float samples")?,
        hound::SampleFormat::Int => {
            let full_scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 / full_scale))
                .collect::<Result<_, _>>()
                .context("reading integer samples")?
        }
    };
    Ok(level::estimate_db(&samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{build_clip, SyntheticConfig};
    use noisecore::capture::Clip;
    use noisecore::locate::LocationSource;
    use noisecore::model::Coordinates;
    use noisecore::session::Session;
    use noisecore::store::{FetchError, RecordStore};
    use noisecore::telemetry::status;
    use noisecore::upload::UploadError;

    fn short_clip(seed: u64) -> Clip {
        build_clip(&SyntheticConfig {
            duration_secs: 1,
            seed,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn upload_then_fetch_round_trip() {
        let stub = StubService::spawn(0).unwrap();
        let session = Session::new(
            stub.base_url(),
            LocationSource::Fixed(Coordinates::new(19.076, 72.8777)),
        );
        let store = RecordStore::new(stub.base_url());

        let report = session.submit_and_refresh(short_clip(7), &store).await;
        let outcome = report.outcome.expect("upload should succeed");
        // Lossless WAV round trip: both sides measure the same samples.
        assert!((outcome.receipt.db - f64::from(outcome.estimated_db)).abs() < 0.5);

        let records = report
            .refresh
            .expect("refresh follows success")
            .expect("fetch should succeed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].latitude, Some(19.076));
        assert_eq!(records[0].longitude, Some(72.8777));
        assert!(!records[0].timestamp.is_empty());
        assert_eq!(session.metrics(), (1, 0));
    }

    #[tokio::test]
    async fn missing_location_still_stores_the_sample() {
        let stub = StubService::spawn(0).unwrap();
        let session = Session::new(stub.base_url(), LocationSource::Unavailable);
        let store = RecordStore::new(stub.base_url());

        let report = session.submit_and_refresh(short_clip(1), &store).await;
        assert!(report.outcome.is_ok());

        let records = stub.snapshot();
        assert_eq!(records.len(), 1);
        assert!(records[0].position().is_none());
        assert!(records[0].db.is_finite());
    }

    #[tokio::test]
    async fn rejected_upload_skips_the_refresh() {
        let stub = StubService::spawn(0).unwrap();
        stub.set_fail_uploads(true);
        let session = Session::new(stub.base_url(), LocationSource::Unavailable);
        let store = RecordStore::new(stub.base_url());

        let report = session.submit_and_refresh(short_clip(2), &store).await;
        match &report.outcome {
            Err(UploadError::Rejected { status }) => assert_eq!(status.as_u16(), 500),
            other => panic!("expected rejection, got {:?}", other),
        }
        let err = report.outcome.unwrap_err();
        assert_eq!(status::upload_error(&err), "Upload failed!");
        assert!(report.refresh.is_none());
        assert_eq!(stub.data_hits(), 0);
        assert_eq!(stub.record_count(), 0);
        assert_eq!(session.metrics(), (0, 1));
    }

    #[tokio::test]
    async fn failed_fetch_leaves_the_previous_working_set() {
        let stub = StubService::spawn(0).unwrap();
        let session = Session::new(stub.base_url(), LocationSource::Unavailable);
        let store = RecordStore::new(stub.base_url());

        session.submit(short_clip(3)).await.expect("seed upload");
        let mut working_set = store.fetch_all().await.expect("first fetch");
        assert_eq!(working_set.len(), 1);

        stub.set_fail_data(true);
        match store.fetch_all().await {
            Err(FetchError::Rejected { status }) => assert_eq!(status.as_u16(), 500),
            other => panic!("expected rejection, got {:?}", other),
        }
        // The caller keeps what it had.
        assert_eq!(working_set.len(), 1);

        stub.set_fail_data(false);
        working_set = store.fetch_all().await.expect("recovered fetch");
        assert_eq!(working_set.len(), 1);
    }

    #[tokio::test]
    async fn unreachable_service_maps_to_connection_error() {
        // Nothing listens on the discard port.
        let session = Session::new("http://127.0.0.1:9", LocationSource::Unavailable);
        let err = session.submit(short_clip(4)).await.unwrap_err();
        assert!(matches!(err, UploadError::Transport(_)));
        assert_eq!(status::upload_error(&err), "Error connecting to server!");
    }

    #[tokio::test]
    async fn second_upload_appends_to_the_record_set() {
        let stub = StubService::spawn(0).unwrap();
        let session = Session::new(
            stub.base_url(),
            LocationSource::Fixed(Coordinates::new(18.99, 72.83)),
        );
        let store = RecordStore::new(stub.base_url());

        session.submit(short_clip(5)).await.expect("first upload");
        session.submit(short_clip(6)).await.expect("second upload");

        let records = store.fetch_all().await.expect("fetch");
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|record| record.position().is_some()));
        assert_eq!(session.metrics(), (2, 0));
    }
}
