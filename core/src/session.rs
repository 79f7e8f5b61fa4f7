use crate::capture::Clip;
use crate::locate::LocationSource;
use crate::model::{Coordinates, NoiseRecord};
use crate::store::{FetchError, RecordStore};
use crate::telemetry::{PipelineLog, SessionMetrics};
use crate::upload::{UploadClient, UploadError, UploadReceipt};

/// What a successful submission produced.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub receipt: UploadReceipt,
    /// The coordinates that were actually attached, if any.
    pub coordinates: Option<Coordinates>,
    /// The client-side loudness estimate, for comparison against the receipt.
    pub estimated_db: f32,
}

/// A submission plus the refresh that may follow it.
#[derive(Debug)]
pub struct SessionReport {
    pub outcome: Result<SessionOutcome, UploadError>,
    /// `None` when the upload failed; a refresh only follows a stored sample.
    pub refresh: Option<Result<Vec<NoiseRecord>, FetchError>>,
}

/// Drives one clip through locate and upload, keeping counters as it goes.
#[derive(Debug)]
pub struct Session {
    uploader: UploadClient,
    locator: LocationSource,
    log: PipelineLog,
    metrics: SessionMetrics,
}

impl Session {
    pub fn new(base_url: impl Into<String>, locator: LocationSource) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, locator)
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        locator: LocationSource,
    ) -> Self {
        Self {
            uploader: UploadClient::with_client(http, base_url),
            locator,
            log: PipelineLog::new(),
            metrics: SessionMetrics::new(),
        }
    }

    pub fn metrics(&self) -> (usize, usize) {
        self.metrics.snapshot()
    }

    /// Resolve a position, then upload. Location resolution always settles
    /// first, and a missing position never stops the submission.
    pub async fn submit(&self, clip: Clip) -> Result<SessionOutcome, UploadError> {
        let estimated_db = clip.estimated_db;
        let coordinates = self.locator.resolve().await;
        match self.uploader.submit(clip, coordinates).await {
            Ok(receipt) => {
                self.metrics.record_upload();
                self.log.record(&format!(
                    "sample stored: {:.2} dB (client estimate {:.2} dB)",
                    receipt.db, estimated_db
                ));
                Ok(SessionOutcome {
                    receipt,
                    coordinates,
                    estimated_db,
                })
            }
            Err(err) => {
                self.metrics.record_failure();
                self.log.record(&format!("upload failed: {err}"));
                Err(err)
            }
        }
    }

    /// Submit, then pull the updated record set. The fetch happens only after
    /// a stored sample; failed submissions skip it entirely.
    pub async fn submit_and_refresh(&self, clip: Clip, store: &RecordStore) -> SessionReport {
        let outcome = self.submit(clip).await;
        let refresh = match &outcome {
            Ok(_) => Some(store.fetch_all().await),
            Err(_) => None,
        };
        SessionReport { outcome, refresh }
    }
}
