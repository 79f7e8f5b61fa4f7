use crate::capture::Clip;
use crate::model::Coordinates;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    /// The service answered with a non-success status.
    #[error("upload rejected with status {status}")]
    Rejected { status: StatusCode },
    /// The request never completed: connection refused, timeout, or a
    /// malformed reply body.
    #[error("connection error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The service's acknowledgement of a stored sample.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    /// Loudness as the service measured it from the uploaded audio.
    pub db: f64,
}

/// Sends finished clips to the collection service.
#[derive(Debug, Clone)]
pub struct UploadClient {
    base: String,
    http: reqwest::Client,
}

impl UploadClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base)
    }

    pub fn with_client(http: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            base: trim_base(base.into()),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Upload one clip, consuming it. Coordinates ride along as plain form
    /// fields when present and are omitted entirely when not.
    pub async fn submit(
        &self,
        clip: Clip,
        coordinates: Option<Coordinates>,
    ) -> Result<UploadReceipt, UploadError> {
        let audio = Part::bytes(clip.wav)
            .file_name("recording.wav")
            .mime_str("audio/wav")?;
        let mut form = Form::new().part("audio", audio);
        if let Some(position) = coordinates {
            form = form
                .text("lat", position.latitude.to_string())
                .text("lon", position.longitude.to_string());
        }

        let response = self
            .http
            .post(format!("{}/upload_audio", self.base))
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Rejected { status });
        }
        Ok(response.json::<UploadReceipt>().await?)
    }
}

fn trim_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}
