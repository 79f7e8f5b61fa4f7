use crate::model::NoiseRecord;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The service answered with a non-success status.
    #[error("record fetch rejected with status {status}")]
    Rejected { status: StatusCode },
    /// The request never completed, or the body was not valid record JSON.
    #[error("connection error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Read side of the collection service: fetches the full record set.
///
/// Callers keep their previous working set when a fetch fails; this client
/// only ever hands back a complete new one.
#[derive(Debug, Clone)]
pub struct RecordStore {
    base: String,
    http: reqwest::Client,
}

impl RecordStore {
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base)
    }

    pub fn with_client(http: reqwest::Client, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self { base, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub async fn fetch_all(&self) -> Result<Vec<NoiseRecord>, FetchError> {
        let response = self.http.get(format!("{}/data", self.base)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Rejected { status });
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_rejection_names_the_status() {
        let err = FetchError::Rejected {
            status: StatusCode::SERVICE_UNAVAILABLE,
        };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn store_normalizes_base_url() {
        let store = RecordStore::new("http://localhost:5000///");
        assert_eq!(store.base_url(), "http://localhost:5000");
    }
}
