use crate::model::Coordinates;
use log::{info, warn};
use serde::Deserialize;
use std::time::Duration;

/// Public IP geolocation endpoint used when no fixed position is configured.
pub const DEFAULT_LOOKUP_ENDPOINT: &str = "http://ip-api.com/json";

const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(8);

/// Where a submission's coordinates come from.
///
/// Resolution is best effort: every variant settles before the upload goes
/// out, and any failure degrades to "no position" rather than blocking the
/// sample.
#[derive(Debug, Clone)]
pub enum LocationSource {
    /// Use these coordinates as-is.
    Fixed(Coordinates),
    /// Ask an IP geolocation service once per submission.
    Lookup {
        endpoint: String,
        timeout: Duration,
    },
    /// Submit without coordinates.
    Unavailable,
}

#[derive(Debug, Deserialize)]
struct LookupReply {
    lat: f64,
    lon: f64,
}

impl LocationSource {
    pub fn lookup() -> Self {
        LocationSource::Lookup {
            endpoint: DEFAULT_LOOKUP_ENDPOINT.to_string(),
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn lookup_at(endpoint: impl Into<String>) -> Self {
        LocationSource::Lookup {
            endpoint: endpoint.into(),
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub async fn resolve(&self) -> Option<Coordinates> {
        match self {
            LocationSource::Fixed(coordinates) => Some(*coordinates),
            LocationSource::Unavailable => {
                info!("location unavailable; submitting without coordinates");
                None
            }
            LocationSource::Lookup { endpoint, timeout } => {
                match lookup_once(endpoint, *timeout).await {
                    Ok(coordinates) => Some(coordinates),
                    Err(err) => {
                        warn!("geolocation lookup failed: {err}; submitting without coordinates");
                        None
                    }
                }
            }
        }
    }
}

async fn lookup_once(endpoint: &str, timeout: Duration) -> Result<Coordinates, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let reply: LookupReply = client
        .get(endpoint)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(Coordinates::new(reply.lat, reply.lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn fixed_source_resolves_to_its_coordinates() {
        let source = LocationSource::Fixed(Coordinates::new(19.07, 72.88));
        let resolved = block_on(source.resolve());
        assert_eq!(resolved, Some(Coordinates::new(19.07, 72.88)));
    }

    #[test]
    fn unavailable_source_resolves_to_none() {
        let resolved = block_on(LocationSource::Unavailable.resolve());
        assert!(resolved.is_none());
    }

    #[test]
    fn unreachable_lookup_degrades_to_none() {
        // Nothing listens on the discard port, so the connection fails fast.
        let source = LocationSource::Lookup {
            endpoint: "http://127.0.0.1:9/json".to_string(),
            timeout: Duration::from_millis(500),
        };
        let resolved = block_on(source.resolve());
        assert!(resolved.is_none());
    }
}
