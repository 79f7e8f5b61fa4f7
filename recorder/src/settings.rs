use anyhow::Context;
use noisecore::locate::LocationSource;
use noisecore::model::Coordinates;
use noisecore::policy::RenderPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Collection service origin, scheme and port included.
    pub base_url: String,
    pub duration_secs: u64,
    /// Fixed submission position; unset means an IP lookup per submission.
    pub location: Option<Coordinates>,
    /// Alternate geolocation endpoint for the lookup path.
    pub lookup_endpoint: Option<String>,
    /// Port for `--serve`; 0 picks an ephemeral one.
    pub stub_port: u16,
    pub policy: RenderPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            duration_secs: 10,
            location: None,
            lookup_endpoint: None,
            stub_port: 5000,
            policy: RenderPolicy::default(),
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading settings {}", path_ref.display()))?;
        let settings: Settings = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing settings {}", path_ref.display()))?;
        Ok(settings)
    }

    /// Location source for a submission. A fixed position on the command line
    /// beats the one in the file, which beats the IP lookup.
    pub fn locator(&self, override_position: Option<Coordinates>, skip: bool) -> LocationSource {
        if skip {
            return LocationSource::Unavailable;
        }
        if let Some(position) = override_position.or(self.location) {
            return LocationSource::Fixed(position);
        }
        match &self.lookup_endpoint {
            Some(endpoint) => LocationSource::lookup_at(endpoint.clone()),
            None => LocationSource::lookup(),
        }
    }
}
