use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One stored noise sample as the collection service reports it.
///
/// Coordinates are optional: a sample submitted without a location keeps its
/// loudness and timestamp but never reaches the map layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub db: f64,
    #[serde(default)]
    pub timestamp: String,
}

impl NoiseRecord {
    pub fn located(coordinates: Coordinates, db: f64, timestamp: impl Into<String>) -> Self {
        Self {
            latitude: Some(coordinates.latitude),
            longitude: Some(coordinates.longitude),
            db,
            timestamp: timestamp.into(),
        }
    }

    pub fn unlocated(db: f64, timestamp: impl Into<String>) -> Self {
        Self {
            latitude: None,
            longitude: None,
            db,
            timestamp: timestamp.into(),
        }
    }

    /// Both coordinates, or `None` when either is missing.
    pub fn position(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_requires_both_coordinates() {
        let whole = NoiseRecord::located(Coordinates::new(19.07, 72.88), 55.0, "t0");
        assert!(whole.position().is_some());

        let missing_lon = NoiseRecord {
            longitude: None,
            ..whole.clone()
        };
        assert!(missing_lon.position().is_none());

        let missing_lat = NoiseRecord {
            latitude: None,
            ..whole
        };
        assert!(missing_lat.position().is_none());
    }

    #[test]
    fn parses_null_and_absent_coordinates() {
        let raw = r#"[
            {"latitude": 19.0760, "longitude": 72.8777, "db": 64.2, "timestamp": "2026-08-25T10:00:00"},
            {"latitude": null, "longitude": null, "db": 31.0, "timestamp": "2026-08-25T10:01:00"},
            {"db": 12.5, "timestamp": "2026-08-25T10:02:00"}
        ]"#;
        let records: Vec<NoiseRecord> = serde_json::from_str(raw).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records[0].position().is_some());
        assert!(records[1].position().is_none());
        assert!(records[2].position().is_none());
    }

    #[test]
    fn tolerates_unknown_fields() {
        let raw = r#"{"latitude": 19.0, "longitude": 72.8, "db": 40.0,
                      "timestamp": "t", "filename": "abc.wav"}"#;
        let record: NoiseRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.db, 40.0);
        assert_eq!(record.timestamp, "t");
    }

    #[test]
    fn serialization_omits_missing_coordinates() {
        let record = NoiseRecord::unlocated(22.0, "t1");
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("latitude"));
        assert!(json.contains("\"db\":22.0"));
    }
}
