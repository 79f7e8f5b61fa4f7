use serde::{Deserialize, Serialize};

/// Thresholds separating the quiet / moderate / loud marker buckets.
///
/// Comparisons are strictly greater-than, so a sample sitting exactly on a
/// threshold stays in the lower bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerPolicy {
    pub caution_over: f64,
    pub loud_over: f64,
}

impl Default for MarkerPolicy {
    fn default() -> Self {
        Self {
            caution_over: 20.0,
            loud_over: 60.0,
        }
    }
}

/// Linear ramp mapping decibels onto heat intensities in `[floor, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatPolicy {
    pub offset: f64,
    pub scale: f64,
    pub floor: f64,
}

impl Default for HeatPolicy {
    fn default() -> Self {
        Self {
            offset: 20.0,
            scale: 60.0,
            floor: 0.1,
        }
    }
}

/// Everything the renderer needs to turn loudness into map styling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderPolicy {
    pub marker: MarkerPolicy,
    pub heat: HeatPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds() {
        let policy = RenderPolicy::default();
        assert_eq!(policy.marker.caution_over, 20.0);
        assert_eq!(policy.marker.loud_over, 60.0);
        assert_eq!(policy.heat.offset, 20.0);
        assert_eq!(policy.heat.scale, 60.0);
        assert_eq!(policy.heat.floor, 0.1);
    }

    #[test]
    fn partial_overrides_keep_remaining_defaults() {
        let parsed: RenderPolicy =
            serde_json::from_str(r#"{"marker": {"loud_over": 70.0}}"#).unwrap();
        assert_eq!(parsed.marker.loud_over, 70.0);
        assert_eq!(parsed.marker.caution_over, 20.0);
        assert_eq!(parsed.heat, HeatPolicy::default());
    }
}
