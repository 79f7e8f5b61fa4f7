use crate::policy::{HeatPolicy, MarkerPolicy};

/// Coarse loudness bucket backing the marker colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoiseBucket {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerColor {
    Green,
    Yellow,
    Red,
}

impl NoiseBucket {
    /// Total over all float inputs; NaN and `-inf` land in `Low`.
    pub fn for_level(db: f64, policy: &MarkerPolicy) -> Self {
        if db > policy.loud_over {
            NoiseBucket::High
        } else if db > policy.caution_over {
            NoiseBucket::Medium
        } else {
            NoiseBucket::Low
        }
    }

    pub fn color(self) -> MarkerColor {
        match self {
            NoiseBucket::Low => MarkerColor::Green,
            NoiseBucket::Medium => MarkerColor::Yellow,
            NoiseBucket::High => MarkerColor::Red,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NoiseBucket::Low => "low",
            NoiseBucket::Medium => "medium",
            NoiseBucket::High => "high",
        }
    }
}

/// Heat intensity for one sample, clamped into `[floor, 1.0]`.
///
/// The max/min order also keeps degenerate policies total: a NaN ratio
/// collapses to the floor instead of propagating.
pub fn heat_intensity(db: f64, policy: &HeatPolicy) -> f64 {
    ((db - policy.offset) / policy.scale)
        .max(policy.floor)
        .min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker_policy() -> MarkerPolicy {
        MarkerPolicy::default()
    }

    fn heat_policy() -> HeatPolicy {
        HeatPolicy::default()
    }

    #[test]
    fn bucket_boundaries_use_strict_comparison() {
        let policy = marker_policy();
        assert_eq!(NoiseBucket::for_level(20.0, &policy), NoiseBucket::Low);
        assert_eq!(NoiseBucket::for_level(20.001, &policy), NoiseBucket::Medium);
        assert_eq!(NoiseBucket::for_level(60.0, &policy), NoiseBucket::Medium);
        assert_eq!(NoiseBucket::for_level(60.001, &policy), NoiseBucket::High);
    }

    #[test]
    fn bucket_is_total_over_degenerate_inputs() {
        let policy = marker_policy();
        assert_eq!(
            NoiseBucket::for_level(f64::NEG_INFINITY, &policy),
            NoiseBucket::Low
        );
        assert_eq!(
            NoiseBucket::for_level(f64::INFINITY, &policy),
            NoiseBucket::High
        );
        assert_eq!(NoiseBucket::for_level(f64::NAN, &policy), NoiseBucket::Low);
    }

    #[test]
    fn bucket_is_monotone_in_loudness() {
        let policy = marker_policy();
        let levels = [-40.0, 0.0, 19.9, 20.1, 45.0, 59.9, 60.1, 90.0, 140.0];
        for pair in levels.windows(2) {
            let lower = NoiseBucket::for_level(pair[0], &policy);
            let upper = NoiseBucket::for_level(pair[1], &policy);
            assert!(lower <= upper, "bucket regressed between {:?}", pair);
        }
    }

    #[test]
    fn bucket_colors() {
        assert_eq!(NoiseBucket::Low.color(), MarkerColor::Green);
        assert_eq!(NoiseBucket::Medium.color(), MarkerColor::Yellow);
        assert_eq!(NoiseBucket::High.color(), MarkerColor::Red);
    }

    #[test]
    fn heat_intensity_matches_linear_ramp() {
        let policy = heat_policy();
        assert!((heat_intensity(65.0, &policy) - 0.75).abs() < 1e-9);
        assert!((heat_intensity(50.0, &policy) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn heat_intensity_clamps_both_ends() {
        let policy = heat_policy();
        assert_eq!(heat_intensity(-300.0, &policy), 0.1);
        assert_eq!(heat_intensity(0.0, &policy), 0.1);
        assert_eq!(heat_intensity(500.0, &policy), 1.0);
    }

    #[test]
    fn heat_intensity_is_monotone() {
        let policy = heat_policy();
        let mut previous = f64::NEG_INFINITY;
        for db in (-100..200).map(f64::from) {
            let intensity = heat_intensity(db, &policy);
            assert!(intensity >= previous);
            previous = intensity;
        }
    }

    #[test]
    fn degenerate_scale_falls_back_to_floor() {
        let policy = HeatPolicy {
            offset: 20.0,
            scale: 0.0,
            floor: 0.1,
        };
        assert_eq!(heat_intensity(20.0, &policy), 0.1);
        assert_eq!(heat_intensity(80.0, &policy), 1.0);
    }
}
