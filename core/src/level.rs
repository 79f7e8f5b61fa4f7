//! Loudness estimation over raw sample buffers.

/// Root mean square of a sample buffer; zero for an empty buffer.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|sample| sample * sample).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Decibel estimate matching the collection service's own measurement.
///
/// The epsilon keeps silence finite rather than diverging to `-inf`.
pub fn estimate_db(samples: &[f32]) -> f32 {
    20.0 * (rms(samples) + 1e-9).log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_empty_buffer_is_zero() {
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn rms_of_constant_buffer() {
        let samples = vec![0.5f32; 128];
        assert!((rms(&samples) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn full_scale_square_wave_sits_near_zero_db() {
        let samples: Vec<f32> = (0..1024)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        assert!(estimate_db(&samples).abs() < 1e-3);
    }

    #[test]
    fn silence_stays_finite() {
        let silence = vec![0.0f32; 256];
        let db = estimate_db(&silence);
        assert!(db.is_finite());
        assert!((db + 180.0).abs() < 1e-3);
    }

    #[test]
    fn louder_buffer_scores_higher() {
        let quiet = vec![0.01f32; 64];
        let loud = vec![0.5f32; 64];
        assert!(estimate_db(&loud) > estimate_db(&quiet));
    }
}
