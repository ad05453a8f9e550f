//! Trait for seasonality detection

/// Trait for seasonality detection
pub trait SeasonalityDetector: Send + Sync {
    /// Detect the dominant seasonality period in the data
    fn detect(&self, data: &[f64], max_period: usize) -> Option<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns a period only when every cycle repeats exactly.
    struct ExactRepeatDetector;

    impl SeasonalityDetector for ExactRepeatDetector {
        fn detect(&self, data: &[f64], max_period: usize) -> Option<usize> {
            (2..=max_period.min(data.len() / 2))
                .find(|&p| data.iter().zip(data.iter().skip(p)).all(|(a, b)| a == b))
        }
    }

    #[test]
    fn test_detects_repeating_pattern() {
        let data: Vec<f64> = (0..24).map(|i| (i % 3) as f64).collect();
        assert_eq!(ExactRepeatDetector.detect(&data, 10), Some(3));
    }

    #[test]
    fn test_object_safe() {
        let detector: Box<dyn SeasonalityDetector> = Box::new(ExactRepeatDetector);
        assert_eq!(detector.detect(&[1.0, 2.0, 3.0, 4.0], 2), None);
    }
}
