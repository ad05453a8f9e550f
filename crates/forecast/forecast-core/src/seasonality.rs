//! Seasonal period detection by autocorrelation.

use forecast_spi::SeasonalityDetector;
use serde::{Deserialize, Serialize};

/// Default minimum autocorrelation for a lag to count as a period.
pub const DEFAULT_ACF_THRESHOLD: f64 = 0.3;

/// Picks the lag with the strongest autocorrelation above a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutocorrelationDetector {
    threshold: f64,
}

impl AutocorrelationDetector {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_ACF_THRESHOLD,
        }
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for AutocorrelationDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SeasonalityDetector for AutocorrelationDetector {
    fn detect(&self, data: &[f64], max_period: usize) -> Option<usize> {
        detect_period(data, max_period, self.threshold)
    }
}

/// Strongest lag in `2..=max_period` whose autocorrelation exceeds
/// `threshold`. Lags are capped at half the series so every candidate is
/// seen at least twice.
pub fn detect_period(data: &[f64], max_period: usize, threshold: f64) -> Option<usize> {
    let max_lag = max_period.min(data.len() / 2);
    if max_lag < 2 {
        return None;
    }
    let acf = autocorrelation(data, max_lag);
    if acf.iter().skip(1).all(|&r| r == 1.0) {
        // constant series
        return None;
    }

    acf.iter()
        .enumerate()
        .skip(2)
        .filter(|&(_, &r)| r > threshold)
        .fold(None, |best: Option<(usize, f64)>, (lag, &r)| match best {
            Some((_, b)) if b >= r => best,
            _ => Some((lag, r)),
        })
        .map(|(lag, _)| lag)
}

/// Sample autocorrelation for lags `0..=max_lag` (capped at `len - 1`).
///
/// A constant series has no variance; every lag is reported as 1.
pub fn autocorrelation(data: &[f64], max_lag: usize) -> Vec<f64> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }
    let max_lag = max_lag.min(n - 1);
    let mean = data.iter().sum::<f64>() / n as f64;
    let var: f64 = data.iter().map(|x| (x - mean).powi(2)).sum();
    if var == 0.0 {
        return vec![1.0; max_lag + 1];
    }

    (0..=max_lag)
        .map(|lag| {
            data.iter()
                .zip(&data[lag..])
                .map(|(a, b)| (a - mean) * (b - mean))
                .sum::<f64>()
                / var
        })
        .collect()
}
