//! Stationarity advisory and trend removal.

use pipeline_api::StationarityMethod;
use pipeline_spi::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Rolling statistics must vary less than this for a series to count as stationary.
pub const STATIONARITY_TOLERANCE: f64 = 0.1;

/// Largest rolling window used by [`check_stationarity`].
pub const MAX_ROLLING_WINDOW: usize = 50;

const LOG_EPSILON: f64 = 1e-8;

/// Outcome of the rolling-statistics stationarity heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationarityReport {
    pub is_stationary: bool,
    /// Rolling window size used; 0 when the series was too short to check.
    pub window: usize,
    /// Sample std of the rolling mean.
    pub rolling_mean_std: f64,
    /// Sample std of the rolling std.
    pub rolling_std_std: f64,
}

impl StationarityReport {
    fn unchecked() -> Self {
        Self {
            is_stationary: true,
            window: 0,
            rolling_mean_std: 0.0,
            rolling_std_std: 0.0,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); 0 for fewer than two values.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Compare the spread of rolling mean and rolling std against
/// [`STATIONARITY_TOLERANCE`] over a window of `min(50, N / 4)`.
///
/// Series shorter than two windows are reported stationary. The result is
/// advisory only.
pub fn check_stationarity(values: &[f64]) -> StationarityReport {
    let window = MAX_ROLLING_WINDOW.min(values.len() / 4);
    if window < 2 || values.len() < 2 * window {
        return StationarityReport::unchecked();
    }

    let (means, stds): (Vec<f64>, Vec<f64>) = values
        .windows(window)
        .map(|w| (mean(w), sample_std(w)))
        .unzip();
    let rolling_mean_std = sample_std(&means);
    let rolling_std_std = sample_std(&stds);

    StationarityReport {
        is_stationary: rolling_mean_std < STATIONARITY_TOLERANCE
            && rolling_std_std < STATIONARITY_TOLERANCE,
        window,
        rolling_mean_std,
        rolling_std_std,
    }
}

/// Apply first differencing `order` times. Each pass shortens the series by one.
pub fn difference(values: &[f64], order: usize) -> Vec<f64> {
    let mut result = values.to_vec();
    for _ in 0..order {
        if result.len() < 2 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Least-squares intercept and slope of `values` against their index.
pub fn linear_fit(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    if values.len() < 2 {
        return (values.first().copied().unwrap_or(0.0), 0.0);
    }
    let t_mean = (n - 1.0) / 2.0;
    let y_mean = mean(values);
    let (mut num, mut den) = (0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let dt = i as f64 - t_mean;
        num += dt * (y - y_mean);
        den += dt * dt;
    }
    let slope = num / den;
    (y_mean - slope * t_mean, slope)
}

/// Remove trend using `method`.
///
/// `Diff` and `LogDiff` return `N - 1` values; `Detrend` returns `N`.
pub fn make_stationary(values: &[f64], method: StationarityMethod) -> Result<Vec<f64>> {
    if values.len() < 2 {
        return Err(PipelineError::InsufficientData {
            required: 2,
            actual: values.len(),
        });
    }
    match method {
        StationarityMethod::Diff => Ok(difference(values, 1)),
        StationarityMethod::LogDiff => {
            if let Some(bad) = values.iter().find(|&&x| x + LOG_EPSILON <= 0.0) {
                return Err(PipelineError::TransformError(format!(
                    "log difference needs positive values, found {}",
                    bad
                )));
            }
            let logs: Vec<f64> = values.iter().map(|x| (x + LOG_EPSILON).ln()).collect();
            Ok(difference(&logs, 1))
        }
        StationarityMethod::Detrend => {
            let (intercept, slope) = linear_fit(values);
            Ok(values
                .iter()
                .enumerate()
                .map(|(i, y)| y - (intercept + slope * i as f64))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_series_reported_stationary() {
        let report = check_stationarity(&[1.0, 2.0, 3.0]);
        assert!(report.is_stationary);
        assert_eq!(report.window, 0);
    }

    #[test]
    fn test_constant_series_is_stationary() {
        let report = check_stationarity(&vec![3.0; 200]);
        assert!(report.is_stationary);
        assert_eq!(report.window, 50);
        assert_eq!(report.rolling_mean_std, 0.0);
    }

    #[test]
    fn test_trend_is_not_stationary() {
        let values: Vec<f64> = (0..200).map(|i| i as f64).collect();
        let report = check_stationarity(&values);
        assert!(!report.is_stationary);
        assert!(report.rolling_mean_std > STATIONARITY_TOLERANCE);
    }

    #[test]
    fn test_window_scales_with_length() {
        let report = check_stationarity(&vec![1.0; 40]);
        assert_eq!(report.window, 10);
    }

    #[test]
    fn test_difference_orders() {
        let values = [1.0, 4.0, 9.0, 16.0];
        assert_eq!(difference(&values, 1), vec![3.0, 5.0, 7.0]);
        assert_eq!(difference(&values, 2), vec![2.0, 2.0]);
        assert!(difference(&[1.0], 1).is_empty());
    }

    #[test]
    fn test_detrend_removes_line() {
        let values: Vec<f64> = (0..10).map(|i| 2.0 + 0.5 * i as f64).collect();
        let detrended = make_stationary(&values, StationarityMethod::Detrend).unwrap();
        assert_eq!(detrended.len(), 10);
        assert!(detrended.iter().all(|x| x.abs() < 1e-9));
    }

    #[test]
    fn test_log_diff() {
        let values = [1.0, std::f64::consts::E];
        let out = make_stationary(&values, StationarityMethod::LogDiff).unwrap();
        assert!((out[0] - 1.0).abs() < 1e-6);
        assert!(make_stationary(&[1.0, -2.0], StationarityMethod::LogDiff).is_err());
    }

    #[test]
    fn test_make_stationary_needs_two_points() {
        assert!(make_stationary(&[1.0], StationarityMethod::Diff).is_err());
    }
}
