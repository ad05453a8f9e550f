//! Forecast accuracy metrics
//!
//! Every metric returns `NaN` when the inputs are empty or differ in length.

use serde::{Deserialize, Serialize};

const MAPE_EPSILON: f64 = 1e-8;

fn paired(actual: &[f64], predicted: &[f64]) -> bool {
    actual.len() == predicted.len() && !actual.is_empty()
}

/// Mean Absolute Error (MAE)
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if !paired(actual, predicted) {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    sum / actual.len() as f64
}

/// Mean Squared Error (MSE)
pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if !paired(actual, predicted) {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    sum / actual.len() as f64
}

/// Root Mean Squared Error (RMSE), in the units of the data.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mse(actual, predicted).sqrt()
}

/// Mean Absolute Percentage Error, as a percentage.
///
/// The denominator is offset by `1e-8` so zero actuals do not divide by zero.
pub fn mape(actual: &[f64], predicted: &[f64]) -> f64 {
    if !paired(actual, predicted) {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| ((a - p) / (a + MAPE_EPSILON)).abs())
        .sum();
    100.0 * sum / actual.len() as f64
}

/// Coefficient of determination.
///
/// 1.0 is a perfect fit, 0.0 matches predicting the mean. A constant actual
/// series scores 1.0 when matched exactly and 0.0 otherwise.
pub fn r2(actual: &[f64], predicted: &[f64]) -> f64 {
    if !paired(actual, predicted) {
        return f64::NAN;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// All point-forecast metrics at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub mape: f64,
    pub r2: f64,
}

impl MetricsSummary {
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Self {
        Self {
            mse: mse(actual, predicted),
            rmse: rmse(actual, predicted),
            mae: mae(actual, predicted),
            mape: mape(actual, predicted),
            r2: r2(actual, predicted),
        }
    }

    /// Metrics over every step of a batch of horizons.
    pub fn compute_batch(actual: &[Vec<f64>], predicted: &[Vec<f64>]) -> Self {
        let a: Vec<f64> = actual.iter().flatten().copied().collect();
        let p: Vec<f64> = predicted.iter().flatten().copied().collect();
        if actual.len() != predicted.len() {
            return Self::compute(&a, &[]);
        }
        Self::compute(&a, &p)
    }
}
