//! Prediction interval model

use serde::{Deserialize, Serialize};

/// Point forecast with a symmetric or asymmetric prediction band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Point forecast
    pub forecast: Vec<f64>,
    /// Lower bound of the interval
    pub lower: Vec<f64>,
    /// Upper bound of the interval
    pub upper: Vec<f64>,
    /// Interval width (e.g., 0.99 for 99%)
    pub confidence_level: f64,
}

impl ConfidenceInterval {
    pub fn len(&self) -> usize {
        self.forecast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forecast.is_empty()
    }

    /// Whether `value` at step `i` lies outside the band.
    pub fn is_outside(&self, i: usize, value: f64) -> bool {
        value < self.lower[i] || value > self.upper[i]
    }
}
