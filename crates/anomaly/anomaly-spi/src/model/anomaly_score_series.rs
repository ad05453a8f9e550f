//! Per-method anomaly scores.

use serde::{Deserialize, Serialize};

use crate::model::DetectorKind;

/// One score and one flag per original time index, produced by a single
/// detector, plus the threshold that binarised the scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyScoreSeries {
    pub method: DetectorKind,
    /// Anomaly score per point; larger is more anomalous.
    pub scores: Vec<f64>,
    /// Whether each point was flagged.
    pub flags: Vec<bool>,
    /// Threshold used for detection.
    pub threshold: f64,
}

impl AnomalyScoreSeries {
    pub fn new(method: DetectorKind, scores: Vec<f64>, flags: Vec<bool>, threshold: f64) -> Self {
        Self {
            method,
            scores,
            flags,
            threshold,
        }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Get indices of detected anomalies.
    pub fn anomaly_indices(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, &flag)| flag.then_some(i))
            .collect()
    }

    /// Count of detected anomalies.
    pub fn anomaly_count(&self) -> usize {
        self.flags.iter().filter(|&&x| x).count()
    }

    /// Fraction of points flagged, 0 for an empty series.
    pub fn confidence(&self) -> f64 {
        if self.flags.is_empty() {
            0.0
        } else {
            self.anomaly_count() as f64 / self.flags.len() as f64
        }
    }
}
