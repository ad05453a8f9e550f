//! Consensus report over several detectors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{AnomalyScoreSeries, DetectorKind};

/// A detector that was requested but could not produce scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorFailure {
    pub method: DetectorKind,
    pub reason: String,
}

/// Per-method scores merged into one verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub per_method: BTreeMap<DetectorKind, AnomalyScoreSeries>,
    /// Sorted union of every method's flagged indices.
    pub consensus_indices: Vec<usize>,
    /// Fraction of points each method flagged.
    pub method_confidence: BTreeMap<DetectorKind, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<DetectorFailure>,
}

impl AnomalyReport {
    pub fn methods(&self) -> impl Iterator<Item = DetectorKind> + '_ {
        self.per_method.keys().copied()
    }

    /// Whether index `i` is in the consensus set.
    pub fn is_anomaly(&self, i: usize) -> bool {
        self.consensus_indices.binary_search(&i).is_ok()
    }

    /// Consensus as a boolean mask over `len` points.
    pub fn consensus_mask(&self, len: usize) -> Vec<bool> {
        let mut mask = vec![false; len];
        for &i in &self.consensus_indices {
            if let Some(flag) = mask.get_mut(i) {
                *flag = true;
            }
        }
        mask
    }
}
