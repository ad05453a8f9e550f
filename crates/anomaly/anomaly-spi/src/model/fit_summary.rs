//! Fit diagnostics.

use serde::{Deserialize, Serialize};

use crate::model::DetectorKind;

/// What a detector learned from its fitting data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub method: DetectorKind,
    /// Observations in the fitting series.
    pub observations: usize,
    /// Threshold derived from the fitting data.
    pub threshold: f64,
    /// Whether the iterative fit converged (always true for closed-form fits).
    pub converged: bool,
    pub iterations: usize,
    /// Log-likelihood of the fitting data, when the model is probabilistic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_likelihood: Option<f64>,
}
