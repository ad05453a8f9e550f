//! Consensus merger trait definition.

use crate::error::Result;
use crate::model::{AnomalyReport, AnomalyScoreSeries};

/// Merges per-method score series over the same points into one report.
pub trait ConsensusMerger: Send + Sync {
    /// Fails when `series` is empty or the series cover different lengths.
    fn merge(&self, series: Vec<AnomalyScoreSeries>) -> Result<AnomalyReport>;
}
