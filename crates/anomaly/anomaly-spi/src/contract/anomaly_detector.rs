//! Anomaly detector trait definition.

use crate::error::Result;
use crate::model::{AnomalyScoreSeries, DetectorKind, FitSummary};

/// Anomaly detector trait.
///
/// A detector derives its threshold once from the fitting data. Scoring new
/// data re-applies that threshold; it is never recomputed from the new
/// scores.
pub trait AnomalyDetector: Send + Sync {
    /// Variant tag.
    fn kind(&self) -> DetectorKind;

    /// Fit the detector to training data and derive its threshold.
    fn fit(&mut self, data: &[f64]) -> Result<FitSummary>;

    /// Compute anomaly scores for `data` without thresholding.
    fn score(&self, data: &[f64]) -> Result<Vec<f64>>;

    /// Scores and flags for the fitting data.
    fn detect_fitted(&self) -> Result<AnomalyScoreSeries>;

    /// Scores and flags for new data under the stored threshold.
    fn detect(&self, data: &[f64]) -> Result<AnomalyScoreSeries>;

    /// Threshold derived at fit time, `None` before fitting.
    fn threshold(&self) -> Option<f64>;

    /// Check if detector has been fitted.
    fn is_fitted(&self) -> bool {
        self.threshold().is_some()
    }

    /// Fewest observations `fit` accepts.
    fn min_observations(&self) -> usize;
}
