//! Scaler trait definition.

use crate::error::Result;
use crate::model::TimeSeries;

/// Fitted, invertible per-feature transform.
///
/// Parameters are learned once by [`Scaler::fit`] and reused unchanged for
/// every later call, so data outside the fitting partition is mapped with the
/// training statistics.
pub trait Scaler: Send + Sync {
    /// Learn per-feature parameters from `series`.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Map a series into scaled space.
    fn transform(&self, series: &TimeSeries) -> Result<TimeSeries>;

    /// Map a scaled series back to the original units.
    fn inverse_transform(&self, series: &TimeSeries) -> Result<TimeSeries>;

    /// Map scaled values of a single feature back to the original units.
    fn inverse_transform_feature(&self, values: &[f64], feature: usize) -> Result<Vec<f64>>;

    /// Whether [`Scaler::fit`] has run.
    fn is_fitted(&self) -> bool;

    /// Name of this scaler.
    fn name(&self) -> &str;

    /// Fit on `series` and return it transformed.
    fn fit_transform(&mut self, series: &TimeSeries) -> Result<TimeSeries> {
        self.fit(series)?;
        self.transform(series)
    }
}
