//! Ensemble combination trait

use std::collections::BTreeMap;

use crate::error::Result;
use crate::model::{ForecastResult, ModelOutcome};

/// Fuses the predictions of several independent models into one forecast.
pub trait EnsembleCombiner: Send + Sync {
    /// Combine every usable outcome.
    ///
    /// Failed outcomes receive weight 0 and are listed as excluded. When
    /// `explicit_weights` is given it replaces the combiner's own rule.
    fn combine(
        &self,
        outcomes: &[ModelOutcome],
        explicit_weights: Option<&BTreeMap<String, f64>>,
    ) -> Result<ForecastResult>;
}
