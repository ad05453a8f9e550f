//! Inverse-error ensemble combiner.

use std::collections::BTreeMap;

use forecast_api::EnsembleConfig;
use forecast_spi::{
    EnsembleCombiner, ExcludedModel, ForecastError, ForecastResult, ModelOutcome, Outcome, Result,
};
use tracing::{debug, warn};

/// Weights each contributing model by `1 / validation_error`, normalised
/// to sum to 1.
///
/// Models whose validation error is at or below the configured tolerance
/// share all of the weight equally. Failed outcomes and predictions with
/// non-finite values are excluded before normalisation.
#[derive(Debug, Clone, Default)]
pub struct InverseErrorCombiner {
    config: EnsembleConfig,
}

struct Contributor<'a> {
    model: &'a str,
    values: &'a [f64],
    error: f64,
}

impl InverseErrorCombiner {
    pub fn new(config: EnsembleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    fn inverse_error_weights(&self, contributors: &[Contributor<'_>]) -> Vec<f64> {
        let tolerance = self.config.zero_error_tolerance;
        let exact = contributors.iter().filter(|c| c.error <= tolerance).count();
        if exact > 0 {
            let share = 1.0 / exact as f64;
            return contributors
                .iter()
                .map(|c| if c.error <= tolerance { share } else { 0.0 })
                .collect();
        }
        let inverse: Vec<f64> = contributors.iter().map(|c| 1.0 / c.error).collect();
        let total: f64 = inverse.iter().sum();
        inverse.iter().map(|w| w / total).collect()
    }
}

fn explicit_weights(
    contributors: &[Contributor<'_>],
    explicit: &BTreeMap<String, f64>,
) -> Result<Vec<f64>> {
    if let Some((name, w)) = explicit.iter().find(|(_, w)| !(w.is_finite() && **w >= 0.0)) {
        return Err(ForecastError::invalid(
            "weights",
            format!("weight for '{}' must be finite and non-negative, got {}", name, w),
        ));
    }
    for name in explicit.keys() {
        if !contributors.iter().any(|c| c.model == name.as_str()) {
            debug!(model = %name, "Explicit weight for a non-contributing model ignored");
        }
    }
    let raw: Vec<f64> = contributors
        .iter()
        .map(|c| explicit.get(c.model).copied().unwrap_or(0.0))
        .collect();
    let total: f64 = raw.iter().sum();
    if total <= 0.0 {
        return Err(ForecastError::invalid(
            "weights",
            "explicit weights sum to zero over the contributing models",
        ));
    }
    Ok(raw.iter().map(|w| w / total).collect())
}

/// Per-step population standard deviation across predictions.
fn spread(contributors: &[Contributor<'_>], horizon: usize) -> Vec<f64> {
    let n = contributors.len() as f64;
    (0..horizon)
        .map(|h| {
            let mean = contributors.iter().map(|c| c.values[h]).sum::<f64>() / n;
            let var = contributors
                .iter()
                .map(|c| (c.values[h] - mean).powi(2))
                .sum::<f64>()
                / n;
            var.sqrt()
        })
        .collect()
}

impl EnsembleCombiner for InverseErrorCombiner {
    fn combine(
        &self,
        outcomes: &[ModelOutcome],
        explicit: Option<&BTreeMap<String, f64>>,
    ) -> Result<ForecastResult> {
        let mut contributors = Vec::new();
        let mut excluded = Vec::new();
        for outcome in outcomes {
            if outcomes.iter().filter(|o| o.model == outcome.model).count() > 1 {
                return Err(ForecastError::invalid(
                    "model_set",
                    format!("model '{}' appears more than once", outcome.model),
                ));
            }
            let reason = match &outcome.outcome {
                Outcome::Failed { reason } => reason.clone(),
                Outcome::Prediction { values, .. } if values.iter().any(|v| !v.is_finite()) => {
                    "prediction contains non-finite values".to_string()
                }
                Outcome::Prediction {
                    validation_error, ..
                } if !(validation_error.is_finite() && *validation_error >= 0.0) => {
                    format!("invalid validation error {}", validation_error)
                }
                Outcome::Prediction {
                    values,
                    validation_error,
                } => {
                    contributors.push(Contributor {
                        model: &outcome.model,
                        values,
                        error: *validation_error,
                    });
                    continue;
                }
            };
            warn!(model = %outcome.model, reason = %reason, "Model excluded from ensemble");
            excluded.push(ExcludedModel {
                model: outcome.model.clone(),
                reason,
            });
        }

        let first = contributors.first().ok_or(ForecastError::NoContributingModels)?;
        let horizon = first.values.len();
        if let Some(bad) = contributors.iter().find(|c| c.values.len() != horizon) {
            return Err(ForecastError::shape(
                format!("{} predicted steps", horizon),
                format!("{} predicted steps from '{}'", bad.values.len(), bad.model),
            ));
        }

        let weights = match explicit {
            Some(explicit) => explicit_weights(&contributors, explicit)?,
            None => self.inverse_error_weights(&contributors),
        };

        let mut ensemble = vec![0.0; horizon];
        for (c, w) in contributors.iter().zip(&weights) {
            for (e, v) in ensemble.iter_mut().zip(c.values) {
                *e += w * v;
            }
        }
        let uncertainty = (contributors.len() >= 2).then(|| spread(&contributors, horizon));

        debug!(
            contributors = contributors.len(),
            excluded = excluded.len(),
            explicit = explicit.is_some(),
            "Ensemble combined"
        );

        Ok(ForecastResult {
            ensemble_prediction: ensemble,
            per_model_predictions: contributors
                .iter()
                .map(|c| (c.model.to_string(), c.values.to_vec()))
                .collect(),
            weights: contributors
                .iter()
                .zip(weights)
                .map(|(c, w)| (c.model.to_string(), w))
                .collect(),
            uncertainty,
            excluded,
        })
    }
}
