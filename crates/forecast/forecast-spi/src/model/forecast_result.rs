//! Ensemble inputs and outputs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What one candidate model produced for an ensemble call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// A prediction plus the model's validation error (RMSE, original units).
    Prediction {
        values: Vec<f64>,
        validation_error: f64,
    },
    /// The model failed to fit or predict.
    Failed { reason: String },
}

/// One candidate model's outcome, keyed by its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutcome {
    pub model: String,
    pub outcome: Outcome,
}

impl ModelOutcome {
    pub fn prediction(model: impl Into<String>, values: Vec<f64>, validation_error: f64) -> Self {
        Self {
            model: model.into(),
            outcome: Outcome::Prediction {
                values,
                validation_error,
            },
        }
    }

    pub fn failed(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            outcome: Outcome::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_usable(&self) -> bool {
        matches!(self.outcome, Outcome::Prediction { .. })
    }
}

/// A model left out of the combination, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedModel {
    pub model: String,
    pub reason: String,
}

/// Combined forecast over `H` future steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Weighted sum of the contributing predictions.
    pub ensemble_prediction: Vec<f64>,
    pub per_model_predictions: BTreeMap<String, Vec<f64>>,
    /// Weight per contributing model; sums to 1.
    pub weights: BTreeMap<String, f64>,
    /// Per-step population std across contributing models; absent with fewer than two.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<ExcludedModel>,
}

impl ForecastResult {
    pub fn horizon(&self) -> usize {
        self.ensemble_prediction.len()
    }

    pub fn contributors(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_constructors() {
        assert!(ModelOutcome::prediction("lstm", vec![1.0], 0.1).is_usable());
        assert!(!ModelOutcome::failed("cnn", "window too short").is_usable());
    }

    #[test]
    fn test_absent_uncertainty_is_omitted() {
        let result = ForecastResult {
            ensemble_prediction: vec![1.0],
            per_model_predictions: BTreeMap::from([("lstm".to_string(), vec![1.0])]),
            weights: BTreeMap::from([("lstm".to_string(), 1.0)]),
            uncertainty: None,
            excluded: vec![],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("uncertainty"));
        assert!(!json.contains("excluded"));
        assert_eq!(result.horizon(), 1);
        assert_eq!(result.contributors().collect::<Vec<_>>(), vec!["lstm"]);
    }

    #[test]
    fn test_outcome_serde_tag() {
        let json = serde_json::to_string(&ModelOutcome::failed("cnn", "boom")).unwrap();
        assert!(json.contains("\"status\":\"failed\""));
    }
}
