//! Request and response records at the orchestration boundary.

use std::collections::{BTreeMap, BTreeSet};

use anomaly_facade::{AnomalyReport, DetectorKind};
use forecast_facade::{ForecastResult, ModelKind};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

fn default_steps() -> usize {
    1
}

fn default_sensitivity() -> f64 {
    0.95
}

/// Train the requested models on one series and combine their forecasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub model_set: Vec<ModelKind>,
    /// Input steps per window (L).
    pub window_length: usize,
    /// Steps each model predicts per window (H).
    pub horizon: usize,
    /// Caller weights by model identifier; inverse validation error when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_weights: Option<BTreeMap<String, f64>>,
    /// Autoregressive iterations; the forecast holds `steps * horizon` values.
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Save every contributing model as `<persist_as>_<model>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_as: Option<String>,
}

impl ForecastRequest {
    pub fn new(model_set: Vec<ModelKind>, window_length: usize, horizon: usize) -> Self {
        Self {
            model_set,
            window_length,
            horizon,
            explicit_weights: None,
            steps: 1,
            persist_as: None,
        }
    }

    pub fn with_weights(mut self, weights: BTreeMap<String, f64>) -> Self {
        self.explicit_weights = Some(weights);
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_persist_as(mut self, name: impl Into<String>) -> Self {
        self.persist_as = Some(name.into());
        self
    }

    /// Registry name a model of `kind` is saved under.
    pub fn record_name(&self, kind: ModelKind) -> Option<String> {
        self.persist_as
            .as_ref()
            .map(|base| format!("{}_{}", base, kind.as_str()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.model_set.is_empty() {
            return Err(EngineError::InvalidRequest("model_set is empty".into()));
        }
        let unique: BTreeSet<_> = self.model_set.iter().collect();
        if unique.len() != self.model_set.len() {
            return Err(EngineError::InvalidRequest(
                "model_set lists a model more than once".into(),
            ));
        }
        if self.window_length == 0 || self.horizon == 0 {
            return Err(EngineError::InvalidRequest(
                "window_length and horizon must be positive".into(),
            ));
        }
        if self.steps == 0 {
            return Err(EngineError::InvalidRequest("steps must be positive".into()));
        }
        Ok(())
    }
}

/// Ensemble forecast plus what the engine learned producing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    #[serde(flatten)]
    pub result: ForecastResult,
    pub horizon: usize,
    pub steps: usize,
    /// Validation RMSE per contributing model, in original units.
    pub validation_errors: BTreeMap<String, f64>,
    /// Advisory only; forecasting proceeds either way.
    pub stationary: bool,
    /// Registry location per saved model.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub saved: BTreeMap<String, String>,
}

/// Run the requested detectors and merge their flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRequest {
    pub methods: Vec<DetectorKind>,
    /// In (0, 1); higher flags fewer points (default: 0.95).
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    /// Save every fitted detector as `<persist_as>_<method>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_as: Option<String>,
}

impl AnomalyRequest {
    pub fn new(methods: Vec<DetectorKind>) -> Self {
        Self {
            methods,
            sensitivity: default_sensitivity(),
            persist_as: None,
        }
    }

    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_persist_as(mut self, name: impl Into<String>) -> Self {
        self.persist_as = Some(name.into());
        self
    }

    /// Registry name a detector of `kind` is saved under.
    pub fn record_name(&self, kind: DetectorKind) -> Option<String> {
        self.persist_as
            .as_ref()
            .map(|base| format!("{}_{}", base, kind.as_str()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.methods.is_empty() {
            return Err(EngineError::InvalidRequest("methods is empty".into()));
        }
        let unique: BTreeSet<_> = self.methods.iter().collect();
        if unique.len() != self.methods.len() {
            return Err(EngineError::InvalidRequest(
                "methods lists a detector more than once".into(),
            ));
        }
        Ok(())
    }
}

/// Consensus report plus where the fitted detectors were saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResponse {
    #[serde(flatten)]
    pub report: AnomalyReport,
    /// Registry location per saved detector.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub saved: BTreeMap<String, String>,
}

/// Suggested forecaster and detector for a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub forecaster: ModelKind,
    pub detector: DetectorKind,
    pub samples: usize,
    pub features: usize,
    pub window_length: usize,
    /// The stationarity check failed on the target column.
    pub has_trend: bool,
    pub has_seasonality: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<usize>,
}
