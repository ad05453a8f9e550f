//! Persisted model record

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Summary of how a model was trained.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingDiagnostics {
    /// Epochs (or iterations) run
    pub epochs: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_val_loss: Option<f64>,
    /// Named evaluation metrics, e.g. validation RMSE
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

/// Everything about a record except the fitted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Variant tag, e.g. `lstm`
    pub model_type: String,
    /// Shape of the data the model was fitted on
    pub data_shape: Vec<usize>,
    pub training_result: TrainingDiagnostics,
    pub hyperparameters: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl RecordMetadata {
    /// Metadata stamped with the current time.
    pub fn new(model_type: impl Into<String>, data_shape: Vec<usize>) -> Self {
        Self {
            model_type: model_type.into(),
            data_shape,
            training_result: TrainingDiagnostics::default(),
            hyperparameters: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    pub fn with_training_result(mut self, training_result: TrainingDiagnostics) -> Self {
        self.training_result = training_result;
        self
    }

    pub fn with_hyperparameters(mut self, hyperparameters: serde_json::Value) -> Self {
        self.hyperparameters = hyperparameters;
        self
    }
}

/// Immutable bundle of metadata and opaque fitted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub metadata: RecordMetadata,
    pub state: serde_json::Value,
}

impl ModelRecord {
    /// Record holding `model` serialized as its fitted state.
    pub fn encode<T: Serialize>(model: &T, metadata: RecordMetadata) -> Result<Self> {
        Ok(Self {
            metadata,
            state: serde_json::to_value(model)?,
        })
    }

    /// Rebuild the model from its fitted state.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.state.clone())?)
    }
}
