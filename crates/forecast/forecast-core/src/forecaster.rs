//! Variant dispatch and persistence for forecast models.

use forecast_api::ModelsConfig;
use forecast_spi::{ForecastModel, InputShape, ModelKind, Result, TrainingHistory};
use pipeline_spi::Windows;
use serde::{Deserialize, Serialize};

use crate::convolutional::CnnForecaster;
use crate::recurrent::LstmForecaster;

/// Either forecast variant, tagged by `model_type` when serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "model_type", rename_all = "snake_case")]
pub enum AnyForecaster {
    #[serde(rename = "lstm")]
    Recurrent(LstmForecaster),
    #[serde(rename = "cnn")]
    Convolutional(CnnForecaster),
}

impl AnyForecaster {
    /// Unfitted model of `kind` configured from `config`.
    pub fn new(kind: ModelKind, config: &ModelsConfig) -> Self {
        match kind {
            ModelKind::Recurrent => Self::Recurrent(LstmForecaster::new(
                config.recurrent.clone(),
                config.training.clone(),
            )),
            ModelKind::Convolutional => Self::Convolutional(CnnForecaster::new(
                config.convolutional.clone(),
                config.training.clone(),
            )),
        }
    }

    fn inner(&self) -> &dyn ForecastModel {
        match self {
            Self::Recurrent(m) => m,
            Self::Convolutional(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ForecastModel {
        match self {
            Self::Recurrent(m) => m,
            Self::Convolutional(m) => m,
        }
    }

    /// Hyperparameters of the wrapped model as JSON.
    pub fn hyperparameters(&self) -> serde_json::Value {
        match self {
            Self::Recurrent(m) => serde_json::json!({
                "architecture": m.config(),
                "training": m.training(),
            }),
            Self::Convolutional(m) => serde_json::json!({
                "architecture": m.config(),
                "training": m.training(),
            }),
        }
    }
}

impl From<LstmForecaster> for AnyForecaster {
    fn from(model: LstmForecaster) -> Self {
        Self::Recurrent(model)
    }
}

impl From<CnnForecaster> for AnyForecaster {
    fn from(model: CnnForecaster) -> Self {
        Self::Convolutional(model)
    }
}

impl ForecastModel for AnyForecaster {
    fn kind(&self) -> ModelKind {
        self.inner().kind()
    }

    fn fit(&mut self, train: &Windows, validation: Option<&Windows>) -> Result<TrainingHistory> {
        self.inner_mut().fit(train, validation)
    }

    fn predict(&self, inputs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.inner().predict(inputs)
    }

    fn input_shape(&self) -> Option<InputShape> {
        self.inner().input_shape()
    }

    fn summary(&self) -> String {
        self.inner().summary()
    }
}
