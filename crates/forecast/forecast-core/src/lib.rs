//! Forecast Core
//!
//! Recurrent and convolutional forecasters trained from scratch, the
//! inverse-error ensemble combiner, evaluation metrics, and the trend +
//! seasonal decomposition model with its prediction band.

pub mod confidence;
pub mod convolutional;
pub mod decomposition;
pub mod ensemble;
pub mod forecaster;
pub mod metrics;
mod neural;
pub mod recurrent;
pub mod seasonality;
pub mod selection;

pub use forecast_spi::{
    ConfidenceInterval, DecompositionResult, EnsembleCombiner, ForecastError, ForecastModel,
    ForecastResult, InputShape, ModelKind, ModelOutcome, Outcome, Result, SeasonalityDetector,
    TrainingHistory,
};

pub use confidence::{prediction_band, residual_std, widening_band, z_score};
pub use convolutional::CnnForecaster;
pub use decomposition::TrendSeasonalModel;
pub use ensemble::InverseErrorCombiner;
pub use forecaster::AnyForecaster;
pub use metrics::{mae, mape, mse, r2, rmse, MetricsSummary};
pub use recurrent::LstmForecaster;
pub use seasonality::{autocorrelation, detect_period, AutocorrelationDetector};
pub use selection::recommend_forecaster;

use pipeline_spi::Windows;

/// Shape of the training windows; validation windows must share it.
pub(crate) fn validate_batch(train: &Windows, validation: Option<&Windows>) -> Result<InputShape> {
    if train.is_empty() {
        return Err(ForecastError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    let shape = InputShape::new(train.input_len(), train.width(), train.horizon());
    if let Some(val) = validation.filter(|v| !v.is_empty()) {
        let other = InputShape::new(val.input_len(), val.width(), val.horizon());
        if other != shape {
            return Err(ForecastError::shape(
                format!("{:?}", shape),
                format!("validation windows {:?}", other),
            ));
        }
    }
    Ok(shape)
}
