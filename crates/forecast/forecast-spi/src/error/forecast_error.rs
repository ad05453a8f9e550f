//! Forecast error types

use pipeline_spi::PipelineError;
use thiserror::Error;

/// Result type for forecast operations
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while training, predicting or combining forecasts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Insufficient data points for the operation
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Model used before fitting
    #[error("Model must be fitted before prediction")]
    NotFitted,

    /// Input does not match the shape the model was built for
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Numerical computation error
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// Every candidate model failed
    #[error("No model produced a usable prediction")]
    NoContributingModels,

    /// Preprocessing failed
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ForecastError {
    /// Shorthand for [`ForecastError::InvalidParameter`].
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`ForecastError::ShapeMismatch`].
    pub fn shape(expected: impl ToString, actual: impl ToString) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
