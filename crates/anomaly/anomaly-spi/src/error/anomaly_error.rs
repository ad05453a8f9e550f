//! Anomaly detection error types.

use forecast_spi::ForecastError;
use thiserror::Error;

/// Anomaly detection errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnomalyError {
    #[error("Insufficient data: required {required}, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Detector not fitted: call fit() before detect()")]
    NotFitted,

    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Detection error: {0}")]
    DetectionError(String),

    /// The trend model underneath a detector failed.
    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

impl AnomalyError {
    /// Shorthand for [`AnomalyError::InvalidParameter`].
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for anomaly detection operations.
pub type Result<T> = std::result::Result<T, AnomalyError>;
