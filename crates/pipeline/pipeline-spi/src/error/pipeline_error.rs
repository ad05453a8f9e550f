//! Preprocessing error types.

use thiserror::Error;

/// Result type for preprocessing operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while scaling, windowing or splitting a series.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Series is too short for the requested operation
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Input does not have the shape the fitted transform expects
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Transform used before fitting
    #[error("Scaler must be fitted before transformation")]
    NotFitted,

    /// Transformation failed
    #[error("Transformation failed: {0}")]
    TransformError(String),
}

impl PipelineError {
    /// Shorthand for [`PipelineError::InvalidParameter`].
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`PipelineError::ShapeMismatch`].
    pub fn shape(expected: impl ToString, actual: impl ToString) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_display() {
        let error = PipelineError::InsufficientData {
            required: 13,
            actual: 12,
        };
        assert_eq!(
            error.to_string(),
            "Insufficient data: need at least 13 points, got 12"
        );
    }

    #[test]
    fn test_invalid_parameter_display() {
        let error = PipelineError::invalid("train_ratio", "must be in (0, 1)");
        assert_eq!(
            error.to_string(),
            "Invalid parameter 'train_ratio': must be in (0, 1)"
        );
    }

    #[test]
    fn test_shape_mismatch_display() {
        let error = PipelineError::shape("width 2", "width 3");
        assert_eq!(error.to_string(), "Shape mismatch: expected width 2, got width 3");
    }

    #[test]
    fn test_not_fitted_display() {
        assert_eq!(
            PipelineError::NotFitted.to_string(),
            "Scaler must be fitted before transformation"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PipelineError>();
    }
}
