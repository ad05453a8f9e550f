//! Engine error types and the payload surfaced to callers.

use anomaly_facade::{AnomalyError, DetectorFailure};
use forecast_facade::{ExcludedModel, ForecastError};
use pipeline_facade::PipelineError;
use registry_facade::RegistryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by [`Engine`](crate::Engine) operations.
///
/// A single model or detector failing inside a request is not an error; it
/// is recorded in the response. These variants abort the whole request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Anomaly(#[from] AnomalyError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The variant was compiled out or disabled in the configuration.
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("No model produced a usable forecast ({} failed)", .0.len())]
    NoUsableModels(Vec<ExcludedModel>),

    #[error("No detector produced a usable report ({} failed)", .0.len())]
    NoUsableDetectors(Vec<DetectorFailure>),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Serializable error returned at the orchestration boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Stable machine-readable category, e.g. `validation`
    pub kind: String,
    pub message: String,
}

impl EngineError {
    /// Stable category name for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pipeline(e) => pipeline_kind(e),
            Self::Forecast(e) => forecast_kind(e),
            Self::Anomaly(e) => anomaly_kind(e),
            Self::Registry(e) => registry_kind(e),
            Self::DependencyUnavailable(_) => "dependency_unavailable",
            Self::NoUsableModels(_) => "no_usable_models",
            Self::NoUsableDetectors(_) => "no_usable_detectors",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Config(_) => "config",
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

impl From<&EngineError> for ErrorPayload {
    fn from(err: &EngineError) -> Self {
        err.to_payload()
    }
}

fn pipeline_kind(err: &PipelineError) -> &'static str {
    match err {
        PipelineError::InsufficientData { .. } | PipelineError::InvalidParameter { .. } => {
            "validation"
        }
        PipelineError::ShapeMismatch { .. } => "shape_mismatch",
        PipelineError::NotFitted => "model_not_fitted",
        PipelineError::TransformError(_) => "transform",
    }
}

fn forecast_kind(err: &ForecastError) -> &'static str {
    match err {
        ForecastError::InsufficientData { .. } | ForecastError::InvalidParameter { .. } => {
            "validation"
        }
        ForecastError::NotFitted => "model_not_fitted",
        ForecastError::ShapeMismatch { .. } => "shape_mismatch",
        ForecastError::NumericalError(_) => "numerical",
        ForecastError::NoContributingModels => "no_usable_models",
        ForecastError::Pipeline(e) => pipeline_kind(e),
    }
}

fn anomaly_kind(err: &AnomalyError) -> &'static str {
    match err {
        AnomalyError::InsufficientData { .. } | AnomalyError::InvalidParameter { .. } => {
            "validation"
        }
        AnomalyError::NotFitted => "model_not_fitted",
        AnomalyError::DetectionError(_) => "detection",
        AnomalyError::Forecast(e) => forecast_kind(e),
    }
}

fn registry_kind(err: &RegistryError) -> &'static str {
    match err {
        RegistryError::NotFound(_) => "model_not_found",
        RegistryError::AlreadyExists(_) => "already_exists",
        RegistryError::InvalidName { .. } => "validation",
        RegistryError::Io(_) | RegistryError::Serialization(_) | RegistryError::LockPoisoned => {
            "storage"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_kinds() {
        let short: EngineError = PipelineError::InsufficientData {
            required: 25,
            actual: 10,
        }
        .into();
        assert_eq!(short.kind(), "validation");

        let missing: EngineError = RegistryError::NotFound("sales".into()).into();
        let payload = missing.to_payload();
        assert_eq!(payload.kind, "model_not_found");
        assert!(payload.message.contains("sales"));

        let nested: EngineError = AnomalyError::Forecast(ForecastError::NotFitted).into();
        assert_eq!(nested.kind(), "model_not_fitted");
    }

    #[test]
    fn test_no_usable_models_message() {
        let err = EngineError::NoUsableModels(vec![ExcludedModel {
            model: "cnn".into(),
            reason: "window too short".into(),
        }]);
        assert_eq!(err.to_string(), "No model produced a usable forecast (1 failed)");
        assert_eq!(err.kind(), "no_usable_models");
    }

    #[test]
    fn test_payload_serializes() {
        let payload = EngineError::DependencyUnavailable("cnn".into()).to_payload();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "dependency_unavailable");
        assert_eq!(json["message"], "Dependency unavailable: cnn");
    }
}
