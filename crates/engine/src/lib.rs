//! Engine
//!
//! Orchestration layer over the preprocessing, forecast, anomaly and registry
//! components:
//! - [`Engine::forecast`] trains the requested models and combines them
//! - [`Engine::detect`] runs the requested detectors and merges their flags
//! - [`Engine::forecast_with`] predicts with a model saved by an earlier forecast
//! - [`Engine::detect_with`] scores new data with detectors saved by an
//!   earlier detection
//! - [`Engine::evaluate_forecaster`], [`Engine::evaluate_detector`] and
//!   [`Engine::recommend`] measure stored models and suggest variants
//!
//! Variants are gated by the `recurrent`, `convolutional`, `state-transition`
//! and `trend-decomposition` cargo features, resolved once into
//! [`Capabilities`].

pub mod capabilities;
pub mod config;
mod engine;
pub mod error;
pub mod request;

pub use capabilities::Capabilities;
pub use config::EngineConfig;
pub use engine::{Engine, StoredForecaster};
pub use error::{EngineError, ErrorPayload, Result};
pub use request::{
    AnomalyRequest, AnomalyResponse, ForecastRequest, ForecastResponse, Recommendation,
};

// Component types that appear in requests and responses
pub use anomaly_facade::{
    AnomalyMetrics, AnomalyReport, AnomalyScoreSeries, AnyDetector, DetectorFailure, DetectorKind,
};
pub use forecast_facade::{AnyForecaster, ExcludedModel, ForecastResult, MetricsSummary, ModelKind};
pub use pipeline_facade::TimeSeries;
pub use registry_facade::{InMemoryRegistry, ModelRegistry, RecordMetadata, RegistryConfig};
