//! Forecast Service Provider Interface
//!
//! Defines the [`ForecastModel`] contract shared by every model variant, the
//! [`EnsembleCombiner`] that fuses their outputs, seasonality detection and
//! the records those components exchange.

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at crate root for convenience
pub use contract::{EnsembleCombiner, ForecastModel, SeasonalityDetector};
pub use error::{ForecastError, Result};
pub use model::{
    ConfidenceInterval, DecompositionResult, ExcludedModel, ForecastResult, InputShape,
    ModelKind, ModelOutcome, Outcome, TrainingHistory,
};
