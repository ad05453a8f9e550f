//! Anomaly Detection Service Provider Interface
//!
//! Defines the [`AnomalyDetector`] contract shared by the state-transition
//! and trend-decomposition detectors, the [`ConsensusMerger`] that unifies
//! their verdicts and the score and report records they produce.

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at crate root for convenience
pub use contract::{AnomalyDetector, ConsensusMerger};
pub use error::{AnomalyError, Result};
pub use model::{
    AnomalyMetrics, AnomalyReport, AnomalyScoreSeries, DetectorFailure, DetectorKind, FitSummary,
};
