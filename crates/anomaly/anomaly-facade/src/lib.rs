//! Anomaly Detection Facade
//!
//! Unified re-exports for the anomaly detection module:
//! - `AnomalyDetector`, `ConsensusMerger` and the report records from SPI
//! - Detector configuration from API
//! - `StateTransitionDetector`, `TrendDetector` and `UnionConsensus` from Core

// Re-export everything from SPI
pub use anomaly_spi::*;

// Re-export everything from API
pub use anomaly_api::*;

// Re-export everything from Core
pub use anomaly_core::*;
