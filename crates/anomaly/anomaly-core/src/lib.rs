//! Anomaly Detection Core
//!
//! Gaussian HMM and trend-band detectors, union consensus and evaluation
//! against labelled data.

pub mod consensus;
pub mod detector;
pub mod evaluation;
pub mod hmm;
pub mod selection;
pub mod state_transition;
pub mod trend;

pub use anomaly_spi::{
    AnomalyDetector, AnomalyError, AnomalyMetrics, AnomalyReport, AnomalyScoreSeries,
    ConsensusMerger, DetectorFailure, DetectorKind, FitSummary, Result,
};

pub use consensus::UnionConsensus;
pub use detector::{detector_for, AnyDetector};
pub use evaluation::evaluate;
pub use hmm::GaussianHmm;
pub use selection::recommend_detector;
pub use state_transition::{percentile, StateTransitionDetector};
pub use trend::{band_importance, TrendDetector};
