//! Contract module containing trait definitions for anomaly detection

mod anomaly_detector;
mod consensus_merger;

pub use anomaly_detector::AnomalyDetector;
pub use consensus_merger::ConsensusMerger;
