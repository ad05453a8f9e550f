//! Model module containing data structures

mod anomaly_metrics;
mod anomaly_report;
mod anomaly_score_series;
mod detector_kind;
mod fit_summary;

pub use anomaly_metrics::AnomalyMetrics;
pub use anomaly_report::{AnomalyReport, DetectorFailure};
pub use anomaly_score_series::AnomalyScoreSeries;
pub use detector_kind::DetectorKind;
pub use fit_summary::FitSummary;
