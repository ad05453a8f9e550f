//! Picking a detector from coarse data characteristics.

use anomaly_spi::DetectorKind;

/// Series with a trend or seasonality suit the band detector; everything
/// else goes to the state-transition model.
pub fn recommend_detector(has_trend: bool, has_seasonality: bool) -> DetectorKind {
    if has_trend || has_seasonality {
        DetectorKind::TrendDecomposition
    } else {
        DetectorKind::StateTransition
    }
}
