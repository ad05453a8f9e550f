//! Variant dispatch and persistence for anomaly detectors.

use anomaly_api::DetectorsConfig;
use anomaly_spi::{AnomalyDetector, AnomalyScoreSeries, DetectorKind, FitSummary, Result};
use serde::{Deserialize, Serialize};

use crate::state_transition::StateTransitionDetector;
use crate::trend::TrendDetector;

/// Either detector variant, tagged by `method` when serialized.
///
/// A fitted detector round-trips with its threshold, so a restored one
/// scores new data exactly as the original would.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum AnyDetector {
    #[serde(rename = "hmm")]
    StateTransition(StateTransitionDetector),
    #[serde(rename = "trend")]
    TrendDecomposition(TrendDetector),
}

/// Unfitted detector of `kind` configured from `config`.
pub fn detector_for(kind: DetectorKind, config: &DetectorsConfig) -> AnyDetector {
    match kind {
        DetectorKind::StateTransition => AnyDetector::StateTransition(
            StateTransitionDetector::new(config.state_transition.clone()),
        ),
        DetectorKind::TrendDecomposition => {
            AnyDetector::TrendDecomposition(TrendDetector::new(config.trend.clone()))
        }
    }
}

impl AnyDetector {
    fn inner(&self) -> &dyn AnomalyDetector {
        match self {
            Self::StateTransition(d) => d,
            Self::TrendDecomposition(d) => d,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn AnomalyDetector {
        match self {
            Self::StateTransition(d) => d,
            Self::TrendDecomposition(d) => d,
        }
    }
}

impl From<StateTransitionDetector> for AnyDetector {
    fn from(detector: StateTransitionDetector) -> Self {
        Self::StateTransition(detector)
    }
}

impl From<TrendDetector> for AnyDetector {
    fn from(detector: TrendDetector) -> Self {
        Self::TrendDecomposition(detector)
    }
}

impl AnomalyDetector for AnyDetector {
    fn kind(&self) -> DetectorKind {
        self.inner().kind()
    }

    fn fit(&mut self, data: &[f64]) -> Result<FitSummary> {
        self.inner_mut().fit(data)
    }

    fn score(&self, data: &[f64]) -> Result<Vec<f64>> {
        self.inner().score(data)
    }

    fn detect_fitted(&self) -> Result<AnomalyScoreSeries> {
        self.inner().detect_fitted()
    }

    fn detect(&self, data: &[f64]) -> Result<AnomalyScoreSeries> {
        self.inner().detect(data)
    }

    fn threshold(&self) -> Option<f64> {
        self.inner().threshold()
    }

    fn min_observations(&self) -> usize {
        self.inner().min_observations()
    }
}
