//! Which model and detector variants this engine can run.

use std::collections::BTreeSet;

use anomaly_facade::DetectorKind;
use forecast_facade::ModelKind;
use serde::Serialize;
use tracing::warn;

use crate::error::{EngineError, Result};

/// Variants available to an [`Engine`](crate::Engine), resolved once at
/// construction from the compiled cargo features and the configured
/// `disabled_models`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    models: BTreeSet<ModelKind>,
    detectors: BTreeSet<DetectorKind>,
}

impl Capabilities {
    /// Everything enabled by cargo features.
    pub fn compiled() -> Self {
        let mut models = BTreeSet::new();
        if cfg!(feature = "recurrent") {
            models.insert(ModelKind::Recurrent);
        }
        if cfg!(feature = "convolutional") {
            models.insert(ModelKind::Convolutional);
        }
        let mut detectors = BTreeSet::new();
        if cfg!(feature = "state-transition") {
            detectors.insert(DetectorKind::StateTransition);
        }
        if cfg!(feature = "trend-decomposition") {
            detectors.insert(DetectorKind::TrendDecomposition);
        }
        Self { models, detectors }
    }

    /// Remove the named variants. Names may be model or detector
    /// identifiers; unknown names are ignored with a warning.
    pub fn without<S: AsRef<str>>(mut self, disabled: &[S]) -> Self {
        for name in disabled {
            let name = name.as_ref();
            if let Ok(kind) = name.parse::<ModelKind>() {
                self.models.remove(&kind);
            } else if let Ok(kind) = name.parse::<DetectorKind>() {
                self.detectors.remove(&kind);
            } else {
                warn!(name = %name, "Unknown variant in disabled_models ignored");
            }
        }
        self
    }

    pub fn models(&self) -> impl Iterator<Item = ModelKind> + '_ {
        self.models.iter().copied()
    }

    pub fn detectors(&self) -> impl Iterator<Item = DetectorKind> + '_ {
        self.detectors.iter().copied()
    }

    pub fn supports_model(&self, kind: ModelKind) -> bool {
        self.models.contains(&kind)
    }

    pub fn supports_detector(&self, kind: DetectorKind) -> bool {
        self.detectors.contains(&kind)
    }

    pub fn require_model(&self, kind: ModelKind) -> Result<()> {
        if self.supports_model(kind) {
            Ok(())
        } else {
            Err(EngineError::DependencyUnavailable(format!(
                "forecast model '{}' is not enabled",
                kind
            )))
        }
    }

    pub fn require_detector(&self, kind: DetectorKind) -> Result<()> {
        if self.supports_detector(kind) {
            Ok(())
        } else {
            Err(EngineError::DependencyUnavailable(format!(
                "anomaly detector '{}' is not enabled",
                kind
            )))
        }
    }
}

// Assumes the default feature set.
#[cfg(all(
    test,
    feature = "recurrent",
    feature = "convolutional",
    feature = "state-transition",
    feature = "trend-decomposition"
))]
mod tests {
    use super::*;

    #[test]
    fn test_default_features_enable_everything() {
        let caps = Capabilities::compiled();
        assert_eq!(caps.models().count(), ModelKind::ALL.len());
        assert_eq!(caps.detectors().count(), DetectorKind::ALL.len());
    }

    #[test]
    fn test_without_removes_named_variants() {
        let caps = Capabilities::compiled().without(&["cnn", "trend", "arima"]);
        assert!(caps.supports_model(ModelKind::Recurrent));
        assert!(!caps.supports_model(ModelKind::Convolutional));
        assert!(caps.supports_detector(DetectorKind::StateTransition));
        assert!(!caps.supports_detector(DetectorKind::TrendDecomposition));
    }

    #[test]
    fn test_require_reports_dependency_unavailable() {
        let caps = Capabilities::compiled().without(&["lstm"]);
        assert!(matches!(
            caps.require_model(ModelKind::Recurrent),
            Err(EngineError::DependencyUnavailable(_))
        ));
        assert!(caps.require_model(ModelKind::Convolutional).is_ok());
    }
}
