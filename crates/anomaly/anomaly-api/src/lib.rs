//! Anomaly Detection API
//!
//! Configuration types and builders for the anomaly detectors.

use forecast_api::TrendModelConfig;
use serde::{Deserialize, Serialize};

// Re-export SPI types
pub use anomaly_spi::{
    AnomalyDetector, AnomalyError, AnomalyMetrics, AnomalyReport, AnomalyScoreSeries,
    ConsensusMerger, DetectorFailure, DetectorKind, FitSummary, Result,
};

fn check_sensitivity(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(AnomalyError::invalid(name, "must be in (0, 1)"));
    }
    Ok(())
}

// ============================================================================
// State-transition detector
// ============================================================================

/// Gaussian hidden Markov model detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateTransitionConfig {
    /// Number of hidden states (default: 10).
    pub n_components: usize,
    /// Maximum Baum-Welch iterations (default: 1000).
    pub n_iter: usize,
    /// Convergence threshold on the log-likelihood gain (default: 0.01).
    pub tol: f64,
    /// Floor on every state variance (default: 1e-3).
    pub min_covar: f64,
    /// Seed for the k-means initialisation (default: 42).
    pub seed: u64,
    /// Percentile of the fitting scores used as threshold (default: 0.95).
    pub threshold: f64,
    /// Pair each difference with its absolute value (default: false).
    pub use_abs_diff: bool,
}

impl Default for StateTransitionConfig {
    fn default() -> Self {
        Self {
            n_components: 10,
            n_iter: 1000,
            tol: 0.01,
            min_covar: 1e-3,
            seed: 42,
            threshold: 0.95,
            use_abs_diff: false,
        }
    }
}

impl StateTransitionConfig {
    pub fn with_components(mut self, n_components: usize) -> Self {
        self.n_components = n_components;
        self
    }

    pub fn with_iterations(mut self, n_iter: usize, tol: f64) -> Self {
        self.n_iter = n_iter;
        self.tol = tol;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_abs_diff(mut self, use_abs_diff: bool) -> Self {
        self.use_abs_diff = use_abs_diff;
        self
    }

    /// Sensitivity is the score percentile.
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.threshold = sensitivity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_components == 0 {
            return Err(AnomalyError::invalid("n_components", "must be at least 1"));
        }
        if self.n_iter == 0 {
            return Err(AnomalyError::invalid("n_iter", "must be at least 1"));
        }
        if !(self.tol.is_finite() && self.tol >= 0.0) {
            return Err(AnomalyError::invalid("tol", "must be finite and non-negative"));
        }
        if !(self.min_covar.is_finite() && self.min_covar > 0.0) {
            return Err(AnomalyError::invalid("min_covar", "must be a positive number"));
        }
        check_sensitivity("threshold", self.threshold)
    }
}

// ============================================================================
// Trend-decomposition detector
// ============================================================================

/// Trend + seasonal band detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendDetectorConfig {
    /// Decomposition model producing the band.
    pub model: TrendModelConfig,
    /// Minimum normalised deviation, as a fraction of the fitting data's
    /// value range (default: 0.1).
    pub range_fraction: f64,
}

impl Default for TrendDetectorConfig {
    fn default() -> Self {
        Self {
            model: TrendModelConfig::default(),
            range_fraction: 0.1,
        }
    }
}

impl TrendDetectorConfig {
    pub fn with_model(mut self, model: TrendModelConfig) -> Self {
        self.model = model;
        self
    }

    pub fn with_range_fraction(mut self, range_fraction: f64) -> Self {
        self.range_fraction = range_fraction;
        self
    }

    /// Sensitivity is the band's interval width.
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.model.interval_width = sensitivity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        if !(self.range_fraction.is_finite() && self.range_fraction >= 0.0) {
            return Err(AnomalyError::invalid(
                "range_fraction",
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// All detectors
// ============================================================================

/// Settings for every detector variant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorsConfig {
    pub state_transition: StateTransitionConfig,
    pub trend: TrendDetectorConfig,
}

impl DetectorsConfig {
    /// Apply one request sensitivity to both detectors.
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Result<Self> {
        check_sensitivity("sensitivity", sensitivity)?;
        self.state_transition = self.state_transition.with_sensitivity(sensitivity);
        self.trend = self.trend.with_sensitivity(sensitivity);
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        self.state_transition.validate()?;
        self.trend.validate()
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{DetectorsConfig, StateTransitionConfig, TrendDetectorConfig};
    pub use crate::{AnomalyDetector, AnomalyError, AnomalyReport, DetectorKind, Result};
}
