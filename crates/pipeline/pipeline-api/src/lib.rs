//! Preprocessing API
//!
//! Configuration types for scaling, windowing and chronological splitting.

use serde::{Deserialize, Serialize};

// Re-export SPI types
pub use pipeline_spi::{DataSplit, PipelineError, Result, Scaler, TimeSeries, Window, Windows};

// ============================================================================
// Scaling
// ============================================================================

/// Which fitted transform to apply before modelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    /// Map the training range of each feature to [0, 1].
    #[default]
    MinMax,
    /// Zero mean, unit population standard deviation per feature.
    Standard,
}

impl ScalerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MinMax => "min_max",
            Self::Standard => "standard",
        }
    }
}

// ============================================================================
// Splitting
// ============================================================================

/// Chronological split ratios. The test partition takes the remainder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of windows used for training (default: 0.8).
    pub train_ratio: f64,
    /// Fraction of windows used for validation (default: 0.1).
    pub val_ratio: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.8,
            val_ratio: 0.1,
        }
    }
}

impl SplitConfig {
    pub fn new(train_ratio: f64, val_ratio: f64) -> Self {
        Self {
            train_ratio,
            val_ratio,
        }
    }

    /// Reject ratios outside (0, 1] or summing past 1.
    pub fn validate(&self) -> Result<()> {
        if !(self.train_ratio > 0.0 && self.train_ratio <= 1.0) {
            return Err(PipelineError::invalid("train_ratio", "must be in (0, 1]"));
        }
        if !(0.0..1.0).contains(&self.val_ratio) {
            return Err(PipelineError::invalid("val_ratio", "must be in [0, 1)"));
        }
        if self.train_ratio + self.val_ratio > 1.0 + f64::EPSILON {
            return Err(PipelineError::invalid(
                "val_ratio",
                "train_ratio + val_ratio must not exceed 1",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Windowing
// ============================================================================

/// Sliding window shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Input steps per window (L, default: 24).
    pub input_len: usize,
    /// Target steps per window (H, default: 1).
    pub horizon: usize,
    /// Feature the targets are drawn from (default: 0).
    pub target_column: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            input_len: 24,
            horizon: 1,
            target_column: 0,
        }
    }
}

impl WindowConfig {
    pub fn new(input_len: usize, horizon: usize) -> Self {
        Self {
            input_len,
            horizon,
            target_column: 0,
        }
    }

    pub fn with_target_column(mut self, column: usize) -> Self {
        self.target_column = column;
        self
    }

    /// Smallest series length that yields one window.
    pub fn min_length(&self) -> usize {
        self.input_len + self.horizon
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_len == 0 {
            return Err(PipelineError::invalid("input_len", "must be at least 1"));
        }
        if self.horizon == 0 {
            return Err(PipelineError::invalid("horizon", "must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Stationarity
// ============================================================================

/// Transformation used to remove trend from a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationarityMethod {
    /// First difference.
    #[default]
    Diff,
    /// First difference of the logarithm.
    LogDiff,
    /// Residual after a least-squares linear fit.
    Detrend,
}

// ============================================================================
// Preprocessing
// ============================================================================

/// Scaling, windowing and splitting settings for one preparation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessConfig {
    pub scaler: ScalerKind,
    pub window: WindowConfig,
    pub split: SplitConfig,
}

impl PreprocessConfig {
    pub fn new(input_len: usize, horizon: usize) -> Self {
        Self {
            window: WindowConfig::new(input_len, horizon),
            ..Self::default()
        }
    }

    pub fn with_scaler(mut self, scaler: ScalerKind) -> Self {
        self.scaler = scaler;
        self
    }

    pub fn with_split(mut self, train_ratio: f64, val_ratio: f64) -> Self {
        self.split = SplitConfig::new(train_ratio, val_ratio);
        self
    }

    pub fn with_target_column(mut self, column: usize) -> Self {
        self.window.target_column = column;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;
        self.split.validate()
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{PreprocessConfig, ScalerKind, SplitConfig, StationarityMethod, WindowConfig};
    pub use crate::{PipelineError, Result, Scaler, TimeSeries, Windows};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_defaults() {
        let config = SplitConfig::default();
        assert_eq!(config.train_ratio, 0.8);
        assert_eq!(config.val_ratio, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_split_rejects_overflowing_ratios() {
        assert!(SplitConfig::new(0.9, 0.2).validate().is_err());
        assert!(SplitConfig::new(0.0, 0.1).validate().is_err());
        assert!(SplitConfig::new(1.0, 0.0).validate().is_ok());
    }

    #[test]
    fn test_window_rejects_zero_lengths() {
        assert!(WindowConfig::new(0, 1).validate().is_err());
        assert!(WindowConfig::new(3, 0).validate().is_err());
        assert_eq!(WindowConfig::new(3, 2).min_length(), 5);
    }

    #[test]
    fn test_scaler_kind_serde_name() {
        let json = serde_json::to_string(&ScalerKind::MinMax).unwrap();
        assert_eq!(json, "\"min_max\"");
        let kind: ScalerKind = serde_json::from_str("\"standard\"").unwrap();
        assert_eq!(kind, ScalerKind::Standard);
    }

    #[test]
    fn test_preprocess_builder() {
        let config = PreprocessConfig::new(12, 3)
            .with_scaler(ScalerKind::Standard)
            .with_split(0.7, 0.15)
            .with_target_column(1);
        assert_eq!(config.window.input_len, 12);
        assert_eq!(config.window.horizon, 3);
        assert_eq!(config.window.target_column, 1);
        assert_eq!(config.scaler, ScalerKind::Standard);
        assert!(config.validate().is_ok());
    }
}
