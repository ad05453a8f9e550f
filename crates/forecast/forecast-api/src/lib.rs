//! Forecast API
//!
//! Configuration types for the forecast model variants, their training loop,
//! the ensemble combiner and the trend + seasonal decomposition model.

use serde::{Deserialize, Serialize};

// Re-export SPI types
pub use forecast_spi::{
    ConfidenceInterval, DecompositionResult, EnsembleCombiner, ExcludedModel, ForecastError,
    ForecastModel, ForecastResult, InputShape, ModelKind, ModelOutcome, Outcome, Result,
    SeasonalityDetector, TrainingHistory,
};

fn check_positive(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ForecastError::invalid(name, "must be a positive number"));
    }
    Ok(())
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if !(0.0..1.0).contains(&value) {
        return Err(ForecastError::invalid(name, "must be in [0, 1)"));
    }
    Ok(())
}

fn check_layers(name: &str, sizes: &[usize]) -> Result<()> {
    if sizes.is_empty() || sizes.contains(&0) {
        return Err(ForecastError::invalid(name, "needs at least one non-zero layer"));
    }
    Ok(())
}

// ============================================================================
// Training
// ============================================================================

/// Training loop settings shared by both model variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Maximum passes over the training windows (default: 100).
    pub epochs: usize,
    /// Windows per gradient step, taken in time order (default: 32).
    pub batch_size: usize,
    /// Adam step size (default: 0.001).
    pub learning_rate: f64,
    /// Epochs without improvement before stopping (default: 10).
    pub patience: usize,
    /// Smallest decrease that counts as an improvement (default: 0.0).
    pub min_delta: f64,
    /// Seed for weight initialisation and dropout masks (default: 42).
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            batch_size: 32,
            learning_rate: 0.001,
            patience: 10,
            min_delta: 0.0,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(ForecastError::invalid("epochs", "must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(ForecastError::invalid("batch_size", "must be at least 1"));
        }
        check_positive("learning_rate", self.learning_rate)?;
        if !(self.min_delta >= 0.0) {
            return Err(ForecastError::invalid("min_delta", "must not be negative"));
        }
        Ok(())
    }
}

// ============================================================================
// Model variants
// ============================================================================

/// Stacked LSTM configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrentConfig {
    /// Hidden units per LSTM layer (default: [64, 32]).
    pub units: Vec<usize>,
    /// Dropout after each LSTM layer during training (default: 0.2).
    pub dropout: f64,
}

impl Default for RecurrentConfig {
    fn default() -> Self {
        Self {
            units: vec![64, 32],
            dropout: 0.2,
        }
    }
}

impl RecurrentConfig {
    pub fn with_units(mut self, units: Vec<usize>) -> Self {
        self.units = units;
        self
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_layers("units", &self.units)?;
        check_fraction("dropout", self.dropout)
    }
}

/// Conv1D stack configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvolutionalConfig {
    /// Filters per Conv1D layer (default: [64, 128, 256]).
    pub filters: Vec<usize>,
    /// Kernel size per Conv1D layer (default: [2, 2, 2]).
    pub kernel_sizes: Vec<usize>,
    /// Max-pool size after each Conv1D layer (default: 2).
    pub pool_size: usize,
    /// Hidden dense units after flattening (default: [50]).
    pub dense_units: Vec<usize>,
    /// Dropout after each hidden dense layer during training (default: 0.2).
    pub dropout: f64,
}

impl Default for ConvolutionalConfig {
    fn default() -> Self {
        Self {
            filters: vec![64, 128, 256],
            kernel_sizes: vec![2, 2, 2],
            pool_size: 2,
            dense_units: vec![50],
            dropout: 0.2,
        }
    }
}

impl ConvolutionalConfig {
    pub fn with_filters(mut self, filters: Vec<usize>, kernel_sizes: Vec<usize>) -> Self {
        self.filters = filters;
        self.kernel_sizes = kernel_sizes;
        self
    }

    pub fn with_dense_units(mut self, dense_units: Vec<usize>) -> Self {
        self.dense_units = dense_units;
        self
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_layers("filters", &self.filters)?;
        check_layers("kernel_sizes", &self.kernel_sizes)?;
        if self.filters.len() != self.kernel_sizes.len() {
            return Err(ForecastError::invalid(
                "kernel_sizes",
                "needs one kernel size per filter layer",
            ));
        }
        if self.pool_size == 0 {
            return Err(ForecastError::invalid("pool_size", "must be at least 1"));
        }
        if self.dense_units.contains(&0) {
            return Err(ForecastError::invalid("dense_units", "layers must be non-zero"));
        }
        check_fraction("dropout", self.dropout)
    }

    /// Sequence length left after the convolution stack, or `None` if the
    /// window is too short for it.
    pub fn output_len(&self, input_len: usize) -> Option<usize> {
        let mut len = input_len;
        for &k in &self.kernel_sizes {
            len = len.checked_sub(k.saturating_sub(1)).filter(|&l| l > 0)?;
            len /= self.pool_size.max(1);
            if len == 0 {
                return None;
            }
        }
        Some(len)
    }
}

/// Settings for every forecast model variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub recurrent: RecurrentConfig,
    pub convolutional: ConvolutionalConfig,
    pub training: TrainingConfig,
}

impl ModelsConfig {
    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }

    pub fn with_recurrent(mut self, recurrent: RecurrentConfig) -> Self {
        self.recurrent = recurrent;
        self
    }

    pub fn with_convolutional(mut self, convolutional: ConvolutionalConfig) -> Self {
        self.convolutional = convolutional;
        self
    }
}

// ============================================================================
// Ensemble
// ============================================================================

/// Inverse-error ensemble settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Validation errors at or below this count as zero error (default: 1e-12).
    pub zero_error_tolerance: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            zero_error_tolerance: 1e-12,
        }
    }
}

// ============================================================================
// Trend + seasonal decomposition
// ============================================================================

/// How the seasonal component combines with the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonalityMode {
    Additive,
    #[default]
    Multiplicative,
}

/// Piecewise-linear trend with seasonal profile and prediction band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendModelConfig {
    /// Width of the prediction band (default: 0.99).
    pub interval_width: f64,
    /// Fraction of history in which changepoints may be placed (default: 0.8).
    pub changepoint_range: f64,
    /// Potential changepoints (default: 25).
    pub n_changepoints: usize,
    /// Flexibility of the trend at changepoints; larger is more flexible (default: 0.05).
    pub changepoint_prior_scale: f64,
    pub seasonality_mode: SeasonalityMode,
    /// Fixed seasonal period; detected by autocorrelation when `None`.
    pub period: Option<usize>,
    /// Longest period considered during detection (default: 52).
    pub max_period: usize,
}

impl Default for TrendModelConfig {
    fn default() -> Self {
        Self {
            interval_width: 0.99,
            changepoint_range: 0.8,
            n_changepoints: 25,
            changepoint_prior_scale: 0.05,
            seasonality_mode: SeasonalityMode::Multiplicative,
            period: None,
            max_period: 52,
        }
    }
}

impl TrendModelConfig {
    pub fn with_interval_width(mut self, width: f64) -> Self {
        self.interval_width = width;
        self
    }

    pub fn with_seasonality_mode(mut self, mode: SeasonalityMode) -> Self {
        self.seasonality_mode = mode;
        self
    }

    pub fn with_period(mut self, period: usize) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_changepoints(mut self, n_changepoints: usize, range: f64) -> Self {
        self.n_changepoints = n_changepoints;
        self.changepoint_range = range;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::invalid("interval_width", "must be in (0, 1)"));
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::invalid("changepoint_range", "must be in (0, 1]"));
        }
        check_positive("changepoint_prior_scale", self.changepoint_prior_scale)?;
        if matches!(self.period, Some(p) if p < 2) {
            return Err(ForecastError::invalid("period", "must be at least 2"));
        }
        Ok(())
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ConvolutionalConfig, EnsembleConfig, ModelsConfig, RecurrentConfig, SeasonalityMode,
        TrainingConfig, TrendModelConfig,
    };
    pub use crate::{ForecastError, ForecastModel, ForecastResult, ModelKind, Result};
}
