//! End-to-end preparation of a raw series for supervised training.

use pipeline_api::PreprocessConfig;
use pipeline_spi::{DataSplit, PipelineError, Result, Scaler, TimeSeries, Windows};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::scaler::ScalingTransform;
use crate::stationarity::{check_stationarity, StationarityReport};
use crate::windowing::{create_windows, split_sizes, window_count};

/// Output of [`Preprocessor::prepare`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedData {
    /// Windows of the scaled series, split chronologically.
    pub split: DataSplit<Windows>,
    /// Scaler fitted on the training observations only.
    pub scaler: ScalingTransform,
    /// Whole input series in scaled space.
    pub scaled: TimeSeries,
    /// Advisory stationarity check on the raw target column.
    pub stationarity: StationarityReport,
    pub target_column: usize,
}

impl PreparedData {
    /// The most recent `input_len` scaled steps, flattened row-major.
    pub fn last_window(&self) -> Vec<f64> {
        let width = self.scaled.width();
        let l = self.split.train.input_len();
        let values = self.scaled.values();
        values[values.len() - l * width..].to_vec()
    }

    /// Map scaled target values back to original units.
    pub fn inverse_targets(&self, values: &[f64]) -> Result<Vec<f64>> {
        self.scaler
            .inverse_transform_feature(values, self.target_column)
    }
}

/// Scales, windows and splits a series according to a [`PreprocessConfig`].
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Fit a fresh scaler on `series` and return the scaled series with it.
    pub fn fit_transform(&self, series: &TimeSeries) -> Result<(TimeSeries, ScalingTransform)> {
        let mut scaler = ScalingTransform::new(self.config.scaler);
        let scaled = scaler.fit_transform(series)?;
        Ok((scaled, scaler))
    }

    /// Window and split `series`, fitting the scaler on the span covered by
    /// the training windows so validation and test data never leak into it.
    pub fn prepare(&self, series: &TimeSeries) -> Result<PreparedData> {
        self.config.validate()?;
        let window = &self.config.window;
        let n_windows = window_count(series.len(), window).ok_or(
            PipelineError::InsufficientData {
                required: window.min_length(),
                actual: series.len(),
            },
        )?;
        let (n_train, n_val, n_test) = split_sizes(n_windows, &self.config.split)?;

        // Training window i covers steps i..i+L+H.
        let train_span = n_train - 1 + window.min_length();
        let mut scaler = ScalingTransform::new(self.config.scaler);
        scaler.fit(&series.slice(0..train_span)?)?;
        let scaled = scaler.transform(series)?;

        let windows = create_windows(&scaled, window)?;
        let split = DataSplit {
            train: windows.slice(0..n_train),
            validation: windows.slice(n_train..n_train + n_val),
            test: windows.slice(n_train + n_val..n_windows),
        };

        let stationarity = check_stationarity(&series.column(window.target_column)?);
        if !stationarity.is_stationary {
            warn!(
                rolling_mean_std = stationarity.rolling_mean_std,
                rolling_std_std = stationarity.rolling_std_std,
                "Series does not look stationary"
            );
        }

        debug!(
            len = series.len(),
            width = series.width(),
            train = n_train,
            validation = n_val,
            test = n_test,
            scaler = scaler.name(),
            "Prepared series"
        );

        Ok(PreparedData {
            split,
            scaler,
            scaled,
            stationarity,
            target_column: window.target_column,
        })
    }
}
