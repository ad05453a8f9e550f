//! Pipeline Core
//!
//! Scalers, sliding windows, chronological splits and the stationarity
//! advisory that turn a raw series into supervised training data.

mod preprocessor;
mod scaler;
mod stationarity;
mod windowing;

pub use pipeline_spi::{DataSplit, PipelineError, Result, Scaler, TimeSeries, Window, Windows};

pub use preprocessor::{PreparedData, Preprocessor};
pub use scaler::{MinMaxScaler, ScalingTransform, StandardScaler};
pub use stationarity::{
    check_stationarity, difference, linear_fit, make_stationary, StationarityReport,
    MAX_ROLLING_WINDOW, STATIONARITY_TOLERANCE,
};
pub use windowing::{create_windows, split_series, split_sizes, split_windows, window_count};
