//! Data models for preprocessing.
//!
//! Series, windows and chronological partitions.

mod split;
mod time_series;
mod windows;

pub use split::DataSplit;
pub use time_series::TimeSeries;
pub use windows::{Window, Windows};
