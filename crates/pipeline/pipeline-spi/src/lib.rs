//! Pipeline Service Provider Interface
//!
//! Defines the series and window types shared by every component, the
//! [`Scaler`] contract and the preprocessing error type.

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at crate root for convenience
pub use contract::Scaler;
pub use error::{PipelineError, Result};
pub use model::{DataSplit, TimeSeries, Window, Windows};
