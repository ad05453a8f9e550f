//! Pipeline Facade
//!
//! Unified re-exports for time series preprocessing: series and window types,
//! configuration, scalers and the [`Preprocessor`].

// Re-export everything from SPI
pub use pipeline_spi::*;

// Re-export everything from API
pub use pipeline_api::*;

// Re-export everything from Core
pub use pipeline_core::*;
