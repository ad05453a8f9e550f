//! Forecast Facade
//!
//! Unified re-exports for the forecast stack: the model contract, model and
//! ensemble configuration, both model variants, the inverse-error combiner
//! and the trend + seasonal decomposition model.

// Re-export everything from SPI
pub use forecast_spi::*;

// Re-export everything from API
pub use forecast_api::*;

// Re-export everything from Core
pub use forecast_core::*;
