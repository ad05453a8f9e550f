//! Model Registry Facade
//!
//! Unified re-exports for the registry: the contract and record format,
//! the backend configuration and both backends.

// Re-export everything from SPI
pub use registry_spi::*;

// Re-export everything from API
pub use registry_api::*;

// Re-export everything from Core
pub use registry_core::*;
