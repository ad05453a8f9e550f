//! Model Registry Service Provider Interface
//!
//! Defines the [`ModelRegistry`] contract, the [`ModelRecord`] every
//! backend persists and the naming rules shared by all backends.

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at crate root for convenience
pub use contract::{ModelRegistry, RegistryExt};
pub use error::{RegistryError, Result};
pub use model::{validate_name, ModelRecord, RecordMetadata, TrainingDiagnostics};
