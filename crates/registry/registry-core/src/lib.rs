//! Model Registry Core
//!
//! A directory of JSON record files and an in-memory arena, both behind
//! the [`ModelRegistry`] contract.

pub mod file;
pub mod memory;

pub use registry_spi::{
    validate_name, ModelRecord, ModelRegistry, RecordMetadata, RegistryError, RegistryExt, Result,
    TrainingDiagnostics,
};

pub use file::FileRegistry;
pub use memory::InMemoryRegistry;

use std::sync::Arc;

use registry_api::{RegistryBackend, RegistryConfig};

/// Registry described by `config`.
pub fn open_registry(config: &RegistryConfig) -> Arc<dyn ModelRegistry> {
    match config.backend {
        RegistryBackend::File => Arc::new(FileRegistry::new(&config.root)),
        RegistryBackend::Memory => Arc::new(InMemoryRegistry::new()),
    }
}
