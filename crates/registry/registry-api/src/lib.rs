//! Model Registry API
//!
//! Configuration selecting and locating the registry backend.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// Re-export SPI types
pub use registry_spi::{
    validate_name, ModelRecord, ModelRegistry, RecordMetadata, RegistryError, RegistryExt, Result,
    TrainingDiagnostics,
};

/// Where records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryBackend {
    /// One JSON file per record under `root`
    #[default]
    File,
    /// Process-local, discarded on exit
    Memory,
}

/// Registry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub backend: RegistryBackend,
    /// Directory holding the record files (default: `models`).
    pub root: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: RegistryBackend::File,
            root: PathBuf::from("models"),
        }
    }
}

impl RegistryConfig {
    /// File registry rooted at `root`.
    pub fn file(root: impl Into<PathBuf>) -> Self {
        Self {
            backend: RegistryBackend::File,
            root: root.into(),
        }
    }

    pub fn memory() -> Self {
        Self {
            backend: RegistryBackend::Memory,
            ..Self::default()
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
}
