//! Registry error types

use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur while saving, loading or listing records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// No record under this name
    #[error("Model '{0}' not found in registry")]
    NotFound(String),

    /// A record with this name already exists; records are never overwritten
    #[error("Model '{0}' already exists in registry")]
    AlreadyExists(String),

    #[error("Invalid model name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Another thread panicked while holding the registry lock
    #[error("Registry lock poisoned")]
    LockPoisoned,
}

impl From<std::io::Error> for RegistryError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
