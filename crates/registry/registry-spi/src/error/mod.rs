//! Error module containing error types and result aliases

mod registry_error;

pub use registry_error::{RegistryError, Result};
