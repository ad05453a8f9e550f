//! Contract module containing trait definitions for the registry

mod model_registry;

pub use model_registry::{ModelRegistry, RegistryExt};
