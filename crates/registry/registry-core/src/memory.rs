//! Process-local registry.

use std::collections::HashMap;
use std::sync::RwLock;

use registry_spi::{validate_name, ModelRecord, ModelRegistry, RegistryError, Result};
use tracing::info;

#[derive(Debug, Default)]
struct Arena {
    records: Vec<ModelRecord>,
    index: HashMap<String, usize>,
}

/// Records kept in an append-only arena with a name-keyed index.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    arena: RwLock<Arena>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arena.read().map(|a| a.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ModelRegistry for InMemoryRegistry {
    fn save_record(&self, name: &str, record: &ModelRecord) -> Result<String> {
        validate_name(name)?;
        let mut arena = self.arena.write().map_err(|_| RegistryError::LockPoisoned)?;
        if arena.index.contains_key(name) {
            return Err(RegistryError::AlreadyExists(name.to_string()));
        }
        let slot = arena.records.len();
        arena.records.push(record.clone());
        arena.index.insert(name.to_string(), slot);
        info!(name, slot, model_type = %record.metadata.model_type, "Model record stored in memory");
        Ok(format!("memory://{}", name))
    }

    fn load_record(&self, name: &str) -> Result<ModelRecord> {
        let arena = self.arena.read().map_err(|_| RegistryError::LockPoisoned)?;
        arena
            .index
            .get(name)
            .map(|&slot| arena.records[slot].clone())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    fn list(&self) -> Result<Vec<String>> {
        let arena = self.arena.read().map_err(|_| RegistryError::LockPoisoned)?;
        let mut names: Vec<String> = arena.index.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn contains(&self, name: &str) -> Result<bool> {
        let arena = self.arena.read().map_err(|_| RegistryError::LockPoisoned)?;
        Ok(arena.index.contains_key(name))
    }
}
