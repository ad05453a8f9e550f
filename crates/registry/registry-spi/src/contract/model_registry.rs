//! Model registry trait definition

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::model::{ModelRecord, RecordMetadata};

/// Name-keyed store of immutable model records.
///
/// Saving under a name that already exists fails with
/// [`RegistryError::AlreadyExists`](crate::RegistryError::AlreadyExists);
/// a retrain is saved under a new name.
pub trait ModelRegistry: Send + Sync {
    /// Store `record` under `name` and return where it was written.
    fn save_record(&self, name: &str, record: &ModelRecord) -> Result<String>;

    /// Returns [`RegistryError::NotFound`](crate::RegistryError::NotFound)
    /// for an unknown name.
    fn load_record(&self, name: &str) -> Result<ModelRecord>;

    /// Stored names, sorted.
    fn list(&self) -> Result<Vec<String>>;

    fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.list()?.iter().any(|n| n == name))
    }
}

/// Typed save/load on top of any registry.
pub trait RegistryExt: ModelRegistry {
    fn save<T: Serialize>(&self, name: &str, model: &T, metadata: RecordMetadata) -> Result<String> {
        self.save_record(name, &ModelRecord::encode(model, metadata)?)
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<(T, RecordMetadata)> {
        let record = self.load_record(name)?;
        Ok((record.decode()?, record.metadata))
    }
}

impl<R: ModelRegistry + ?Sized> RegistryExt for R {}
