//! One JSON file per record.

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use registry_spi::{validate_name, ModelRecord, ModelRegistry, RegistryError, Result};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const EXTENSION: &str = "json";

/// Stores each record as `<root>/<name>.json`.
///
/// Writes go to a temporary file in `root` that is then linked into place
/// without replacing an existing file, so two concurrent saves under one
/// name leave exactly one record and the loser gets
/// [`RegistryError::AlreadyExists`].
#[derive(Debug, Clone)]
pub struct FileRegistry {
    root: PathBuf,
}

impl FileRegistry {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, EXTENSION))
    }
}

impl ModelRegistry for FileRegistry {
    fn save_record(&self, name: &str, record: &ModelRecord) -> Result<String> {
        validate_name(name)?;
        let path = self.path_for(name);
        if path.exists() {
            return Err(RegistryError::AlreadyExists(name.to_string()));
        }
        fs::create_dir_all(&self.root)?;

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, record)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist_noclobber(&path).map_err(|e| {
            if e.error.kind() == ErrorKind::AlreadyExists {
                RegistryError::AlreadyExists(name.to_string())
            } else {
                RegistryError::from(e.error)
            }
        })?;

        let location = path.display().to_string();
        info!(
            name,
            model_type = %record.metadata.model_type,
            location = %location,
            "Model record saved"
        );
        Ok(location)
    }

    fn load_record(&self, name: &str) -> Result<ModelRecord> {
        validate_name(name)?;
        let bytes = fs::read(self.path_for(name)).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                RegistryError::NotFound(name.to_string())
            } else {
                e.into()
            }
        })?;
        let record = serde_json::from_slice(&bytes)?;
        debug!(name, "Model record loaded");
        Ok(record)
    }

    fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn contains(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        Ok(self.path_for(name).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_spi::{RecordMetadata, RegistryExt};
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Model {
        weights: Vec<f64>,
    }

    fn model() -> Model {
        Model {
            weights: vec![0.25, -0.5, 1.0],
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let registry = FileRegistry::new(dir.path());
        let location = registry
            .save("lstm_daily", &model(), RecordMetadata::new("lstm", vec![200, 1]))
            .unwrap();
        assert!(location.ends_with("lstm_daily.json"));
        assert!(dir.path().join("lstm_daily.json").is_file());

        let (loaded, metadata): (Model, _) = registry.load("lstm_daily").unwrap();
        assert_eq!(loaded, model());
        assert_eq!(metadata.model_type, "lstm");
        assert_eq!(metadata.data_shape, vec![200, 1]);
    }

    #[test]
    fn test_same_name_rejected() {
        let dir = TempDir::new().unwrap();
        let registry = FileRegistry::new(dir.path());
        let metadata = RecordMetadata::new("cnn", vec![10]);
        registry.save("cnn", &model(), metadata.clone()).unwrap();
        assert_eq!(
            registry.save("cnn", &Model { weights: vec![] }, metadata),
            Err(RegistryError::AlreadyExists("cnn".into()))
        );
        let (kept, _): (Model, _) = registry.load("cnn").unwrap();
        assert_eq!(kept, model());
    }

    #[test]
    fn test_load_unknown_name() {
        let dir = TempDir::new().unwrap();
        let registry = FileRegistry::new(dir.path());
        assert_eq!(
            registry.load_record("missing"),
            Err(RegistryError::NotFound("missing".into()))
        );
    }

    #[test]
    fn test_list_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        let registry = FileRegistry::new(dir.path());
        for name in ["zeta", "alpha", "mid.v2"] {
            registry
                .save(name, &model(), RecordMetadata::new("lstm", vec![]))
                .unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join(".hidden.json"), "{}").unwrap();
        assert_eq!(registry.list().unwrap(), vec!["alpha", "mid.v2", "zeta"]);
        assert!(registry.contains("zeta").unwrap());
        assert!(!registry.contains("beta").unwrap());
    }

    #[test]
    fn test_missing_root_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let registry = FileRegistry::new(dir.path().join("not-created"));
        assert!(registry.list().unwrap().is_empty());
    }

    #[test]
    fn test_root_created_on_save() {
        let dir = TempDir::new().unwrap();
        let registry = FileRegistry::new(dir.path().join("nested").join("models"));
        registry
            .save("first", &model(), RecordMetadata::new("cnn", vec![]))
            .unwrap();
        assert_eq!(registry.list().unwrap(), vec!["first"]);
    }

    #[test]
    fn test_invalid_name_never_touches_disk() {
        let dir = TempDir::new().unwrap();
        let registry = FileRegistry::new(dir.path());
        assert!(matches!(
            registry.save("../escape", &model(), RecordMetadata::new("cnn", vec![])),
            Err(RegistryError::InvalidName { .. })
        ));
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_corrupt_record() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        let registry = FileRegistry::new(dir.path());
        assert!(matches!(
            registry.load_record("broken"),
            Err(RegistryError::Serialization(_))
        ));
    }

    #[test]
    fn test_concurrent_saves_keep_one_record() {
        let dir = TempDir::new().unwrap();
        let registry = FileRegistry::new(dir.path());
        let results: Vec<Result<String>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let registry = &registry;
                    scope.spawn(move || {
                        registry.save(
                            "shared",
                            &Model { weights: vec![i as f64] },
                            RecordMetadata::new("lstm", vec![]),
                        )
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| *e == RegistryError::AlreadyExists("shared".into())));
        assert_eq!(registry.list().unwrap(), vec!["shared"]);
    }
}
