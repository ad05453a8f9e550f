//! Engine configuration.

use std::fs;
use std::path::Path;

use anomaly_facade::DetectorsConfig;
use forecast_facade::{EnsembleConfig, ModelsConfig};
use pipeline_facade::PreprocessConfig;
use registry_facade::RegistryConfig;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Environment variable naming the registry directory.
pub const ENV_REGISTRY_DIR: &str = "ENSEMBLE_REGISTRY_DIR";
/// `true`/`false` toggle for running models and detectors concurrently.
pub const ENV_PARALLEL: &str = "ENSEMBLE_PARALLEL";
/// Seed shared by model weight initialisation and HMM initialisation.
pub const ENV_SEED: &str = "ENSEMBLE_SEED";
/// Comma-separated variant identifiers to disable.
pub const ENV_DISABLED_MODELS: &str = "ENSEMBLE_DISABLED_MODELS";

/// Everything an [`Engine`](crate::Engine) needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scaler and split settings. The window shape comes from each request.
    pub preprocess: PreprocessConfig,
    pub models: ModelsConfig,
    pub ensemble: EnsembleConfig,
    pub detectors: DetectorsConfig,
    pub registry: RegistryConfig,
    /// Run the models / detectors of one request concurrently (default: true).
    pub parallel: bool,
    /// Model or detector identifiers to switch off, e.g. `["cnn"]`.
    pub disabled_models: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessConfig::default(),
            models: ModelsConfig::default(),
            ensemble: EnsembleConfig::default(),
            detectors: DetectorsConfig::default(),
            registry: RegistryConfig::default(),
            parallel: true,
            disabled_models: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| EngineError::Config(format!("invalid {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the `ENSEMBLE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `ENSEMBLE_*` overrides read through `lookup`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(dir) = lookup(ENV_REGISTRY_DIR) {
            self.registry = RegistryConfig::file(dir);
        }
        if let Some(raw) = lookup(ENV_PARALLEL) {
            self.parallel = parse_bool(ENV_PARALLEL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SEED) {
            let seed: u64 = raw.trim().parse().map_err(|_| {
                EngineError::Config(format!("{} must be an unsigned integer, got '{}'", ENV_SEED, raw))
            })?;
            self = self.with_seed(seed);
        }
        if let Some(raw) = lookup(ENV_DISABLED_MODELS) {
            self.disabled_models = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        self.validate()?;
        Ok(self)
    }

    /// Seed every randomised component.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.models.training.seed = seed;
        self.detectors.state_transition.seed = seed;
        self
    }

    pub fn with_registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_models(mut self, models: ModelsConfig) -> Self {
        self.models = models;
        self
    }

    pub fn with_detectors(mut self, detectors: DetectorsConfig) -> Self {
        self.detectors = detectors;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_disabled_models(mut self, disabled: Vec<String>) -> Self {
        self.disabled_models = disabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.preprocess.split.validate()?;
        self.models.training.validate()?;
        self.models.recurrent.validate()?;
        self.models.convolutional.validate()?;
        self.detectors.validate()?;
        Ok(())
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(EngineError::Config(format!(
            "{} must be true or false, got '{}'",
            key, raw
        ))),
    }
}
