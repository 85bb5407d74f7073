//! Configuration loading and management

use super::env_loader::{apply_env, apply_settings};
use super::types::LabCacheConfig;
use crate::error::{LabCacheError, LabCacheResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of configuration data
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Configuration from a JSON file
    File(PathBuf),
    /// Configuration from `LABCACHE_*` environment variables
    Environment,
    /// Explicit key/value overrides (command line)
    Overrides(HashMap<String, String>),
    /// Default configuration
    Default,
}

/// Configuration loader with support for multiple sources
#[derive(Debug, Default)]
pub struct ConfigLoader {
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Add a configuration source
    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Add a file source
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.add_source(ConfigSource::File(path.as_ref().to_path_buf()))
    }

    /// Add environment variables source
    pub fn with_env(self) -> Self {
        self.add_source(ConfigSource::Environment)
    }

    /// Add explicit overrides
    pub fn with_overrides(self, overrides: HashMap<String, String>) -> Self {
        self.add_source(ConfigSource::Overrides(overrides))
    }

    /// Add default configuration source
    pub fn with_defaults(self) -> Self {
        self.add_source(ConfigSource::Default)
    }

    /// Load configuration from all sources, in order
    pub fn load(self) -> LabCacheResult<LabCacheConfig> {
        let mut config = LabCacheConfig::default();

        for source in &self.sources {
            match source {
                ConfigSource::File(path) => {
                    tracing::debug!("Loading config from file: {}", path.display());
                    if let Some(file_config) = read_config_file(path)? {
                        let LabCacheConfig { cache, logging } = file_config;
                        config.cache = cache;
                        config.logging.merge(logging);
                    }
                }
                ConfigSource::Environment => {
                    tracing::debug!("Loading config from environment");
                    apply_env(&mut config)?;
                }
                ConfigSource::Overrides(overrides) => {
                    tracing::debug!("Applying {} config overrides", overrides.len());
                    apply_settings(&mut config, overrides)?;
                }
                ConfigSource::Default => {
                    config = LabCacheConfig::default();
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// Load configuration from a file, falling back to defaults if it is missing
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> LabCacheResult<LabCacheConfig> {
    ConfigLoader::new().with_defaults().with_file(path).load()
}

/// Defaults, then the file, then the environment
pub fn load_config<P: AsRef<Path>>(path: P) -> LabCacheResult<LabCacheConfig> {
    ConfigLoader::new()
        .with_defaults()
        .with_file(path)
        .with_env()
        .load()
}

fn read_config_file(path: &Path) -> LabCacheResult<Option<LabCacheConfig>> {
    if !path.exists() {
        tracing::debug!("Config file {} not found, using defaults", path.display());
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        LabCacheError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let config = serde_json::from_str(&content).map_err(|e| {
        LabCacheError::config_with_context(
            format!("Failed to parse JSON config: {}", e),
            format!("Deserializing configuration from '{}'", path.display()),
        )
    })?;

    Ok(Some(config))
}
