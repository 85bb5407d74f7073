//! Configuration for the pattern cache
//!
//! Configuration is assembled from layered sources (defaults, a JSON file,
//! `LABCACHE_*` environment variables and explicit overrides) by
//! [`ConfigLoader`]. Later sources win.

pub mod loader;
pub mod logging_config;
pub mod types;
pub mod validation;

mod env_loader;

pub use loader::{ConfigLoader, ConfigSource, load_config, load_config_from_file};
pub use logging_config::LoggingConfig;
pub use types::{
    CACHE_DIR_NAME, CACHE_FILE_NAME, CONFIG_FILE_NAME, CacheConfig, LabCacheConfig,
    MaintenanceConfig, ScoringWeights, default_backup_path, default_cache_path,
};
