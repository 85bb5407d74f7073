//! Configuration management commands

use crate::console::CliConsole;
use labcache_core::config::{ConfigLoader, load_config_from_file};
use labcache_core::{LabCacheConfig, LabCacheError, LabCacheResult};
use std::path::Path;

/// Show the effective configuration: file, then environment
pub async fn show(config_file: &str, verbose: bool) -> LabCacheResult<()> {
    let console = CliConsole::new(true);
    console.print_header("Configuration");

    if Path::new(config_file).exists() {
        console.success(&format!("Loaded configuration from: {config_file}"));
    } else {
        console.warn(&format!("Configuration file not found: {config_file}"));
        console.info("Using default configuration");
    }

    let config = ConfigLoader::new()
        .with_defaults()
        .with_file(config_file)
        .with_env()
        .load()?;
    print_config(&console, &config);

    if verbose {
        console.print_separator();
        println!("{}", to_json(&config)?);
    }
    Ok(())
}

/// Validate configuration
pub async fn validate(config_file: &str) -> LabCacheResult<()> {
    let console = CliConsole::new(true);
    console.print_header("Configuration Validation");

    if !Path::new(config_file).exists() {
        return Err(LabCacheError::config(format!(
            "Configuration file not found: {config_file}"
        )));
    }

    match load_config_from_file(config_file) {
        Ok(config) => {
            console.success("Configuration is valid");
            print_config(&console, &config);
            Ok(())
        }
        Err(e) => {
            console.error(&format!("Configuration validation failed: {e}"));
            Err(e)
        }
    }
}

/// Initialize a new configuration file
pub async fn init(config_file: &str, force: bool) -> LabCacheResult<()> {
    let console = CliConsole::new(true);
    console.print_header("Configuration Initialization");

    if Path::new(config_file).exists() && !force {
        console.error(&format!("Configuration file already exists: {config_file}"));
        console.info("Use --force to overwrite");
        return Err(LabCacheError::config("Configuration file already exists"));
    }

    let config_json = to_json(&LabCacheConfig::default())?;
    tokio::fs::write(config_file, config_json)
        .await
        .map_err(|e| LabCacheError::config(format!("Failed to write configuration file: {e}")))?;

    console.success(&format!("Created configuration file: {config_file}"));
    Ok(())
}

fn to_json(config: &LabCacheConfig) -> LabCacheResult<String> {
    serde_json::to_string_pretty(config)
        .map_err(|e| LabCacheError::config(format!("Failed to serialize configuration: {e}")))
}

/// Print configuration details
fn print_config(console: &CliConsole, config: &LabCacheConfig) {
    let cache = &config.cache;
    console.field("Cache enabled", cache.enabled);
    console.field("Cache file", cache.cache_path.display());
    console.field("Backup file", cache.resolved_backup_path().display());
    console.field("Confidence threshold", cache.default_confidence_threshold);
    console.field("EMA alpha", cache.ema_alpha);
    console.field("Save batch size", cache.save_batch_size);
    console.field("Verify every N hits", cache.verify_every_n_hits);
    console.field("Prune min frequency", cache.maintenance.prune_min_frequency);
    console.field("Log level", &config.logging.level);
    console.field("Log format", &config.logging.format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_validate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labcache_config.json");
        let path = path.to_str().unwrap();

        init(path, false).await.unwrap();
        validate(path).await.unwrap();

        let written: LabCacheConfig =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written, LabCacheConfig::default());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labcache_config.json");
        std::fs::write(&path, "{}").unwrap();
        let path = path.to_str().unwrap();

        assert!(init(path, false).await.is_err());
        init(path, true).await.unwrap();
        assert_ne!(std::fs::read_to_string(path).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_validate_rejects_bad_alpha() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labcache_config.json");
        std::fs::write(&path, r#"{"cache": {"ema_alpha": 0.0}}"#).unwrap();

        assert!(validate(path.to_str().unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn test_validate_missing_file() {
        assert!(validate("/nonexistent/labcache_config.json").await.is_err());
    }
}
