//! Environment variable and key/value overrides

use super::types::LabCacheConfig;
use crate::error::{LabCacheError, LabCacheResult};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Prefix of recognized environment variables
pub const ENV_PREFIX: &str = "LABCACHE_";

/// Keys accepted from the environment (`LABCACHE_<KEY>`) and from overrides
const SETTING_KEYS: &[&str] = &[
    "enabled",
    "cache_path",
    "backup_path",
    "confidence_threshold",
    "ema_alpha",
    "prune_min_frequency",
    "save_batch_size",
    "verify_every_n_hits",
    "log_level",
    "log_format",
];

/// Apply `LABCACHE_*` environment variables to the config
pub fn apply_env(config: &mut LabCacheConfig) -> LabCacheResult<()> {
    let settings: HashMap<String, String> = SETTING_KEYS
        .iter()
        .filter_map(|key| {
            let var = format!("{}{}", ENV_PREFIX, key.to_ascii_uppercase());
            env::var(&var).ok().map(|value| (key.to_string(), value))
        })
        .collect();

    apply_settings(config, &settings)
}

/// Apply explicit key/value settings to the config
pub fn apply_settings(
    config: &mut LabCacheConfig,
    settings: &HashMap<String, String>,
) -> LabCacheResult<()> {
    for (key, value) in settings {
        apply_setting(config, key, value)?;
    }
    Ok(())
}

fn apply_setting(config: &mut LabCacheConfig, key: &str, value: &str) -> LabCacheResult<()> {
    let cache = &mut config.cache;
    match key {
        "enabled" => cache.enabled = parse_value(key, value)?,
        "cache_path" => cache.cache_path = PathBuf::from(value),
        "backup_path" => cache.backup_path = Some(PathBuf::from(value)),
        "confidence_threshold" => cache.default_confidence_threshold = parse_value(key, value)?,
        "ema_alpha" => cache.ema_alpha = parse_value(key, value)?,
        "prune_min_frequency" => cache.maintenance.prune_min_frequency = parse_value(key, value)?,
        "save_batch_size" => cache.save_batch_size = parse_value(key, value)?,
        "verify_every_n_hits" => cache.verify_every_n_hits = parse_value(key, value)?,
        "log_level" => config.logging.level = value.to_string(),
        "log_format" => config.logging.format = value.to_string(),
        other => {
            return Err(LabCacheError::invalid_input_field(
                format!("Unknown configuration key '{}'", other),
                other,
            ));
        }
    }
    tracing::debug!(key, value, "applied configuration override");
    Ok(())
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> LabCacheResult<T> {
    value.trim().parse().map_err(|_| {
        LabCacheError::config_with_context(
            format!("Invalid value for {}", key),
            format!("Parsing '{}'", value),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_apply_settings() {
        let mut config = LabCacheConfig::default();
        apply_settings(
            &mut config,
            &settings(&[
                ("enabled", "false"),
                ("cache_path", "/tmp/p.json"),
                ("ema_alpha", "0.2"),
                ("prune_min_frequency", "40"),
                ("log_level", "debug"),
            ]),
        )
        .unwrap();

        assert!(!config.cache.enabled);
        assert_eq!(config.cache.cache_path, PathBuf::from("/tmp/p.json"));
        assert_eq!(config.cache.ema_alpha, 0.2);
        assert_eq!(config.cache.maintenance.prune_min_frequency, 40);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_bad_number_is_config_error() {
        let mut config = LabCacheConfig::default();
        let err = apply_settings(&mut config, &settings(&[("ema_alpha", "fast")])).unwrap_err();
        assert!(matches!(err, LabCacheError::Config { .. }));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut config = LabCacheConfig::default();
        let err = apply_settings(&mut config, &settings(&[("colour", "blue")])).unwrap_err();
        assert!(matches!(err, LabCacheError::InvalidInput { .. }));
    }
}
