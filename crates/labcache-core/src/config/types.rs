//! Configuration types

use super::logging_config::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "labcache_config.json";
/// Default cache file name
pub const CACHE_FILE_NAME: &str = "pattern_cache.json";
/// Directory under the home directory holding the cache
pub const CACHE_DIR_NAME: &str = ".labcache";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabCacheConfig {
    /// Pattern cache settings
    pub cache: CacheConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Pattern cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Master switch. When disabled every chunk is routed to the LLM.
    pub enabled: bool,
    /// Snapshot file path
    pub cache_path: PathBuf,
    /// Backup snapshot path (defaults to `<stem>_backup.<ext>` next to the cache)
    pub backup_path: Option<PathBuf>,
    /// Threshold given to newly learned patterns
    pub default_confidence_threshold: f64,
    /// Success rate given to newly learned patterns
    pub initial_success_rate: f64,
    /// EMA smoothing factor for success rate updates
    pub ema_alpha: f64,
    /// LLM candidates below this model confidence are not learned from
    pub min_model_confidence: f64,
    /// How many tokens after a variation to search for a value
    pub proximity_window: usize,
    /// Save once this many changes are pending
    pub save_batch_size: u64,
    /// Autosave timer period
    pub autosave_interval_secs: u64,
    /// Run maintenance every N learning events (0 disables)
    pub maintenance_interval_events: u64,
    /// Send every Nth fully-resolved chunk to the LLM anyway (0 disables)
    pub verify_every_n_hits: u64,
    /// Confidence scoring weights
    pub scoring: ScoringWeights,
    /// Threshold adjustment and pruning
    pub maintenance: MaintenanceConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_path: default_cache_path(),
            backup_path: None,
            default_confidence_threshold: 0.9,
            initial_success_rate: 0.7,
            ema_alpha: 0.1,
            min_model_confidence: 0.5,
            proximity_window: 6,
            save_batch_size: 25,
            autosave_interval_secs: 30,
            maintenance_interval_events: 200,
            verify_every_n_hits: 0,
            scoring: ScoringWeights::default(),
            maintenance: MaintenanceConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Config for a cache stored at `path`, everything else default
    pub fn with_cache_path(path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: path.into(),
            ..Default::default()
        }
    }

    /// Config with the cache switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Backup path, derived from the cache path when not configured
    pub fn resolved_backup_path(&self) -> PathBuf {
        self.backup_path
            .clone()
            .unwrap_or_else(|| default_backup_path(&self.cache_path))
    }
}

/// Weights of the match confidence function.
///
/// The sum of the additive terms is scaled by the pattern's reliability,
/// `reliability_floor + (1 - reliability_floor) * success_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Specificity of a two-character variation
    pub specificity_base: f64,
    /// Added per character beyond two
    pub specificity_per_char: f64,
    /// Specificity ceiling
    pub specificity_max: f64,
    /// A numeric value follows the variation
    pub value_found: f64,
    /// The value carries one of the pattern's units
    pub unit_match: f64,
    /// The value lies inside the typical range for its unit
    pub in_range: f64,
    /// The value lies within one range width of the typical range
    pub near_range: f64,
    /// How far below the threshold a wildly out-of-range match is capped
    pub out_of_range_margin: f64,
    /// Reliability of a pattern that has never been confirmed
    pub reliability_floor: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            specificity_base: 0.25,
            specificity_per_char: 0.05,
            specificity_max: 0.45,
            value_found: 0.30,
            unit_match: 0.25,
            in_range: 0.20,
            near_range: 0.08,
            out_of_range_margin: 0.05,
            reliability_floor: 0.25,
        }
    }
}

/// Periodic maintenance settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Observations required before a threshold is adjusted
    pub min_frequency_for_adjustment: u64,
    /// Success rate at or above which the threshold is lowered
    pub high_success_rate: f64,
    /// Success rate below which the threshold is raised
    pub degraded_success_rate: f64,
    /// Threshold change per maintenance pass
    pub threshold_step: f64,
    /// Lowest threshold maintenance will set
    pub min_threshold: f64,
    /// Highest threshold maintenance will set
    pub max_threshold: f64,
    /// Observations required before a pattern may be pruned
    pub prune_min_frequency: u64,
    /// Patterns below this success rate are pruned
    pub prune_success_floor: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            min_frequency_for_adjustment: 10,
            high_success_rate: 0.95,
            degraded_success_rate: 0.80,
            threshold_step: 0.02,
            min_threshold: 0.75,
            max_threshold: 0.99,
            prune_min_frequency: 20,
            prune_success_floor: 0.3,
        }
    }
}

/// `~/.labcache/pattern_cache.json`
pub fn default_cache_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIR_NAME)
        .join(CACHE_FILE_NAME)
}

/// `dir/name.json` becomes `dir/name_backup.json`
pub fn default_backup_path(cache_path: &Path) -> PathBuf {
    let stem = cache_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pattern_cache".to_string());
    let file_name = match cache_path.extension() {
        Some(ext) => format!("{}_backup.{}", stem, ext.to_string_lossy()),
        None => format!("{}_backup", stem),
    };
    cache_path.with_file_name(file_name)
}
