//! Configuration validation

use super::types::{CacheConfig, LabCacheConfig};
use crate::error::{LabCacheError, LabCacheResult};

impl LabCacheConfig {
    /// Validate the whole configuration
    pub fn validate(&self) -> LabCacheResult<()> {
        self.cache.validate()?;
        if !self.logging.has_valid_level() {
            return Err(LabCacheError::invalid_input_field(
                format!("Unknown log level '{}'", self.logging.level),
                "logging.level",
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "compact" | "json") {
            return Err(LabCacheError::invalid_input_field(
                format!("Unknown log format '{}'", self.logging.format),
                "logging.format",
            ));
        }
        Ok(())
    }
}

impl CacheConfig {
    /// Validate numeric ranges and relations between settings
    pub fn validate(&self) -> LabCacheResult<()> {
        if !(self.ema_alpha > 0.0 && self.ema_alpha <= 1.0) {
            return Err(LabCacheError::invalid_input_field(
                format!("ema_alpha must be in (0, 1], got {}", self.ema_alpha),
                "cache.ema_alpha",
            ));
        }

        let unit_interval = [
            ("cache.default_confidence_threshold", self.default_confidence_threshold),
            ("cache.initial_success_rate", self.initial_success_rate),
            ("cache.min_model_confidence", self.min_model_confidence),
            ("cache.maintenance.high_success_rate", self.maintenance.high_success_rate),
            ("cache.maintenance.degraded_success_rate", self.maintenance.degraded_success_rate),
            ("cache.maintenance.min_threshold", self.maintenance.min_threshold),
            ("cache.maintenance.max_threshold", self.maintenance.max_threshold),
            ("cache.maintenance.prune_success_floor", self.maintenance.prune_success_floor),
        ];
        for (field, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) {
                return Err(LabCacheError::invalid_input_field(
                    format!("{} must be in [0, 1], got {}", field, value),
                    field,
                ));
            }
        }

        if self.maintenance.min_threshold > self.maintenance.max_threshold {
            return Err(LabCacheError::invalid_input_field(
                "maintenance.min_threshold exceeds maintenance.max_threshold",
                "cache.maintenance",
            ));
        }

        if self.proximity_window == 0 {
            return Err(LabCacheError::invalid_input_field(
                "proximity_window must be positive",
                "cache.proximity_window",
            ));
        }

        if self.cache_path.as_os_str().is_empty() {
            return Err(LabCacheError::invalid_input_field(
                "cache_path must not be empty",
                "cache.cache_path",
            ));
        }

        if self.resolved_backup_path() == self.cache_path {
            return Err(LabCacheError::invalid_input_field(
                "backup_path must differ from cache_path",
                "cache.backup_path",
            ));
        }

        Ok(())
    }
}
