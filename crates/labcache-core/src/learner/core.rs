//! PatternLearner struct and settings

use crate::classifier::ChunkClassifier;
use crate::config::{CacheConfig, MaintenanceConfig};
use crate::store::SharedPatternStore;

/// Learning parameters taken from [`CacheConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct LearnerSettings {
    /// EMA smoothing factor
    pub ema_alpha: f64,
    /// Threshold of a newly created pattern
    pub default_confidence_threshold: f64,
    /// Success rate of a newly created pattern
    pub initial_success_rate: f64,
    /// Minimum model confidence to learn from
    pub min_model_confidence: f64,
    /// Fractional margin around observed values when seeding or widening ranges
    pub range_margin: f64,
    pub maintenance: MaintenanceConfig,
}

impl From<&CacheConfig> for LearnerSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            ema_alpha: config.ema_alpha,
            default_confidence_threshold: config.default_confidence_threshold,
            initial_success_rate: config.initial_success_rate,
            min_model_confidence: config.min_model_confidence,
            range_margin: 0.2,
            maintenance: config.maintenance.clone(),
        }
    }
}

impl Default for LearnerSettings {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

/// Updates patterns from LLM results and runs maintenance
#[derive(Debug, Clone)]
pub struct PatternLearner {
    pub(super) store: SharedPatternStore,
    pub(super) classifier: ChunkClassifier,
    pub(super) settings: LearnerSettings,
}

impl PatternLearner {
    pub fn new(store: SharedPatternStore, config: &CacheConfig) -> Self {
        Self {
            classifier: ChunkClassifier::new(store.clone(), config),
            settings: LearnerSettings::from(config),
            store,
        }
    }

    pub fn settings(&self) -> &LearnerSettings {
        &self.settings
    }

    pub fn store(&self) -> &SharedPatternStore {
        &self.store
    }
}
