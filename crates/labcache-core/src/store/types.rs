//! Pattern store data types

use crate::stats::Statistics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Schema version written by this build
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Threshold used when a stored value is unusable
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.9;

/// Success rate used when a stored value is unusable
pub const DEFAULT_SUCCESS_RATE: f64 = 0.7;

/// Closed numeric interval `[low, high]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub low: f64,
    pub high: f64,
}

impl ValueRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Range spanning `value` plus or minus `fraction` of it
    pub fn around(value: f64, fraction: f64) -> Self {
        let a = value * (1.0 - fraction);
        let b = value * (1.0 + fraction);
        Self::new(a.min(b), a.max(b))
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// Whether `value` is outside the range but within one range width of it
    pub fn is_near(&self, value: f64) -> bool {
        let margin = self.width().max(f64::EPSILON);
        !self.contains(value) && value >= self.low - margin && value <= self.high + margin
    }

    /// Grow the range to cover `value` plus or minus `fraction` of it
    pub fn widen_to_include(&mut self, value: f64, fraction: f64) {
        let around = Self::around(value, fraction);
        self.low = self.low.min(around.low);
        self.high = self.high.max(around.high);
    }

    /// Both bounds finite and ordered
    pub fn is_valid(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low <= self.high
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

/// Learned knowledge about one biomarker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerPattern {
    /// Canonical key (normalized name)
    pub name: String,
    /// Display name
    #[serde(default)]
    pub standardized_name: String,
    /// Units in first-seen order; the first is the display spelling
    #[serde(default)]
    pub common_units: Vec<String>,
    /// Typical value range per unit
    #[serde(default)]
    pub typical_ranges: BTreeMap<String, ValueRange>,
    /// Normalized surface forms seen in documents
    #[serde(default)]
    pub pattern_variations: Vec<String>,
    /// Minimum match confidence for a cache hit
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "Utc::now")]
    pub last_seen: DateTime<Utc>,
    /// Observations from the LLM and from verification
    #[serde(default)]
    pub frequency_count: u64,
    /// EMA of confirmations in [0, 1]
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_success_rate() -> f64 {
    DEFAULT_SUCCESS_RATE
}

impl BiomarkerPattern {
    /// A pattern with a single variation equal to its name and default scores
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            standardized_name: name.clone(),
            common_units: Vec::new(),
            typical_ranges: BTreeMap::new(),
            pattern_variations: vec![name.clone()],
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            last_seen: Utc::now(),
            frequency_count: 0,
            success_rate: DEFAULT_SUCCESS_RATE,
            name,
        }
    }

    pub fn with_standardized_name(mut self, name: impl Into<String>) -> Self {
        self.standardized_name = name.into();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        let unit = unit.into();
        if !self.common_units.contains(&unit) {
            self.common_units.push(unit);
        }
        self
    }

    pub fn with_range(mut self, unit: impl Into<String>, low: f64, high: f64) -> Self {
        let unit = unit.into();
        if !self.common_units.contains(&unit) {
            self.common_units.push(unit.clone());
        }
        self.typical_ranges.insert(unit, ValueRange::new(low, high));
        self
    }

    pub fn with_variation(mut self, variation: impl Into<String>) -> Self {
        let variation = variation.into();
        if !self.pattern_variations.contains(&variation) {
            self.pattern_variations.push(variation);
        }
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_success_rate(mut self, rate: f64) -> Self {
        self.success_rate = rate;
        self
    }

    pub fn with_frequency(mut self, count: u64) -> Self {
        self.frequency_count = count;
        self
    }

    /// Fold one outcome into the success rate EMA
    pub fn record_outcome(&mut self, confirmed: bool, alpha: f64) {
        let outcome = if confirmed { 1.0 } else { 0.0 };
        self.success_rate = (alpha * outcome + (1.0 - alpha) * self.success_rate).clamp(0.0, 1.0);
    }

    /// Add `unit` unless already present (exact spelling)
    pub fn merge_unit(&mut self, unit: &str) -> bool {
        let unit = unit.trim();
        if unit.is_empty() || self.common_units.iter().any(|u| u == unit) {
            return false;
        }
        self.common_units.push(unit.to_string());
        true
    }

    /// Add a normalized variation unless already present
    pub fn merge_variation(&mut self, variation: &str) -> bool {
        if variation.chars().count() < 2 || self.pattern_variations.iter().any(|v| v == variation)
        {
            return false;
        }
        self.pattern_variations.push(variation.to_string());
        true
    }
}

/// Snapshot header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<DateTime<Utc>>,
}

impl Default for SnapshotMetadata {
    fn default() -> Self {
        Self {
            created: Utc::now(),
            version: CURRENT_SCHEMA_VERSION,
            last_saved: None,
        }
    }
}

/// On-disk document: every pattern plus statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    #[serde(default)]
    pub biomarker_patterns: BTreeMap<String, BiomarkerPattern>,
    #[serde(default)]
    pub statistics: Statistics,
    #[serde(default)]
    pub metadata: SnapshotMetadata,
}

impl Default for CacheSnapshot {
    fn default() -> Self {
        Self {
            biomarker_patterns: BTreeMap::new(),
            statistics: Statistics::default(),
            metadata: SnapshotMetadata::default(),
        }
    }
}

/// Where a store's contents came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadSource {
    /// The primary cache file
    Primary,
    /// The backup, after the primary was missing or unusable
    Backup,
    /// Nothing usable on disk
    Empty,
}

impl fmt::Display for LoadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadSource::Primary => write!(f, "primary"),
            LoadSource::Backup => write!(f, "backup"),
            LoadSource::Empty => write!(f, "empty"),
        }
    }
}
