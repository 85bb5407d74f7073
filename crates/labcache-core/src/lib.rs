//! Labcache Core Library
//!
//! This crate provides the learned biomarker pattern cache: a persistent
//! pattern store, text normalization, chunk classification, learning from
//! LLM extraction results, and cache statistics.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod learner;
pub mod llm;
pub mod normalizer;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use cache::{
    AutosaveHandle, BiomarkerSource, ChunkResult, DocumentResult, PatternCache,
    ResolvedBiomarker, SharedPatternCache,
};
pub use classifier::{BiomarkerHit, ChunkClassifier, Classification, MissSpan};
pub use config::{CacheConfig, ConfigLoader, LabCacheConfig, LoggingConfig, load_config};
pub use error::{LabCacheError, LabCacheResult, ResultExt, UnifiedError};
pub use learner::{LearningReport, MaintenanceAction, MaintenanceReport, PatternLearner};
pub use llm::{BiomarkerExtractor, ExtractedBiomarker};
pub use normalizer::normalize;
pub use stats::{Statistics, StatisticsTracker};
pub use store::{BiomarkerPattern, LoadSource, PatternStore, SharedPatternStore, ValueRange};
