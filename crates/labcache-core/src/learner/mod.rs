//! Pattern learning
//!
//! Turns LLM extraction results into future cache hits:
//! - `core`: learner struct and settings
//! - `learning`: create, confirm and contradict patterns from LLM results
//! - `maintenance`: periodic threshold adjustment and pruning

pub mod core;
pub mod learning;
pub mod maintenance;
pub mod types;


pub use self::core::{LearnerSettings, PatternLearner};
pub use types::{LearningReport, MaintenanceAction, MaintenanceReport};
