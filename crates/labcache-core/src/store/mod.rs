//! Persistent pattern store
//!
//! Holds the learned [`BiomarkerPattern`]s keyed by canonical name together
//! with the aggregate [`Statistics`](crate::stats::Statistics), and persists
//! both as one JSON snapshot.
//!
//! # File layout
//!
//! ```json
//! {
//!   "biomarker_patterns": { "glucose": { "name": "glucose", ... } },
//!   "statistics": { "total_extractions": 12, ... },
//!   "metadata": { "created": "...", "version": 2, "last_saved": "..." }
//! }
//! ```
//!
//! Saves are atomic and keep the previous snapshot as `<stem>_backup.<ext>`.
//! Loading falls back from the primary file to the backup to an empty store.

mod manager;
mod migration;
mod persistence;
mod types;
mod validation;


pub use manager::{PatternStore, SharedPatternStore};
pub use migration::migrate;
pub use persistence::{read_snapshot, write_atomic, write_snapshot};
pub use types::{
    BiomarkerPattern, CURRENT_SCHEMA_VERSION, CacheSnapshot, DEFAULT_CONFIDENCE_THRESHOLD,
    DEFAULT_SUCCESS_RATE, LoadSource, SnapshotMetadata, ValueRange,
};
