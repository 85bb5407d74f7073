//! PatternStore implementation

use super::persistence::{quarantine, read_snapshot, write_snapshot};
use super::types::{BiomarkerPattern, CacheSnapshot, LoadSource, SnapshotMetadata};
use crate::config::{CacheConfig, default_backup_path};
use crate::error::LabCacheResult;
use crate::normalizer::normalize;
use crate::stats::Statistics;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Shared handle to a pattern store
pub type SharedPatternStore = Arc<PatternStore>;

/// Persistent map from canonical biomarker name to pattern, plus statistics.
///
/// Readers proceed concurrently. Each mutation holds the write lock for the
/// whole read-modify-write, so observations are never lost.
#[derive(Debug)]
pub struct PatternStore {
    patterns: RwLock<HashMap<String, BiomarkerPattern>>,
    statistics: Mutex<Statistics>,
    created: DateTime<Utc>,
    path: PathBuf,
    backup_path: PathBuf,
    load_source: LoadSource,
    /// Pattern mutations since the last save
    pending_changes: AtomicU64,
    /// Any mutation (patterns or statistics) since the last save
    dirty: AtomicBool,
    save_lock: Mutex<()>,
}

impl PatternStore {
    /// An empty store that will save to `path`
    pub fn new(path: impl Into<PathBuf>, backup_path: impl Into<PathBuf>) -> Self {
        Self {
            patterns: RwLock::new(HashMap::new()),
            statistics: Mutex::new(Statistics::default()),
            created: Utc::now(),
            path: path.into(),
            backup_path: backup_path.into(),
            load_source: LoadSource::Empty,
            pending_changes: AtomicU64::new(0),
            dirty: AtomicBool::new(false),
            save_lock: Mutex::new(()),
        }
    }

    /// Load the store for `config`
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::load(&config.cache_path, config.resolved_backup_path())
    }

    /// Load from `path`, falling back to `backup_path`, then to empty.
    ///
    /// Never fails: an unusable primary is moved aside and logged, and an
    /// unusable backup yields an empty store.
    pub fn load(path: impl AsRef<Path>, backup_path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let backup_path = backup_path.as_ref();

        match read_snapshot(path) {
            Ok(Some(snapshot)) => {
                return Self::from_snapshot(snapshot, path, backup_path, LoadSource::Primary);
            }
            Ok(None) => {
                tracing::info!(path = %path.display(), "no pattern cache file found");
            }
            Err(e) => {
                tracing::warn!(error = %e, "pattern cache unusable, trying backup");
                quarantine(path);
            }
        }

        match read_snapshot(backup_path) {
            Ok(Some(snapshot)) => {
                tracing::warn!(
                    path = %backup_path.display(),
                    "restored pattern cache from backup"
                );
                let store = Self::from_snapshot(snapshot, path, backup_path, LoadSource::Backup);
                store.dirty.store(true, Ordering::Release);
                store
            }
            Ok(None) => {
                tracing::info!("starting with an empty pattern cache");
                Self::new(path, backup_path)
            }
            Err(e) => {
                tracing::error!(error = %e, "pattern cache backup unusable, starting empty");
                Self::new(path, backup_path)
            }
        }
    }

    /// Build a store from a snapshot, repairing what can be repaired
    pub fn from_snapshot(
        snapshot: CacheSnapshot,
        path: impl Into<PathBuf>,
        backup_path: impl Into<PathBuf>,
        source: LoadSource,
    ) -> Self {
        let CacheSnapshot {
            biomarker_patterns,
            mut statistics,
            metadata,
        } = snapshot;

        let mut patterns = HashMap::with_capacity(biomarker_patterns.len());
        for (key, mut pattern) in biomarker_patterns {
            match pattern.repair(&key) {
                Some(repairs) => {
                    for repair in repairs {
                        tracing::warn!(pattern = %pattern.name, "{}", repair);
                    }
                    patterns.insert(pattern.name.clone(), pattern);
                }
                None => tracing::warn!(key = %key, "dropping pattern without a usable name"),
            }
        }

        for repair in statistics.repair() {
            tracing::warn!("statistics: {}", repair);
        }

        tracing::info!(
            patterns = patterns.len(),
            source = %source,
            "loaded pattern cache"
        );

        Self {
            patterns: RwLock::new(patterns),
            statistics: Mutex::new(statistics),
            created: metadata.created,
            path: path.into(),
            backup_path: backup_path.into(),
            load_source: source,
            pending_changes: AtomicU64::new(0),
            dirty: AtomicBool::new(false),
            save_lock: Mutex::new(()),
        }
    }

    /// Where the contents came from at load time
    pub fn load_source(&self) -> LoadSource {
        self.load_source
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Pattern by any spelling of its name
    pub fn get(&self, name: &str) -> Option<BiomarkerPattern> {
        self.patterns.read().get(&normalize(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.patterns.read().contains_key(&normalize(name))
    }

    /// Insert or replace a pattern under its canonical name
    pub fn upsert(&self, mut pattern: BiomarkerPattern) -> LabCacheResult<()> {
        let key = normalize(&pattern.name);
        if pattern.repair(&key).is_none() {
            return Err(crate::error::LabCacheError::invalid_input_field(
                "pattern name is empty after normalization",
                "name",
            ));
        }
        self.modify(|patterns| {
            patterns.insert(pattern.name.clone(), pattern);
        });
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Option<BiomarkerPattern> {
        let key = normalize(name);
        let removed = self.patterns.write().remove(&key);
        if removed.is_some() {
            self.mark_changed(1);
        }
        removed
    }

    /// Every pattern, sorted by name
    pub fn all(&self) -> Vec<BiomarkerPattern> {
        let mut patterns: Vec<_> = self.patterns.read().values().cloned().collect();
        patterns.sort_by(|a, b| a.name.cmp(&b.name));
        patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.read().is_empty()
    }

    /// Run `f` against the patterns under the read lock
    pub fn with_patterns<R>(&self, f: impl FnOnce(&HashMap<String, BiomarkerPattern>) -> R) -> R {
        f(&self.patterns.read())
    }

    /// Atomic read-modify-write over the patterns
    pub fn modify<R>(&self, f: impl FnOnce(&mut HashMap<String, BiomarkerPattern>) -> R) -> R {
        let result = {
            let mut patterns = self.patterns.write();
            f(&mut patterns)
        };
        self.mark_changed(1);
        result
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics.lock().clone()
    }

    pub fn update_statistics<R>(&self, f: impl FnOnce(&mut Statistics) -> R) -> R {
        let result = f(&mut self.statistics.lock());
        self.dirty.store(true, Ordering::Release);
        result
    }

    pub fn reset_statistics(&self) {
        self.update_statistics(Statistics::reset);
        tracing::info!("pattern cache statistics reset");
    }

    /// Consistent copy of patterns and statistics
    pub fn snapshot(&self) -> CacheSnapshot {
        let biomarker_patterns = self
            .patterns
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let statistics = self.statistics();

        CacheSnapshot {
            biomarker_patterns,
            statistics,
            metadata: SnapshotMetadata {
                created: self.created,
                ..Default::default()
            },
        }
    }

    /// Pattern mutations not yet saved
    pub fn pending_changes(&self) -> u64 {
        self.pending_changes.load(Ordering::Acquire)
    }

    /// Whether anything changed since the last save
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Save to the configured path
    pub fn save(&self) -> LabCacheResult<()> {
        let _guard = self.save_lock.lock();
        self.save_locked(&self.path, &self.backup_path)
    }

    /// Save to another path, backing up to its derived `_backup` sibling
    pub fn save_to(&self, path: impl AsRef<Path>) -> LabCacheResult<()> {
        let path = path.as_ref();
        let _guard = self.save_lock.lock();
        self.save_locked(path, &default_backup_path(path))
    }

    /// Save only when something changed
    pub fn flush(&self) -> LabCacheResult<()> {
        if self.is_dirty() {
            self.save()
        } else {
            Ok(())
        }
    }

    fn save_locked(&self, path: &Path, backup_path: &Path) -> LabCacheResult<()> {
        let pending = self.pending_changes();
        self.dirty.store(false, Ordering::Release);

        let mut snapshot = self.snapshot();
        snapshot.metadata.last_saved = Some(Utc::now());

        if let Err(e) = write_snapshot(path, backup_path, &snapshot) {
            self.dirty.store(true, Ordering::Release);
            return Err(e);
        }

        self.pending_changes.fetch_sub(pending, Ordering::AcqRel);
        tracing::debug!(
            path = %path.display(),
            patterns = snapshot.biomarker_patterns.len(),
            saved_changes = pending,
            "pattern cache saved"
        );
        Ok(())
    }

    fn mark_changed(&self, count: u64) {
        self.pending_changes.fetch_add(count, Ordering::AcqRel);
        self.dirty.store(true, Ordering::Release);
    }
}
