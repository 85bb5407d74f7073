//! The pattern cache a document pipeline holds
//!
//! [`PatternCache`] ties the store, classifier, learner and statistics
//! together. A pipeline classifies each chunk, sends the miss spans to its
//! LLM, and hands the results back through [`PatternCache::record_llm_result`].
//! [`PatternCache::process_chunk`] and [`PatternCache::process_document`] do
//! that round trip against any [`BiomarkerExtractor`].
//!
//! Saves are batched: after each learning event the store is written once
//! enough changes are pending. Call [`PatternCache::flush`] on shutdown, or
//! keep an [`AutosaveHandle`] running.

pub mod autosave;
mod types;


pub use autosave::AutosaveHandle;
pub use types::{BiomarkerSource, ChunkResult, DocumentResult, ResolvedBiomarker};

use crate::classifier::{BiomarkerHit, ChunkClassifier, Classification};
use crate::config::CacheConfig;
use crate::error::LabCacheResult;
use crate::learner::{LearningReport, MaintenanceReport, PatternLearner};
use crate::llm::{BiomarkerExtractor, ExtractedBiomarker};
use crate::stats::{Statistics, StatisticsTracker};
use crate::store::{PatternStore, SharedPatternStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Shared cache handle
pub type SharedPatternCache = Arc<PatternCache>;

/// Biomarker pattern cache and chunk router
#[derive(Debug)]
pub struct PatternCache {
    config: CacheConfig,
    store: SharedPatternStore,
    classifier: ChunkClassifier,
    learner: PatternLearner,
    tracker: StatisticsTracker,
    /// Fully resolved chunks seen, for verification sampling
    resolved_chunks: AtomicU64,
    /// Learning calls made, for the maintenance cadence
    learning_events: AtomicU64,
    save_in_flight: Arc<AtomicBool>,
}

impl PatternCache {
    /// Open the cache described by `config`.
    ///
    /// A disabled cache never reads or writes its file and routes every chunk
    /// to the LLM.
    pub fn new(config: CacheConfig) -> Self {
        let store = if config.enabled {
            PatternStore::from_config(&config)
        } else {
            tracing::info!("pattern cache disabled, every chunk goes to the LLM");
            PatternStore::new(&config.cache_path, config.resolved_backup_path())
        };
        Self::with_store(config, Arc::new(store))
    }

    /// Wrap an existing store
    pub fn with_store(config: CacheConfig, store: SharedPatternStore) -> Self {
        tracing::debug!(
            path = %store.path().display(),
            patterns = store.len(),
            source = %store.load_source(),
            "pattern cache ready"
        );
        Self {
            classifier: ChunkClassifier::new(store.clone(), &config),
            learner: PatternLearner::new(store.clone(), &config),
            tracker: StatisticsTracker::new(store.clone()),
            store,
            config,
            resolved_chunks: AtomicU64::new(0),
            learning_events: AtomicU64::new(0),
            save_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn store(&self) -> &SharedPatternStore {
        &self.store
    }

    /// Split a chunk into cache hits and spans for the LLM, and count it.
    ///
    /// With verification sampling on, every Nth resolved chunk comes back
    /// with `verify` set: its hits stand, but the caller should still run the
    /// LLM on it and report through [`PatternCache::record_verification`].
    pub fn classify(&self, chunk: &str) -> Classification {
        if !self.config.enabled {
            return Classification::pass_through(chunk);
        }

        let mut classification = self.classifier.classify(chunk);
        let every = self.config.verify_every_n_hits;
        if every > 0 && classification.is_resolved() {
            let seen = self.resolved_chunks.fetch_add(1, Ordering::Relaxed) + 1;
            classification.verify = seen % every == 0;
        }

        let outcome = self.tracker.record_classification(&classification);
        tracing::debug!(
            hits = classification.hits.len(),
            miss_spans = classification.miss_spans.len(),
            cache_hit = outcome.hit,
            verify = classification.verify,
            "classified chunk"
        );
        classification
    }

    /// Classify without counting anything
    pub fn preview(&self, chunk: &str) -> Classification {
        if !self.config.enabled {
            return Classification::pass_through(chunk);
        }
        self.classifier.classify(chunk)
    }

    /// Learn from the LLM's extraction of a miss span
    pub fn record_llm_result(
        &self,
        miss_span: &str,
        extraction: &[ExtractedBiomarker],
    ) -> LearningReport {
        if !self.config.enabled {
            return LearningReport::default();
        }
        let report = self.learner.record_llm_result(miss_span, extraction);
        self.after_learning();
        report
    }

    /// Learn from the LLM's extraction of a chunk picked for verification
    pub fn record_verification(
        &self,
        chunk: &str,
        hits: &[BiomarkerHit],
        extraction: &[ExtractedBiomarker],
    ) -> LearningReport {
        if !self.config.enabled {
            return LearningReport::default();
        }
        let report = self.learner.record_verification(chunk, hits, extraction);
        self.after_learning();
        report
    }

    /// Classify a chunk, extract its misses through `extractor`, and learn.
    ///
    /// Hits come first; LLM biomarkers whose canonical name already has a hit
    /// are dropped. An extractor error stops the chunk, but spans learned
    /// before it stay learned.
    pub async fn process_chunk<E>(&self, chunk: &str, extractor: &E) -> LabCacheResult<ChunkResult>
    where
        E: BiomarkerExtractor + ?Sized,
    {
        let classification = self.classify(chunk);
        let mut learning = LearningReport::default();
        let mut extracted = Vec::new();
        let mut llm_calls = 0;

        if classification.verify {
            let extraction = extractor.extract(chunk).await?;
            llm_calls += 1;
            learning.merge(self.record_verification(chunk, &classification.hits, &extraction));
            extracted.extend(extraction);
        } else {
            for span in &classification.miss_spans {
                let extraction = extractor.extract(&span.text).await?;
                llm_calls += 1;
                learning.merge(self.record_llm_result(&span.text, &extraction));
                extracted.extend(extraction);
            }
        }

        let biomarkers = merge_results(&classification.hits, &extracted);
        tracing::debug!(
            biomarkers = biomarkers.len(),
            llm_calls,
            "processed chunk"
        );

        Ok(ChunkResult {
            biomarkers,
            classification,
            learning,
            llm_calls,
        })
    }

    /// Process chunks in order until done or `cancel` fires.
    ///
    /// Chunks finished before cancellation keep their results and learning.
    pub async fn process_document<E, S>(
        &self,
        chunks: &[S],
        extractor: &E,
        cancel: &CancellationToken,
    ) -> LabCacheResult<DocumentResult>
    where
        E: BiomarkerExtractor + ?Sized,
        S: AsRef<str> + Sync,
    {
        let mut result = DocumentResult::default();

        for chunk in chunks {
            if cancel.is_cancelled() {
                result.cancelled = true;
                break;
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    result.cancelled = true;
                    break;
                }
                chunk_result = self.process_chunk(chunk.as_ref(), extractor) => {
                    result.chunks.push(chunk_result?);
                }
            }
        }

        tracing::info!(
            chunks = result.chunks.len(),
            total_chunks = chunks.len(),
            biomarkers = result.biomarkers().count(),
            llm_calls = result.llm_calls(),
            cancelled = result.cancelled,
            "processed document"
        );
        Ok(result)
    }

    /// Save now if anything changed
    pub fn flush(&self) -> LabCacheResult<()> {
        if !self.config.enabled {
            return Ok(());
        }
        self.store.flush()
    }

    /// Adjust thresholds and prune unreliable patterns
    pub fn run_maintenance(&self) -> MaintenanceReport {
        self.learner.run_maintenance()
    }

    /// What [`PatternCache::run_maintenance`] would do
    pub fn plan_maintenance(&self) -> MaintenanceReport {
        self.learner.plan_maintenance()
    }

    pub fn statistics(&self) -> Statistics {
        self.tracker.snapshot()
    }

    pub fn reset_statistics(&self) {
        self.tracker.reset();
    }

    /// Start flushing the store on the configured interval.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn_autosave(&self, cancel: CancellationToken) -> AutosaveHandle {
        let period = Duration::from_secs(self.config.autosave_interval_secs.max(1));
        autosave::spawn(self.store.clone(), period, cancel)
    }

    fn after_learning(&self) {
        let events = self.learning_events.fetch_add(1, Ordering::Relaxed) + 1;
        let interval = self.config.maintenance_interval_events;
        if interval > 0 && events % interval == 0 {
            self.learner.run_maintenance();
        }
        self.maybe_save();
    }

    /// Save in the background once a batch of changes is pending
    fn maybe_save(&self) {
        let pending = self.store.pending_changes();
        if pending < self.config.save_batch_size.max(1) {
            return;
        }
        if self.save_in_flight.swap(true, Ordering::AcqRel) {
            return;
        }

        let store = self.store.clone();
        let in_flight = self.save_in_flight.clone();
        let save = move || {
            if let Err(e) = store.save() {
                tracing::warn!(error = %e, "batched pattern cache save failed");
            }
            in_flight.store(false, Ordering::Release);
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!(pending, "scheduling batched save");
                handle.spawn_blocking(save);
            }
            Err(_) => save(),
        }
    }
}

/// Hits first, then LLM results for names no hit covers
fn merge_results(hits: &[BiomarkerHit], extracted: &[ExtractedBiomarker]) -> Vec<ResolvedBiomarker> {
    let hit_names: HashSet<&str> = hits.iter().map(|h| h.name.as_str()).collect();
    let mut biomarkers: Vec<ResolvedBiomarker> = hits.iter().map(ResolvedBiomarker::from).collect();

    for item in extracted {
        let name = item.canonical_name();
        if name.is_empty() || hit_names.contains(name.as_str()) {
            continue;
        }
        biomarkers.push(ResolvedBiomarker::from(item));
    }
    biomarkers
}
