//! Statistics bookkeeping for classified chunks

use super::statistics::Statistics;
use crate::classifier::Classification;
use crate::store::SharedPatternStore;

/// How one chunk counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOutcome {
    /// Fully resolved by the cache
    pub hit: bool,
    /// Resolved and not sent to the LLM for verification
    pub llm_call_saved: bool,
}

/// Records classification outcomes into a store's statistics
#[derive(Debug, Clone)]
pub struct StatisticsTracker {
    store: SharedPatternStore,
}

impl StatisticsTracker {
    pub fn new(store: SharedPatternStore) -> Self {
        Self { store }
    }

    /// Count one classified chunk.
    ///
    /// A chunk is a hit when it produced at least one hit and no miss spans.
    /// A hit picked for verification still counts as a hit but saves no call.
    pub fn record_classification(&self, classification: &Classification) -> ChunkOutcome {
        let hit = classification.is_resolved();
        let outcome = ChunkOutcome {
            hit,
            llm_call_saved: hit && !classification.verify,
        };
        let confidence = classification.mean_confidence();

        self.store.update_statistics(|stats| {
            stats.record_chunk(outcome.hit, outcome.llm_call_saved, confidence)
        });

        tracing::debug!(
            hit = outcome.hit,
            llm_call_saved = outcome.llm_call_saved,
            confidence,
            "recorded chunk outcome"
        );
        outcome
    }

    /// Count cache hits the LLM contradicted or left out
    pub fn record_false_positives(&self, count: u64) {
        if count > 0 {
            self.store
                .update_statistics(|stats| stats.record_false_positives(count));
        }
    }

    pub fn snapshot(&self) -> Statistics {
        self.store.statistics()
    }

    pub fn reset(&self) {
        self.store.reset_statistics();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{BiomarkerHit, MissSpan};
    use crate::store::PatternStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn tracker() -> (TempDir, StatisticsTracker) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(PatternStore::new(
            dir.path().join("c.json"),
            dir.path().join("c_backup.json"),
        ));
        (dir, StatisticsTracker::new(store))
    }

    fn hit() -> BiomarkerHit {
        BiomarkerHit {
            name: "glucose".into(),
            display_name: "Glucose".into(),
            value: 95.0,
            unit: "mg/dL".into(),
            confidence: 0.95,
        }
    }

    fn span() -> MissSpan {
        MissSpan {
            text: "Ferritin 80".into(),
            start: 0,
            end: 11,
        }
    }

    #[test]
    fn test_resolved_chunk_saves_a_call() {
        let (_dir, tracker) = tracker();
        let classification = Classification {
            hits: vec![hit()],
            ..Default::default()
        };
        let outcome = tracker.record_classification(&classification);
        assert!(outcome.hit && outcome.llm_call_saved);

        let stats = tracker.snapshot();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.llm_calls_saved, 1);
        assert_eq!(stats.cache_hit_rate, 100.0);
    }

    #[test]
    fn test_partial_chunk_is_a_miss() {
        let (_dir, tracker) = tracker();
        let classification = Classification {
            hits: vec![hit()],
            miss_spans: vec![span()],
            ..Default::default()
        };
        assert!(!tracker.record_classification(&classification).hit);
        assert_eq!(tracker.snapshot().cache_misses, 1);
    }

    #[test]
    fn test_verified_hit_saves_nothing() {
        let (_dir, tracker) = tracker();
        let classification = Classification {
            hits: vec![hit()],
            verify: true,
            ..Default::default()
        };
        let outcome = tracker.record_classification(&classification);
        assert!(outcome.hit && !outcome.llm_call_saved);
        assert_eq!(tracker.snapshot().llm_calls_saved, 0);
    }

    #[test]
    fn test_blank_chunk_counts_as_miss() {
        let (_dir, tracker) = tracker();
        tracker.record_classification(&Classification::default());
        let stats = tracker.snapshot();
        assert_eq!(stats.total_extractions, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.average_confidence, 0.0);
    }

    #[test]
    fn test_false_positives() {
        let (_dir, tracker) = tracker();
        tracker.record_false_positives(0);
        tracker.record_false_positives(2);
        assert_eq!(tracker.snapshot().false_positives, 2);
        tracker.reset();
        assert_eq!(tracker.snapshot().false_positives, 0);
    }
}
