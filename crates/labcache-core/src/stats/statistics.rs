//! Aggregate cache statistics persisted with the snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Running counters over classified chunks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    /// Chunks classified
    pub total_extractions: u64,
    /// Chunks fully resolved from the cache
    pub cache_hits: u64,
    /// Chunks that needed the LLM for at least one span
    pub cache_misses: u64,
    /// Hit chunks that were not sent to the LLM
    pub llm_calls_saved: u64,
    /// Cache hits later contradicted or omitted by the LLM
    pub false_positives: u64,
    /// `cache_hits / total_extractions * 100`
    pub cache_hit_rate: f64,
    /// Running mean of per-chunk candidate confidence
    pub average_confidence: f64,
    pub last_updated: DateTime<Utc>,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            total_extractions: 0,
            cache_hits: 0,
            cache_misses: 0,
            llm_calls_saved: 0,
            false_positives: 0,
            cache_hit_rate: 0.0,
            average_confidence: 0.0,
            last_updated: Utc::now(),
        }
    }
}

impl Statistics {
    /// Count one classified chunk
    pub fn record_chunk(&mut self, hit: bool, llm_call_saved: bool, confidence: f64) {
        self.total_extractions += 1;
        if hit {
            self.cache_hits += 1;
            if llm_call_saved {
                self.llm_calls_saved += 1;
            }
        } else {
            self.cache_misses += 1;
        }

        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.average_confidence +=
            (confidence - self.average_confidence) / self.total_extractions as f64;

        self.refresh_hit_rate();
        self.last_updated = Utc::now();
    }

    /// Count hits the LLM contradicted or omitted
    pub fn record_false_positives(&mut self, count: u64) {
        if count == 0 {
            return;
        }
        self.false_positives += count;
        self.last_updated = Utc::now();
    }

    pub fn refresh_hit_rate(&mut self) {
        self.cache_hit_rate = if self.total_extractions == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_extractions as f64 * 100.0
        };
    }

    /// Zero every counter
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Restore the counter relations after loading from disk.
    ///
    /// Returns a description of each repair made.
    pub fn repair(&mut self) -> Vec<String> {
        let mut repairs = Vec::new();

        let classified = self.cache_hits + self.cache_misses;
        if classified != self.total_extractions {
            repairs.push(format!(
                "total_extractions {} does not equal hits + misses {}",
                self.total_extractions, classified
            ));
            self.total_extractions = classified;
        }

        if self.llm_calls_saved > self.cache_hits {
            repairs.push(format!(
                "llm_calls_saved {} exceeds cache_hits {}",
                self.llm_calls_saved, self.cache_hits
            ));
            self.llm_calls_saved = self.cache_hits;
        }

        if !self.average_confidence.is_finite() || !(0.0..=1.0).contains(&self.average_confidence)
        {
            repairs.push(format!(
                "average_confidence {} outside [0, 1]",
                self.average_confidence
            ));
            self.average_confidence = if self.average_confidence.is_finite() {
                self.average_confidence.clamp(0.0, 1.0)
            } else {
                0.0
            };
        }

        self.refresh_hit_rate();
        repairs
    }

    /// `total_extractions - llm_calls_saved`: chunks that reached the LLM
    pub fn llm_calls_made(&self) -> u64 {
        self.total_extractions.saturating_sub(self.llm_calls_saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_chunk_counts() {
        let mut stats = Statistics::default();
        stats.record_chunk(true, true, 0.9);
        stats.record_chunk(false, false, 0.3);
        stats.record_chunk(true, false, 0.95);

        assert_eq!(stats.total_extractions, 3);
        assert_eq!(stats.cache_hits, 2);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.llm_calls_saved, 1);
        assert_eq!(stats.llm_calls_made(), 2);
        assert!((stats.cache_hit_rate - 200.0 / 3.0).abs() < 1e-9);
        assert!((stats.average_confidence - (0.9 + 0.3 + 0.95) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_rate_empty() {
        let mut stats = Statistics::default();
        stats.refresh_hit_rate();
        assert_eq!(stats.cache_hit_rate, 0.0);
    }

    #[test]
    fn test_repair_inconsistent_counters() {
        let mut stats = Statistics {
            total_extractions: 10,
            cache_hits: 3,
            cache_misses: 4,
            llm_calls_saved: 5,
            average_confidence: 4.0,
            ..Default::default()
        };
        let repairs = stats.repair();
        assert_eq!(repairs.len(), 3);
        assert_eq!(stats.total_extractions, 7);
        assert_eq!(stats.llm_calls_saved, 3);
        assert_eq!(stats.average_confidence, 1.0);
        assert!(stats.repair().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut stats = Statistics::default();
        stats.record_chunk(true, true, 1.0);
        stats.record_false_positives(2);
        stats.reset();
        assert_eq!(stats.total_extractions, 0);
        assert_eq!(stats.false_positives, 0);
    }
}
