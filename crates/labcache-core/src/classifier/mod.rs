//! Chunk classification against the pattern store
//!
//! [`ChunkClassifier::classify`] finds every learned variation in a chunk,
//! reads the value and unit that follow it, scores the match, and splits the
//! chunk into cache hits and spans that still need the LLM.
//!
//! Classification reads the store but never changes it.

mod matcher;
mod scoring;
mod spans;
mod types;

#[cfg(test)]
mod tests;

pub use types::{BiomarkerHit, Classification, MatchCandidate, MissSpan, RangeCheck};

use crate::config::{CacheConfig, ScoringWeights};
use crate::normalizer::{normalize, normalize_with_offsets, tokenize};
use crate::store::{BiomarkerPattern, SharedPatternStore};
use matcher::{find_measurement, find_occurrences, match_unit};
use scoring::{Evidence, score};
use spans::{ClaimRegion, miss_spans};
use std::collections::HashMap;

/// Classifies chunks with the patterns currently in a store
#[derive(Debug, Clone)]
pub struct ChunkClassifier {
    store: SharedPatternStore,
    weights: ScoringWeights,
    proximity_window: usize,
}

impl ChunkClassifier {
    pub fn new(store: SharedPatternStore, config: &CacheConfig) -> Self {
        Self {
            store,
            weights: config.scoring.clone(),
            proximity_window: config.proximity_window.max(1),
        }
    }

    /// Classify `chunk` against a consistent view of the store
    pub fn classify(&self, chunk: &str) -> Classification {
        self.store
            .with_patterns(|patterns| self.classify_with(patterns, chunk))
    }

    /// Classify `chunk` against an explicit pattern map
    pub fn classify_with(
        &self,
        patterns: &HashMap<String, BiomarkerPattern>,
        chunk: &str,
    ) -> Classification {
        let normalized = normalize_with_offsets(chunk);
        if normalized.is_empty() {
            return Classification::default();
        }
        let text = normalized.as_str();
        let tokens = tokenize(text);
        let occurrences = find_occurrences(text, patterns);

        let mut classification = Classification::default();
        let mut regions = Vec::with_capacity(occurrences.len());

        for (index, occurrence) in occurrences.iter().enumerate() {
            let pattern = occurrence.pattern;
            let limit = occurrences
                .get(index + 1)
                .map_or(text.len(), |next| next.range.start);
            let measurement = find_measurement(
                &tokens,
                occurrence.range.end,
                limit,
                self.proximity_window,
            );

            let value = measurement.as_ref().map(|m| m.value);
            let unit = measurement
                .as_ref()
                .and_then(|m| m.unit_token.as_deref())
                .and_then(|token| match_unit(pattern, token));
            let range = range_check(pattern, value, unit);

            let evidence = Evidence {
                variation_chars: occurrence.variation.chars().count(),
                value_found: value.is_some(),
                unit_matched: unit.is_some(),
                range,
            };
            let threshold = pattern.confidence_threshold;
            let confidence = score(&self.weights, &evidence, pattern.success_rate, threshold);
            let is_hit = evidence.is_complete() && confidence >= threshold;

            tracing::trace!(
                pattern = %pattern.name,
                variation = occurrence.variation,
                ?value,
                ?unit,
                ?range,
                confidence,
                threshold,
                is_hit,
                "scored candidate"
            );

            let claimed_end = measurement
                .as_ref()
                .map_or(occurrence.range.end, |m| m.end.max(occurrence.range.end));
            regions.push(ClaimRegion {
                range: occurrence.range.start..claimed_end,
                is_hit,
            });

            if let (true, Some(value), Some(unit)) = (is_hit, value, unit) {
                classification.hits.push(BiomarkerHit {
                    name: pattern.name.clone(),
                    display_name: pattern.standardized_name.clone(),
                    value,
                    unit: unit.to_string(),
                    confidence,
                });
            }

            classification.candidates.push(MatchCandidate {
                pattern: pattern.name.clone(),
                variation: occurrence.variation.to_string(),
                source_range: normalized.source_range(occurrence.range.clone()),
                value,
                unit: unit.map(str::to_string),
                range_check: range,
                confidence,
                threshold,
                is_hit,
            });
        }

        classification.miss_spans = miss_spans(chunk, &normalized, &tokens, &regions);

        tracing::debug!(
            candidates = classification.candidates.len(),
            hits = classification.hits.len(),
            miss_spans = classification.miss_spans.len(),
            "classified chunk"
        );
        classification
    }
}

fn range_check(pattern: &BiomarkerPattern, value: Option<f64>, unit: Option<&str>) -> RangeCheck {
    let (Some(value), Some(unit)) = (value, unit) else {
        return RangeCheck::Unknown;
    };
    let range = pattern.typical_ranges.get(unit).or_else(|| {
        let wanted = normalize(unit);
        pattern
            .typical_ranges
            .iter()
            .find(|(key, _)| normalize(key) == wanted)
            .map(|(_, range)| range)
    });

    match range {
        Some(range) if range.contains(value) => RangeCheck::InRange,
        Some(range) if range.is_near(value) => RangeCheck::NearRange,
        Some(_) => RangeCheck::OutOfRange,
        None => RangeCheck::Unknown,
    }
}
