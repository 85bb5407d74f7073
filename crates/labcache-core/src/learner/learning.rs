//! Learning from LLM results: create, confirm, contradict

use super::core::PatternLearner;
use super::types::LearningReport;
use crate::classifier::{BiomarkerHit, MatchCandidate};
use crate::llm::ExtractedBiomarker;
use crate::normalizer::{normalize, tokenize};
use crate::stats::StatisticsTracker;
use crate::store::{BiomarkerPattern, ValueRange};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Longest label accepted as a new variation
const MAX_VARIATION_CHARS: usize = 64;

/// Relative tolerance for two values to count as the same reading
const VALUE_TOLERANCE: f64 = 0.01;

/// Absolute floor of the value tolerance
const VALUE_TOLERANCE_FLOOR: f64 = 1e-6;

/// What the cache predicted, or emitted, for one pattern
#[derive(Debug, Clone)]
pub(super) struct Prediction {
    pattern: String,
    value: Option<f64>,
    unit: Option<String>,
    is_hit: bool,
}

impl From<&MatchCandidate> for Prediction {
    fn from(candidate: &MatchCandidate) -> Self {
        Self {
            pattern: candidate.pattern.clone(),
            value: candidate.value,
            unit: candidate.unit.clone(),
            is_hit: candidate.is_hit,
        }
    }
}

impl From<&BiomarkerHit> for Prediction {
    fn from(hit: &BiomarkerHit) -> Self {
        Self {
            pattern: hit.name.clone(),
            value: Some(hit.value),
            unit: Some(hit.unit.clone()),
            is_hit: true,
        }
    }
}

impl Prediction {
    fn agrees_with(&self, item: &ExtractedBiomarker) -> bool {
        let Some(value) = self.value else {
            return false;
        };
        values_agree(value, item.value) && units_agree(self.unit.as_deref(), &item.unit)
    }
}

impl PatternLearner {
    /// Learn from the LLM's extraction of a miss span.
    ///
    /// Unknown names become new patterns. For known names the classifier is
    /// re-run on the span to see whether its prediction matched the LLM.
    pub fn record_llm_result(
        &self,
        miss_span: &str,
        extraction: &[ExtractedBiomarker],
    ) -> LearningReport {
        let report = self.store.modify(|patterns| {
            let predictions: Vec<Prediction> = self
                .classifier
                .classify_with(patterns, miss_span)
                .candidates
                .iter()
                .map(Prediction::from)
                .collect();
            self.apply(patterns, &predictions, extraction)
        });
        self.finish(report)
    }

    /// Learn from the LLM's extraction of a chunk the cache fully resolved.
    ///
    /// Every emitted hit the LLM confirms is a confirmation; every hit it
    /// contradicts or leaves out is a false positive.
    pub fn record_verification(
        &self,
        chunk: &str,
        hits: &[BiomarkerHit],
        extraction: &[ExtractedBiomarker],
    ) -> LearningReport {
        let predictions: Vec<Prediction> = hits.iter().map(Prediction::from).collect();
        let report = self
            .store
            .modify(|patterns| self.apply(patterns, &predictions, extraction));
        tracing::debug!(
            chunk_len = chunk.len(),
            hits = hits.len(),
            false_positives = report.false_positives,
            "verified cache hits"
        );
        self.finish(report)
    }

    fn finish(&self, report: LearningReport) -> LearningReport {
        StatisticsTracker::new(self.store.clone()).record_false_positives(report.false_positives);
        if !report.is_empty() {
            tracing::info!(
                created = report.created.len(),
                confirmed = report.confirmed.len(),
                contradicted = report.contradicted.len(),
                omitted = report.omitted.len(),
                skipped = report.skipped,
                "learned from LLM result"
            );
        }
        report
    }

    pub(super) fn apply(
        &self,
        patterns: &mut HashMap<String, BiomarkerPattern>,
        predictions: &[Prediction],
        extraction: &[ExtractedBiomarker],
    ) -> LearningReport {
        let now = Utc::now();
        let mut report = LearningReport::default();
        let mut returned: HashSet<String> = HashSet::new();
        let mut penalized: HashSet<String> = HashSet::new();

        for item in extraction {
            let key = item.canonical_name();
            if !key.is_empty() {
                returned.insert(key.clone());
            }
            if !item.is_learnable(self.settings.min_model_confidence) {
                tracing::debug!(
                    name = %item.name,
                    model_confidence = item.model_confidence,
                    "skipping LLM result"
                );
                report.skipped += 1;
                continue;
            }

            match patterns.get_mut(&key) {
                None => {
                    let pattern = self.new_pattern(&key, item, now);
                    tracing::info!(
                        pattern = %key,
                        variations = ?pattern.pattern_variations,
                        "created pattern"
                    );
                    patterns.insert(key.clone(), pattern);
                    report.created.push(key);
                }
                Some(pattern) => {
                    let relevant: Vec<&Prediction> = predictions
                        .iter()
                        .filter(|p| p.pattern == key && p.value.is_some())
                        .collect();
                    let confirmed =
                        relevant.is_empty() || relevant.iter().any(|p| p.agrees_with(item));

                    self.observe(pattern, item, confirmed, now);

                    if confirmed {
                        report.confirmed.push(key);
                    } else {
                        tracing::debug!(
                            pattern = %key,
                            llm_value = item.value,
                            llm_unit = %item.unit,
                            "LLM disagreed with cache prediction"
                        );
                        if relevant.iter().any(|p| p.is_hit) && penalized.insert(key.clone()) {
                            report.false_positives += 1;
                        }
                        report.contradicted.push(key);
                    }
                }
            }
        }

        for prediction in predictions.iter().filter(|p| p.is_hit) {
            if returned.contains(&prediction.pattern) || penalized.contains(&prediction.pattern) {
                continue;
            }
            if let Some(pattern) = patterns.get_mut(&prediction.pattern) {
                pattern.record_outcome(false, self.settings.ema_alpha);
                penalized.insert(prediction.pattern.clone());
                report.false_positives += 1;
                report.omitted.push(prediction.pattern.clone());
                tracing::debug!(pattern = %prediction.pattern, "cache hit missing from LLM result");
            }
        }

        report
    }

    fn new_pattern(
        &self,
        key: &str,
        item: &ExtractedBiomarker,
        now: DateTime<Utc>,
    ) -> BiomarkerPattern {
        let display = item.name.trim();
        let mut pattern = BiomarkerPattern::new(key)
            .with_standardized_name(if display.is_empty() { key } else { display })
            .with_threshold(self.settings.default_confidence_threshold)
            .with_success_rate(self.settings.initial_success_rate)
            .with_frequency(1);
        pattern.last_seen = now;

        self.merge_measurement(&mut pattern, item);
        if let Some(label) = label_variation(&item.raw_span) {
            pattern.merge_variation(&label);
        }
        pattern
    }

    fn observe(
        &self,
        pattern: &mut BiomarkerPattern,
        item: &ExtractedBiomarker,
        confirmed: bool,
        now: DateTime<Utc>,
    ) {
        pattern.frequency_count += 1;
        pattern.record_outcome(confirmed, self.settings.ema_alpha);
        self.merge_measurement(pattern, item);
        if let Some(label) = label_variation(&item.raw_span) {
            pattern.merge_variation(&label);
        }
        pattern.last_seen = now;
    }

    /// Merge the item's unit and widen that unit's range around its value
    fn merge_measurement(&self, pattern: &mut BiomarkerPattern, item: &ExtractedBiomarker) {
        let unit = item.unit.trim();
        if unit.is_empty() {
            return;
        }
        let wanted = normalize(unit);

        let existing = pattern
            .common_units
            .iter()
            .find(|u| normalize(u) == wanted)
            .cloned();
        let unit = match existing {
            Some(existing) => existing,
            None => {
                pattern.common_units.push(unit.to_string());
                unit.to_string()
            }
        };

        let range_key = pattern
            .typical_ranges
            .keys()
            .find(|k| normalize(k) == wanted)
            .cloned()
            .unwrap_or(unit);

        let margin = self.settings.range_margin;
        pattern
            .typical_ranges
            .entry(range_key)
            .and_modify(|range| range.widen_to_include(item.value, margin))
            .or_insert_with(|| ValueRange::around(item.value, margin));
    }
}

/// Normalized label text of a raw span: everything before the first number
pub(super) fn label_variation(raw_span: &str) -> Option<String> {
    let normalized = normalize(raw_span);
    let end = tokenize(&normalized)
        .iter()
        .find(|t| t.is_numeric())
        .map_or(normalized.len(), |t| t.range.start);

    let label = normalize(normalized[..end].trim_end_matches(['(', '[', '=', '|', '-', ' ']));
    let chars = label.chars().count();
    if chars < 2 || chars > MAX_VARIATION_CHARS || !label.chars().any(char::is_alphabetic) {
        return None;
    }
    Some(label)
}

fn values_agree(a: f64, b: f64) -> bool {
    let tolerance = (VALUE_TOLERANCE * a.abs().max(b.abs())).max(VALUE_TOLERANCE_FLOOR);
    (a - b).abs() <= tolerance
}

fn units_agree(predicted: Option<&str>, reported: &str) -> bool {
    if reported.trim().is_empty() {
        return true;
    }
    predicted.is_none_or(|p| normalize(p) == normalize(reported))
}
