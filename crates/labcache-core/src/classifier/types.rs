//! Classification result types

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A biomarker resolved from the cache without the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerHit {
    /// Canonical pattern key
    pub name: String,
    /// Pattern display name
    pub display_name: String,
    pub value: f64,
    /// Unit as spelled in the pattern's `common_units`
    pub unit: String,
    pub confidence: f64,
}

/// A contiguous piece of the chunk that still needs the LLM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissSpan {
    pub text: String,
    /// Byte offset of `text` in the chunk
    pub start: usize,
    /// Byte offset one past the end of `text` in the chunk
    pub end: usize,
}

/// How a value compares with the pattern's typical range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeCheck {
    InRange,
    /// Outside, but within one range width
    NearRange,
    /// Far outside the range
    OutOfRange,
    /// No value, no unit or no range for the unit
    Unknown,
}

/// One accepted variation occurrence and how it scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// Canonical pattern key
    pub pattern: String,
    /// The variation that matched
    pub variation: String,
    /// Byte range of the matched variation in the chunk
    pub source_range: Range<usize>,
    pub value: Option<f64>,
    /// Matched unit, as spelled in the pattern
    pub unit: Option<String>,
    pub range_check: RangeCheck,
    pub confidence: f64,
    /// The pattern's threshold at classification time
    pub threshold: f64,
    pub is_hit: bool,
}

/// Result of classifying one chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Hits in text order
    pub hits: Vec<BiomarkerHit>,
    /// Unresolved spans in text order, non-overlapping
    pub miss_spans: Vec<MissSpan>,
    /// Every accepted candidate, hit or not
    pub candidates: Vec<MatchCandidate>,
    /// Resolved chunk picked for LLM verification
    #[serde(default)]
    pub verify: bool,
}

impl Classification {
    /// Everything in the chunk went to the LLM: no hits, one span for the trimmed chunk
    pub fn pass_through(chunk: &str) -> Self {
        let mut classification = Self::default();
        if let Some(span) = trimmed_span(chunk, 0..chunk.len()) {
            classification.miss_spans.push(span);
        }
        classification
    }

    /// At least one hit and nothing left for the LLM
    pub fn is_resolved(&self) -> bool {
        !self.hits.is_empty() && self.miss_spans.is_empty()
    }

    /// Mean confidence of accepted candidates, 0 when there are none
    pub fn mean_confidence(&self) -> f64 {
        if self.candidates.is_empty() {
            return 0.0;
        }
        self.candidates.iter().map(|c| c.confidence).sum::<f64>() / self.candidates.len() as f64
    }
}

/// `chunk[range]` without surrounding whitespace, `None` when nothing is left
pub(crate) fn trimmed_span(chunk: &str, range: Range<usize>) -> Option<MissSpan> {
    let raw = &chunk[range.clone()];
    let leading = raw.len() - raw.trim_start().len();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let start = range.start + leading;
    Some(MissSpan {
        text: trimmed.to_string(),
        start,
        end: start + trimmed.len(),
    })
}
