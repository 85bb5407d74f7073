//! Match confidence

use super::types::RangeCheck;
use crate::config::ScoringWeights;

/// Evidence gathered for one occurrence
#[derive(Debug, Clone, Copy)]
pub(crate) struct Evidence {
    /// Length of the matched variation in characters
    pub variation_chars: usize,
    pub value_found: bool,
    pub unit_matched: bool,
    pub range: RangeCheck,
}

impl Evidence {
    /// Whether the evidence is complete enough to resolve without the LLM
    pub fn is_complete(&self) -> bool {
        self.value_found && self.unit_matched && self.range != RangeCheck::OutOfRange
    }
}

/// Confidence in [0, 1] for a match of a pattern with `success_rate` and `threshold`.
///
/// Incomplete evidence (no value, no matching unit, or a value far outside
/// the typical range) is capped `out_of_range_margin` below the threshold.
pub(crate) fn score(
    weights: &ScoringWeights,
    evidence: &Evidence,
    success_rate: f64,
    threshold: f64,
) -> f64 {
    let extra_chars = evidence.variation_chars.saturating_sub(2) as f64;
    let specificity = (weights.specificity_base + weights.specificity_per_char * extra_chars)
        .clamp(weights.specificity_base, weights.specificity_max);

    let mut total = specificity;
    if evidence.value_found {
        total += weights.value_found;
    }
    if evidence.unit_matched {
        total += weights.unit_match;
    }
    match evidence.range {
        RangeCheck::InRange => total += weights.in_range,
        RangeCheck::NearRange => total += weights.near_range,
        RangeCheck::OutOfRange | RangeCheck::Unknown => {}
    }

    let floor = weights.reliability_floor.clamp(0.0, 1.0);
    let reliability = floor + (1.0 - floor) * success_rate.clamp(0.0, 1.0);
    let mut confidence = (total * reliability).clamp(0.0, 1.0);

    if !evidence.is_complete() {
        let cap = (threshold - weights.out_of_range_margin).max(0.0);
        confidence = confidence.min(cap);
    }

    confidence
}
