//! Variation occurrences and the measurements that follow them

use crate::normalizer::{Token, normalize, split_value_unit};
use crate::store::BiomarkerPattern;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::ops::Range;

/// A variation found in normalized text
#[derive(Debug, Clone)]
pub(crate) struct Occurrence<'p> {
    pub pattern: &'p BiomarkerPattern,
    pub variation: &'p str,
    pub range: Range<usize>,
}

/// Value and unit read after an occurrence
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Measurement {
    pub value: f64,
    /// Unit token as it appears in normalized text
    pub unit_token: Option<String>,
    /// End of the last token belonging to the measurement
    pub end: usize,
}

/// All token-bounded, non-overlapping variation occurrences in text order.
///
/// Longer matches win over shorter overlapping ones; ties go to the earlier
/// position, then the lexicographically smaller pattern name.
pub(crate) fn find_occurrences<'p>(
    text: &str,
    patterns: &'p HashMap<String, BiomarkerPattern>,
) -> Vec<Occurrence<'p>> {
    let mut found = Vec::new();
    for pattern in patterns.values() {
        for variation in &pattern.pattern_variations {
            if variation.is_empty() {
                continue;
            }
            for range in find_bounded(text, variation) {
                found.push(Occurrence {
                    pattern,
                    variation: variation.as_str(),
                    range,
                });
            }
        }
    }

    found.sort_by(|a, b| {
        (Reverse(a.range.len()), a.range.start, &a.pattern.name, a.variation).cmp(&(
            Reverse(b.range.len()),
            b.range.start,
            &b.pattern.name,
            b.variation,
        ))
    });

    let mut accepted: Vec<Occurrence<'p>> = Vec::new();
    for occurrence in found {
        let overlaps = accepted.iter().any(|a| {
            occurrence.range.start < a.range.end && a.range.start < occurrence.range.end
        });
        if !overlaps {
            accepted.push(occurrence);
        }
    }

    accepted.sort_by_key(|o| o.range.start);
    accepted
}

/// Positions of `needle` in `haystack` with no alphanumeric character on either side
pub(crate) fn find_bounded(haystack: &str, needle: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut from = 0;

    while from <= haystack.len() {
        let Some(pos) = haystack[from..].find(needle) else {
            break;
        };
        let start = from + pos;
        let end = start + needle.len();

        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            ranges.push(start..end);
        }

        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }

    ranges
}

/// First value within `window` tokens after `after`, not reaching `limit`.
///
/// A bare number takes the following token as its unit; a token like
/// `95mg/dl` carries both.
pub(crate) fn find_measurement(
    tokens: &[Token<'_>],
    after: usize,
    limit: usize,
    window: usize,
) -> Option<Measurement> {
    let first = tokens.iter().position(|t| t.range.start >= after)?;
    let candidates = tokens[first..]
        .iter()
        .enumerate()
        .take(window)
        .take_while(|(_, t)| t.range.start < limit);

    for (offset, token) in candidates {
        if let Some(value) = token.number() {
            let unit = tokens
                .get(first + offset + 1)
                .filter(|next| next.range.start < limit && !next.is_numeric());
            return Some(Measurement {
                value,
                unit_token: unit.map(|u| u.text.to_string()),
                end: unit.map_or(token.range.end, |u| u.range.end),
            });
        }
        if let Some((value, unit)) = split_value_unit(token.text) {
            return Some(Measurement {
                value,
                unit_token: Some(unit.to_string()),
                end: token.range.end,
            });
        }
    }

    None
}

/// The pattern's own spelling of `unit_token`, if it knows the unit
pub(crate) fn match_unit<'p>(pattern: &'p BiomarkerPattern, unit_token: &str) -> Option<&'p str> {
    let wanted = normalize(unit_token);
    if wanted.is_empty() {
        return None;
    }
    pattern
        .common_units
        .iter()
        .find(|u| normalize(u) == wanted)
        .map(String::as_str)
}
