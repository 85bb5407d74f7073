//! Load-time repair of patterns
//!
//! A hand-edited or partially written cache may carry thresholds outside
//! [0, 1], inverted ranges or un-normalized variations. These are fixed in
//! place and reported so the caller can log them; only a pattern without a
//! usable name is dropped.

use super::types::{BiomarkerPattern, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_SUCCESS_RATE};
use crate::normalizer::normalize;

impl BiomarkerPattern {
    /// Repair the pattern in place, keyed by `key`.
    ///
    /// Returns the repairs made, or `None` when neither the key nor the
    /// name normalizes to anything.
    pub fn repair(&mut self, key: &str) -> Option<Vec<String>> {
        let mut repairs = Vec::new();

        let canonical = {
            let from_key = normalize(key);
            if from_key.is_empty() {
                normalize(&self.name)
            } else {
                from_key
            }
        };
        if canonical.is_empty() {
            return None;
        }
        if self.name != canonical {
            repairs.push(format!("name '{}' replaced by key '{}'", self.name, canonical));
            self.name = canonical;
        }

        if self.standardized_name.trim().is_empty() {
            self.standardized_name = self.name.clone();
            repairs.push("empty standardized_name set from name".to_string());
        }

        if let Some(repair) = clamp_unit(
            &mut self.confidence_threshold,
            DEFAULT_CONFIDENCE_THRESHOLD,
            "confidence_threshold",
        ) {
            repairs.push(repair);
        }
        if let Some(repair) =
            clamp_unit(&mut self.success_rate, DEFAULT_SUCCESS_RATE, "success_rate")
        {
            repairs.push(repair);
        }

        let mut variations: Vec<String> = Vec::with_capacity(self.pattern_variations.len());
        for variation in &self.pattern_variations {
            let normalized = normalize(variation);
            if normalized.is_empty() || variations.contains(&normalized) {
                continue;
            }
            variations.push(normalized);
        }
        if variations.is_empty() {
            variations.push(self.name.clone());
            repairs.push("no usable variations, seeded with name".to_string());
        }
        if variations != self.pattern_variations {
            if !repairs.iter().any(|r| r.starts_with("no usable variations")) {
                repairs.push("variations normalized".to_string());
            }
            self.pattern_variations = variations;
        }

        let before = self.common_units.len();
        let mut units: Vec<String> = Vec::with_capacity(before);
        for unit in &self.common_units {
            let unit = unit.trim();
            if !unit.is_empty() && !units.iter().any(|u| u == unit) {
                units.push(unit.to_string());
            }
        }
        if units.len() != before {
            repairs.push("empty or duplicate units removed".to_string());
        }
        self.common_units = units;

        let mut invalid = Vec::new();
        for (unit, range) in self.typical_ranges.iter_mut() {
            if !range.low.is_finite() || !range.high.is_finite() {
                invalid.push(unit.clone());
                continue;
            }
            if range.low > range.high {
                std::mem::swap(&mut range.low, &mut range.high);
                repairs.push(format!("inverted range for '{}' swapped", unit));
            }
        }
        for unit in invalid {
            self.typical_ranges.remove(&unit);
            repairs.push(format!("non-finite range for '{}' removed", unit));
        }

        let missing: Vec<String> = self
            .typical_ranges
            .keys()
            .filter(|unit| !self.common_units.contains(*unit))
            .cloned()
            .collect();
        for unit in missing {
            repairs.push(format!("range unit '{}' added to common_units", unit));
            self.common_units.push(unit);
        }

        Some(repairs)
    }
}

fn clamp_unit(value: &mut f64, fallback: f64, field: &str) -> Option<String> {
    if !value.is_finite() {
        let repair = format!("{} was not a number, reset to {}", field, fallback);
        *value = fallback;
        return Some(repair);
    }
    if !(0.0..=1.0).contains(&*value) {
        let clamped = value.clamp(0.0, 1.0);
        let repair = format!("{} {} clamped to {}", field, value, clamped);
        *value = clamped;
        return Some(repair);
    }
    None
}
