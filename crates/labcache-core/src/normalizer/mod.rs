//! Text normalization shared by stored pattern variations and chunk text
//!
//! Both sides of every comparison go through [`normalize`], so a variation
//! learned from `"Hemoglobin  A1c:"` matches chunk text `"HEMOGLOBIN A1C"`,
//! and `μmol/L`, `µmol / L` and `umol/l` all become `umol/l`.
//!
//! Normalization is deterministic and idempotent.

mod tokens;

pub use tokens::{Token, parse_number, split_value_unit, tokenize};

use std::ops::Range;

/// Characters stripped from the end of normalized text
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':'];

/// Normalize text for matching.
///
/// Lowercases, maps unit symbols to a canonical set, collapses whitespace,
/// removes whitespace around `/` and strips trailing punctuation.
pub fn normalize(text: &str) -> String {
    normalize_with_offsets(text).text
}

/// Normalized text with a byte map back into the source it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    text: String,
    /// Source byte range of the character that produced each output byte
    origins: Vec<(usize, usize)>,
}

impl NormalizedText {
    /// The normalized string
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether nothing survived normalization
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte range in the source text covered by `range` of normalized text
    pub fn source_range(&self, range: Range<usize>) -> Range<usize> {
        if range.start >= range.end || range.end > self.origins.len() {
            return 0..0;
        }
        let start = self.origins[range.start].0;
        let end = self.origins[range.end - 1].1;
        start..end
    }

    /// Source byte offset where the normalized byte at `index` came from
    pub fn source_offset(&self, index: usize) -> usize {
        self.origins.get(index).map(|o| o.0).unwrap_or(0)
    }
}

/// Normalize text and keep the offset map
pub fn normalize_with_offsets(text: &str) -> NormalizedText {
    let mut out = String::with_capacity(text.len());
    let mut origins: Vec<(usize, usize)> = Vec::with_capacity(text.len());
    let mut pending_space: Option<(usize, usize)> = None;

    for (idx, ch) in text.char_indices() {
        let origin = (idx, idx + ch.len_utf8());

        if ch.is_whitespace() {
            if pending_space.is_none() && !out.is_empty() && !out.ends_with('/') {
                pending_space = Some(origin);
            }
            continue;
        }

        for lower in ch.to_lowercase() {
            let canonical = canonical_symbol(lower);
            if canonical == '/' {
                pending_space = None;
            }
            if let Some(space_origin) = pending_space.take() {
                push_char(&mut out, &mut origins, ' ', space_origin);
            }
            push_char(&mut out, &mut origins, canonical, origin);
        }
    }

    while let Some(last) = out.chars().next_back() {
        if last == ' ' || TRAILING_PUNCTUATION.contains(&last) {
            out.pop();
            origins.truncate(out.len());
        } else {
            break;
        }
    }

    NormalizedText { text: out, origins }
}

fn push_char(out: &mut String, origins: &mut Vec<(usize, usize)>, ch: char, origin: (usize, usize)) {
    out.push(ch);
    for _ in 0..ch.len_utf8() {
        origins.push(origin);
    }
}

/// Map look-alike symbols onto the canonical token set
fn canonical_symbol(ch: char) -> char {
    match ch {
        // greek small mu, micro sign
        '\u{03BC}' | '\u{00B5}' => 'u',
        // hyphen, non-breaking hyphen, figure dash, en dash, em dash, minus
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}'
        | '\u{FE63}' | '\u{FF0D}' => '-',
        '\u{00D7}' => 'x',
        // fraction slash, division slash, fullwidth solidus
        '\u{2044}' | '\u{2215}' | '\u{FF0F}' => '/',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_whitespace() {
        assert_eq!(normalize("  Glucose   Fasting\t\n 95 "), "glucose fasting 95");
    }

    #[test]
    fn test_micro_sign_variants() {
        assert_eq!(normalize("μmol/L"), "umol/l");
        assert_eq!(normalize("µmol/L"), "umol/l");
        assert_eq!(normalize("ΜMOL/L"), "umol/l");
        assert_eq!(normalize("umol/L"), "umol/l");
    }

    #[test]
    fn test_slash_spacing() {
        assert_eq!(normalize("mg / dL"), "mg/dl");
        assert_eq!(normalize("x10^9 /L"), "x10^9/l");
        assert_eq!(normalize("mL/min/ 1.73m²"), "ml/min/1.73m²");
    }

    #[test]
    fn test_trailing_punctuation() {
        assert_eq!(normalize("Hemoglobin A1c:"), "hemoglobin a1c");
        assert_eq!(normalize("LDL . ,"), "ldl");
        assert_eq!(normalize("(Ref: 70-99)"), "(ref: 70-99)");
    }

    #[test]
    fn test_dash_variants() {
        assert_eq!(normalize("70\u{2013}99"), "70-99");
        assert_eq!(normalize("LDL\u{2014}C"), "ldl-c");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Glucose 95 mg/dL (Ref: 70-99)",
            "  HbA1c  5.4 % ;",
            "Vitamin D, 25-OH : 32 ng / mL.",
            "µmol / L",
            "İstanbul Ünit",
            "a / / b",
            ".,;:",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_offsets_map_back_to_source() {
        let source = "  Glucose   95 MG / dL";
        let normalized = normalize_with_offsets(source);
        assert_eq!(normalized.as_str(), "glucose 95 mg/dl");

        let start = normalized.as_str().find("mg/dl").unwrap();
        let range = normalized.source_range(start..start + "mg/dl".len());
        assert_eq!(&source[range], "MG / dL");

        let range = normalized.source_range(0..7);
        assert_eq!(&source[range], "Glucose");
    }

    #[test]
    fn test_offsets_with_multibyte_input() {
        let source = "B12 µmol";
        let normalized = normalize_with_offsets(source);
        assert_eq!(normalized.as_str(), "b12 umol");
        let range = normalized.source_range(4..8);
        assert_eq!(&source[range], "µmol");
    }

    #[test]
    fn test_empty_input() {
        let normalized = normalize_with_offsets(" \n\t ");
        assert!(normalized.is_empty());
        assert_eq!(normalized.source_range(0..0), 0..0);
    }
}
