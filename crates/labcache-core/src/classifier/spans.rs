//! Miss span computation
//!
//! Works line by line over the original chunk. A line is claimed by the
//! cache when it holds at least one hit, no below-threshold candidate, and
//! nothing outside the hits that looks like another measurement. Lines
//! made only of hit text are claimed as well, and lines without any
//! alphanumeric character are neutral. Every maximal run of unclaimed
//! lines, trimmed, becomes one span.

use super::types::{MissSpan, trimmed_span};
use crate::normalizer::{NormalizedText, Token};
use std::ops::Range;

/// Words that may precede a number without it being a separate measurement
const QUALIFIERS: &[&str] = &[
    "ref",
    "reference",
    "range",
    "normal",
    "interval",
    "flag",
    "high",
    "low",
    "hi",
    "lo",
    "abnormal",
    "critical",
    "result",
    "value",
    "units",
    "unit",
    "optimal",
    "desirable",
    "borderline",
    "to",
    "of",
    "up",
];

/// How many tokens after a word a number may appear to count as a measurement
const MEASUREMENT_REACH: usize = 2;

/// A scored candidate as seen by span computation
#[derive(Debug, Clone)]
pub(crate) struct ClaimRegion {
    /// Normalized byte range from the variation start to the end of its measurement
    pub range: Range<usize>,
    pub is_hit: bool,
}

#[derive(Debug, Default)]
struct LineState {
    range: Range<usize>,
    has_content: bool,
    hit_starts: usize,
    blocked: bool,
    tokens: usize,
    covered_tokens: usize,
    residual: Vec<usize>,
}

/// Spans of `chunk` the cache could not resolve
pub(crate) fn miss_spans(
    chunk: &str,
    normalized: &NormalizedText,
    tokens: &[Token<'_>],
    regions: &[ClaimRegion],
) -> Vec<MissSpan> {
    let mut lines = split_lines(chunk);
    if lines.is_empty() {
        return Vec::new();
    }
    let starts: Vec<usize> = lines.iter().map(|l| l.range.start).collect();
    let line_of = |offset: usize| starts.partition_point(|&s| s <= offset).saturating_sub(1);

    for region in regions {
        if region.range.is_empty() {
            continue;
        }
        let line = &mut lines[line_of(normalized.source_offset(region.range.start))];
        if region.is_hit {
            line.hit_starts += 1;
        } else {
            line.blocked = true;
        }
    }

    for (index, token) in tokens.iter().enumerate() {
        let line = &mut lines[line_of(normalized.source_offset(token.range.start))];
        line.tokens += 1;
        let covered = regions.iter().any(|r| {
            r.is_hit && token.range.start < r.range.end && r.range.start < token.range.end
        });
        if covered {
            line.covered_tokens += 1;
        } else {
            line.residual.push(index);
        }
    }

    let mut spans = Vec::new();
    let mut run: Option<Range<usize>> = None;

    for line in &lines {
        if !line.has_content {
            continue;
        }
        if is_claimed(line, tokens) {
            if let Some(open) = run.take() {
                spans.extend(trimmed_span(chunk, open));
            }
        } else {
            run = Some(match run {
                Some(open) => open.start..line.range.end,
                None => line.range.clone(),
            });
        }
    }
    if let Some(open) = run {
        spans.extend(trimmed_span(chunk, open));
    }

    spans
}

fn is_claimed(line: &LineState, tokens: &[Token<'_>]) -> bool {
    if line.blocked {
        return false;
    }
    if line.tokens > 0 && line.covered_tokens == line.tokens {
        return true;
    }
    line.hit_starts > 0 && !has_unexplained_measurement(&line.residual, tokens)
}

/// A non-qualifier word followed closely by a number
fn has_unexplained_measurement(residual: &[usize], tokens: &[Token<'_>]) -> bool {
    residual.iter().enumerate().any(|(pos, &index)| {
        is_label_word(tokens[index].text)
            && residual[pos + 1..]
                .iter()
                .take(MEASUREMENT_REACH)
                .any(|&next| tokens[next].is_numeric())
    })
}

fn is_label_word(text: &str) -> bool {
    text.chars().filter(|c| c.is_alphabetic()).count() >= 2
        && text.chars().all(|c| c.is_alphanumeric() || c == '-')
        && text.chars().next().is_some_and(char::is_alphabetic)
        && !QUALIFIERS.contains(&text)
}

fn split_lines(chunk: &str) -> Vec<LineState> {
    let mut lines = Vec::new();
    let mut start = 0;
    for piece in chunk.split_inclusive('\n') {
        let end = start + piece.len();
        let content_end = end - piece.len() + piece.trim_end_matches(['\n', '\r']).len();
        lines.push(LineState {
            range: start..content_end,
            has_content: piece.chars().any(char::is_alphanumeric),
            ..Default::default()
        });
        start = end;
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{normalize_with_offsets, tokenize};

    fn region(text: &str, needle: &str, is_hit: bool) -> ClaimRegion {
        let start = text.find(needle).unwrap();
        ClaimRegion {
            range: start..start + needle.len(),
            is_hit,
        }
    }

    #[test]
    fn test_no_regions_whole_chunk() {
        let chunk = "  Glucose 95 mg/dL\nLDL 130 mg/dL  ";
        let normalized = normalize_with_offsets(chunk);
        let tokens = tokenize(normalized.as_str());
        let spans = miss_spans(chunk, &normalized, &tokens, &[]);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, chunk.trim());
    }

    #[test]
    fn test_claimed_line_splits_runs() {
        let chunk = "Ferritin 80 ng/mL\nGlucose 95 mg/dL (Ref: 70-99)\nTSH 2.1 mIU/L";
        let normalized = normalize_with_offsets(chunk);
        let text = normalized.as_str();
        let tokens = tokenize(text);
        let regions = vec![region(text, "glucose 95 mg/dl", true)];

        let spans = miss_spans(chunk, &normalized, &tokens, &regions);
        let texts: Vec<_> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Ferritin 80 ng/mL", "TSH 2.1 mIU/L"]);
        for span in &spans {
            assert_eq!(&chunk[span.start..span.end], span.text);
        }
    }

    #[test]
    fn test_second_measurement_on_hit_line_unclaims_it() {
        let chunk = "Glucose 95 mg/dL Ferritin 80 ng/mL";
        let normalized = normalize_with_offsets(chunk);
        let text = normalized.as_str();
        let tokens = tokenize(text);
        let regions = vec![region(text, "glucose 95 mg/dl", true)];

        let spans = miss_spans(chunk, &normalized, &tokens, &regions);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, chunk);
    }

    #[test]
    fn test_non_hit_candidate_blocks_line() {
        let chunk = "Glucose 95 mg/dL LDL 900 mg/dL";
        let normalized = normalize_with_offsets(chunk);
        let text = normalized.as_str();
        let tokens = tokenize(text);
        let regions = vec![
            region(text, "glucose 95 mg/dl", true),
            region(text, "ldl 900 mg/dl", false),
        ];
        assert_eq!(miss_spans(chunk, &normalized, &tokens, &regions).len(), 1);
    }

    #[test]
    fn test_neutral_lines_do_not_break_runs() {
        let chunk = "Ferritin 80 ng/mL\n-----\nTSH 2.1 mIU/L\nGlucose 95 mg/dL";
        let normalized = normalize_with_offsets(chunk);
        let text = normalized.as_str();
        let tokens = tokenize(text);
        let regions = vec![region(text, "glucose 95 mg/dl", true)];

        let spans = miss_spans(chunk, &normalized, &tokens, &regions);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Ferritin 80 ng/mL\n-----\nTSH 2.1 mIU/L");
    }

    #[test]
    fn test_fully_resolved() {
        let chunk = "Glucose 95 mg/dL (Ref: 70-99) H";
        let normalized = normalize_with_offsets(chunk);
        let text = normalized.as_str();
        let tokens = tokenize(text);
        let regions = vec![region(text, "glucose 95 mg/dl", true)];
        assert!(miss_spans(chunk, &normalized, &tokens, &regions).is_empty());
    }

    #[test]
    fn test_blank_chunk() {
        let chunk = " \n \n";
        let normalized = normalize_with_offsets(chunk);
        assert!(miss_spans(chunk, &normalized, &[], &[]).is_empty());
    }

    #[test]
    fn test_label_words() {
        assert!(is_label_word("ferritin"));
        assert!(is_label_word("ldl-c"));
        assert!(!is_label_word("ref"));
        assert!(!is_label_word("h"));
        assert!(!is_label_word("mg/dl"));
        assert!(!is_label_word("70-99"));
    }
}
