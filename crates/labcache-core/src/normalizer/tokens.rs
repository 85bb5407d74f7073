//! Tokens and numeric values in normalized text

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// A plain number, optionally prefixed by a comparison (`<0.5`, `>=60`)
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[<>≤≥]=?)?(\d+(?:[.,]\d+)?|\.\d+)$").unwrap());

/// Thousands grouping such as `1,200` or `250,000`
static GROUPED_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[<>≤≥]=?)?(\d{1,3}(?:,\d{3})+)$").unwrap());

/// A value glued to its unit, such as `95mg/dl` or `5.4%`
static VALUE_WITH_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:[<>≤≥]=?)?(?:\d+(?:[.,]\d+)?|\.\d+))([a-z%][a-z0-9%/.^*²³]*)$").unwrap()
});

/// Characters that separate tokens besides whitespace
const SEPARATORS: &[char] = &['=', ':', ';', '(', ')', '[', ']', '{', '}', '|'];

/// Characters trimmed from the end of a token
const TRAILING: &[char] = &[',', '.', '"', '\'', '*'];

/// A token of normalized text with its byte range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub range: Range<usize>,
}

impl Token<'_> {
    /// The token parsed as a number, if it is one
    pub fn number(&self) -> Option<f64> {
        parse_number(self.text)
    }

    /// Whether the token is a number or a value with a glued unit
    pub fn is_numeric(&self) -> bool {
        self.number().is_some() || split_value_unit(self.text).is_some()
    }
}

/// Split normalized text into tokens.
///
/// Splits on whitespace and on `= : ; ( ) [ ] { } |`, then trims trailing
/// commas, periods, quotes and asterisks. Empty tokens are dropped.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() || SEPARATORS.contains(&ch) {
            if let Some(s) = start.take() {
                push_token(text, s, idx, &mut tokens);
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        push_token(text, s, text.len(), &mut tokens);
    }

    tokens
}

fn push_token<'a>(text: &'a str, start: usize, end: usize, tokens: &mut Vec<Token<'a>>) {
    let raw = &text[start..end];
    let trimmed = raw.trim_end_matches(TRAILING);
    let trimmed = trimmed.trim_start_matches(['"', '\'']);
    if trimmed.is_empty() {
        return;
    }
    let offset = start + (raw.len() - raw.trim_start_matches(['"', '\'']).len());
    tokens.push(Token {
        text: trimmed,
        range: offset..offset + trimmed.len(),
    });
}

/// Parse a numeric token.
///
/// Accepts `95`, `5.4`, `5,4` (decimal comma), `1,200` (grouped thousands),
/// `.5` and comparison prefixes like `<0.5` or `>60`.
pub fn parse_number(token: &str) -> Option<f64> {
    let token = token.trim();

    if let Some(caps) = GROUPED_NUMBER.captures(token) {
        return caps[1].replace(',', "").parse().ok();
    }

    let caps = NUMBER.captures(token)?;
    caps[1].replace(',', ".").parse().ok()
}

/// Split a token like `95mg/dl` into its value and unit
pub fn split_value_unit(token: &str) -> Option<(f64, &str)> {
    let caps = VALUE_WITH_UNIT.captures(token)?;
    let value = parse_number(caps.get(1)?.as_str())?;
    let unit = caps.get(2)?.as_str();
    Some((value, unit))
}
