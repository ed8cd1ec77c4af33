//! Locale-aware numeric normalization
//!
//! Converts scraped display text ("1.948,50 €", "3,120 % p.a.", "25 Jahre") into
//! canonical numbers. All functions are pure and idempotent: feeding an already
//! canonical numeric string back in yields the same value.

use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder the calculator shows for unavailable values
pub const SENTINEL: &str = "-";

static CURRENCY_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)€|\bEUR\b|\bEuro\b").expect("currency marker pattern is valid")
});

static DOT_GROUPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?\d{1,3}(\.\d{3})+$").expect("dot grouping pattern is valid")
});

static LEADING_INT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("leading integer pattern is valid"));

/// Kind of display text a field carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Percent,
    Currency,
    DurationMonths,
}

/// True for the values that mean "nothing here": `"-"` and empty text
pub fn is_sentinel(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed == SENTINEL
}

/// Normalize optional display text of the given kind
pub fn normalize(kind: NumericKind, text: Option<&str>) -> Option<f64> {
    let text = text?;
    match kind {
        NumericKind::Percent => parse_percent(text),
        NumericKind::Currency => parse_currency(text),
        NumericKind::DurationMonths => parse_duration_months(text).map(|m| m as f64),
    }
}

/// Parse a percentage such as `"3,120 % p.a."` into `3.12`
pub fn parse_percent(text: &str) -> Option<f64> {
    if is_sentinel(text) {
        return None;
    }

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let head = match compact.find('%') {
        Some(idx) => &compact[..idx],
        None => compact.as_str(),
    };

    parse_decimal(&numeric_prefix(head).replace(',', "."))
}

/// Parse a currency amount such as `"1.948,50 €"` into `1948.5`
pub fn parse_currency(text: &str) -> Option<f64> {
    if is_sentinel(text) {
        return None;
    }

    let marked = CURRENCY_MARKER.is_match(text);
    let stripped = CURRENCY_MARKER.replace_all(text, "");
    let compact: String = stripped.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = numeric_prefix(&compact);
    // whole-euro notation "500.000,-"
    let compact = compact
        .strip_suffix(",-")
        .or_else(|| compact.strip_suffix(".-"))
        .unwrap_or(compact);

    let has_dot = compact.contains('.');
    let has_comma = compact.contains(',');

    let canonical = if has_dot && has_comma {
        compact.replace('.', "").replace(',', ".")
    } else if has_comma {
        compact.replace(',', ".")
    } else if marked && DOT_GROUPED.is_match(compact) {
        // "€ 1.948" is thousands grouping; an unmarked "1.948" stays a decimal
        compact.replace('.', "")
    } else {
        compact.to_string()
    };

    parse_decimal(&canonical)
}

/// Parse a duration into months: `"25 Jahre"` -> 300, `"18 Monate"` -> 18, `"300"` -> 300
pub fn parse_duration_months(text: &str) -> Option<i64> {
    if is_sentinel(text) {
        return None;
    }

    let lower = text.to_lowercase();
    if lower.contains("jahr") || lower.contains("year") {
        return leading_integer(&lower).map(|years| years * 12);
    }
    if lower.contains("monat") || lower.contains("month") {
        return leading_integer(&lower);
    }

    let bare = lower.trim();
    if let Ok(months) = bare.parse::<i64>() {
        return Some(months);
    }
    match bare.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 => Some(value as i64),
        _ => None,
    }
}

/// First bound of a range such as `"1.000 € - 50.000 €"`; non-range text is returned as is
pub fn first_of_range(text: &str) -> &str {
    if is_sentinel(text) {
        return text;
    }

    for separator in [" - ", " – ", " bis "] {
        if let Some(idx) = text.find(separator) {
            return text[..idx].trim();
        }
    }
    text.trim()
}

/// Normalize the first bound of a range field
pub fn parse_range_start(kind: NumericKind, text: &str) -> Option<f64> {
    normalize(kind, Some(first_of_range(text)))
}

fn leading_integer(text: &str) -> Option<i64> {
    LEADING_INT
        .find(text)
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Longest prefix made of sign, digits and separators
fn numeric_prefix(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, '.' | ',' | '+' | '-')))
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    &text[..end]
}

fn parse_decimal(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}
