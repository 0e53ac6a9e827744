//! Amount normalization for tax form values.

use serde_json::Value;

/// Normalize a provider value of unknown shape to a number.
///
/// Numbers pass through unchanged. Strings have currency symbols, thousands
/// separators and whitespace stripped before parsing. Anything else, and any
/// string that still fails to parse, normalizes to zero.
pub fn normalize_amount(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        Some(Value::String(s)) => parse_amount_str(s),
        _ => 0.0,
    }
}

/// Parse a currency-formatted string such as `"$1,234.56"`. Unparsable input yields zero.
pub fn parse_amount_str(s: &str) -> f64 {
    parse_amount(s).unwrap_or(0.0)
}

/// Parse a currency-formatted string, returning `None` unless it is a finite number.
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned = strip_amount(s);
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse a currency-formatted string, returning `None` unless it is a positive number.
///
/// Used by text recovery, where a zero capture is treated as no match.
pub fn parse_positive_amount(s: &str) -> Option<f64> {
    parse_amount(s).filter(|n| *n > 0.0)
}

fn strip_amount(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && !is_currency_symbol(*c))
        .collect()
}

fn is_currency_symbol(c: char) -> bool {
    matches!(c, '$' | '€' | '£' | '¥' | '¢')
}
