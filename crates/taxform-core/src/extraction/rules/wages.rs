//! W-2 Box 1 wage recovery.

use lazy_static::lazy_static;
use regex::Captures;

use super::amounts::parse_positive_amount;
use super::cascade::{all_matches, first_match, Rule};
use super::patterns::{
    WAGES_NEXT_LINE_LOOSE, WAGES_UNNUMBERED, W2_WAGES_NEXT_LINE, W2_WAGES_SAME_LINE,
};
use super::{ExtractionMatch, FieldExtractor};

lazy_static! {
    /// Box 1 rules, most specific first. A zero or unparsable capture falls through to the next rule.
    pub static ref WAGE_RULES: Vec<Rule<f64>> = vec![
        Rule::anchored("w2_box1_same_line", &W2_WAGES_SAME_LINE, 0.95, positive_amount),
        Rule::anchored("w2_box1_next_line", &W2_WAGES_NEXT_LINE, 0.9, positive_amount),
        Rule::anchored("wages_label_same_line", &WAGES_UNNUMBERED, 0.8, positive_amount),
        Rule::anchored("wages_label_next_line", &WAGES_NEXT_LINE_LOOSE, 0.6, positive_amount),
    ];
}

/// Box 1 wage extractor.
pub struct WageExtractor;

impl WageExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for WageExtractor {
    type Output = ExtractionMatch<f64>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        first_match(&WAGE_RULES, text)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        all_matches(&WAGE_RULES, text)
    }
}

/// Extract Box 1 wages from text.
pub fn extract_wages(text: &str) -> Option<f64> {
    WageExtractor::new().extract(text).map(|m| m.value)
}

/// Positive amount that is not a box label such as `2 Federal income tax withheld`.
fn positive_amount(caps: &Captures<'_>) -> Option<f64> {
    if caps.get(2).is_some() {
        return None;
    }
    parse_positive_amount(caps.get(1)?.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box1_same_line() {
        assert_eq!(extract_wages("1 Wages, tips, other comp. 900.00"), Some(900.0));
    }

    #[test]
    fn test_box1_with_currency_and_thousands() {
        assert_eq!(
            extract_wages("1 Wages, tips, other compensation $52,310.75\n"),
            Some(52310.75)
        );
    }

    #[test]
    fn test_box1_amount_on_next_line() {
        let text = "1 Wages, tips, other comp   2 Federal income tax withheld\n48,000.00   5,100.00\n";
        let matched = WageExtractor::new().extract(text).unwrap();
        assert_eq!(matched.value, 48000.0);
        assert_eq!(matched.rule, "w2_box1_next_line");
    }

    #[test]
    fn test_zero_capture_falls_through() {
        let text = "1 Wages, tips, other comp. 0.00\nWages, tips\n1,250.00\n";
        let matched = WageExtractor::new().extract(text).unwrap();
        assert_eq!(matched.value, 1250.0);
        assert_eq!(matched.rule, "wages_label_next_line");
    }

    #[test]
    fn test_whole_dollar_amount_on_label_line() {
        assert_eq!(extract_wages("1 Wages, tips, other comp. 52000\n"), Some(52000.0));
    }

    #[test]
    fn test_next_box_label_is_not_an_amount() {
        let text = "1 Wages, tips, other compensation $52,000\n2 Federal income tax withheld 100";
        let matched = WageExtractor::new().extract(text).unwrap();
        assert_eq!(matched.value, 52000.0);
        assert_eq!(matched.rule, "w2_box1_same_line");

        let text = "1 Wages, tips, other compensation\n2 Federal income tax withheld 100";
        assert_eq!(extract_wages(text), None);
    }

    #[test]
    fn test_no_box1_label() {
        assert_eq!(extract_wages("2 Federal income tax withheld 100.00"), None);
    }
}
