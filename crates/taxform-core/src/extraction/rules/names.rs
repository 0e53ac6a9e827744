//! Employee name recovery from W-2 text.

use lazy_static::lazy_static;
use regex::Captures;

use super::cascade::{all_matches, first_match, Rule};
use super::patterns::{
    collapse_whitespace, EMPLOYEE_LABEL, EMPLOYEE_NAME_LABEL, W2_NAME_COMBINED, W2_NAME_LABELED,
    W2_NAME_SPLIT, W2_NAME_WITH_ADDRESS,
};
use super::{ExtractionMatch, FieldExtractor};

lazy_static! {
    /// Name rules, most specific first.
    pub static ref NAME_RULES: Vec<Rule<String>> = vec![
        Rule::anchored("w2_first_and_last_name", &W2_NAME_COMBINED, 0.95, single_name),
        Rule::anchored("w2_split_first_last_name", &W2_NAME_SPLIT, 0.9, split_name),
        Rule::anchored("w2_name_address_box", &W2_NAME_WITH_ADDRESS, 0.85, single_name),
        Rule::anchored("w2_employee_name_label", &W2_NAME_LABELED, 0.85, single_name),
        Rule::anchored("employee_name_label", &EMPLOYEE_NAME_LABEL, 0.7, single_name),
        Rule::anchored("employee_label", &EMPLOYEE_LABEL, 0.6, single_name),
    ];
}

/// Words that show a capture is another form label rather than a name.
const LABEL_WORDS: [&str; 6] = [
    "address",
    "zip code",
    "social security",
    "identification number",
    "wages",
    "employer",
];

/// Employee name extractor.
pub struct NameExtractor;

impl NameExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for NameExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        first_match(&NAME_RULES, text)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        all_matches(&NAME_RULES, text)
    }
}

/// Extract the employee name from text.
pub fn extract_name(text: &str) -> Option<String> {
    NameExtractor::new().extract(text).map(|m| m.value)
}

fn single_name(caps: &Captures<'_>) -> Option<String> {
    clean_name(caps.get(1)?.as_str())
}

fn split_name(caps: &Captures<'_>) -> Option<String> {
    let first = caps.get(1)?.as_str();
    let last = caps.get(2)?.as_str();
    clean_name(&format!("{} {}", first, last))
}

/// Trim and collapse whitespace; reject captures that are empty, have no letters, or read as a label.
fn clean_name(raw: &str) -> Option<String> {
    let name = collapse_whitespace(raw);
    if !name.chars().any(char::is_alphabetic) {
        return None;
    }

    let lower = name.to_lowercase();
    if LABEL_WORDS.iter().any(|w| lower.contains(w)) {
        return None;
    }

    Some(name)
}
