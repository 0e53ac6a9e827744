//! Employee SSN recovery from W-2 text.

use lazy_static::lazy_static;

use super::cascade::{all_matches, first_group, first_match_where, Rule};
use super::patterns::{SSN_BARE, SSN_LABEL, W2_SSN_CONTINUOUS, W2_SSN_DELIMITED};
use super::{ExtractionMatch, FieldExtractor};

lazy_static! {
    /// SSN rules, most specific first. The last rule has no label anchor.
    pub static ref SSN_RULES: Vec<Rule<String>> = vec![
        Rule::anchored("w2_ssn_box_delimited", &W2_SSN_DELIMITED, 0.95, first_group),
        Rule::anchored("w2_ssn_box_continuous", &W2_SSN_CONTINUOUS, 0.9, first_group),
        Rule::anchored("ssn_label", &SSN_LABEL, 0.8, first_group),
        Rule::unanchored("bare_ssn_shape", &SSN_BARE, 0.3, first_group),
    ];
}

/// Identification number (SSN) extractor.
pub struct IdentificationExtractor {
    allow_unanchored: bool,
}

impl IdentificationExtractor {
    /// Create a new extractor that falls back to the bare `NNN-NN-NNNN` shape.
    pub fn new() -> Self {
        Self {
            allow_unanchored: true,
        }
    }

    /// Set whether the unanchored fallback rule may fire.
    pub fn with_unanchored(mut self, allow: bool) -> Self {
        self.allow_unanchored = allow;
        self
    }
}

impl Default for IdentificationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for IdentificationExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        first_match_where(&SSN_RULES, text, |rule| {
            self.allow_unanchored || rule.anchored
        })
        .map(|mut m| {
            m.value = m.value.trim().to_string();
            m
        })
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        all_matches(&SSN_RULES, text)
    }
}

/// Extract the employee SSN from text.
pub fn extract_ssn(text: &str) -> Option<String> {
    IdentificationExtractor::new().extract(text).map(|m| m.value)
}
