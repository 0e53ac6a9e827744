//! Ordered first-match-wins rule cascades.
//!
//! A cascade is a list of rules sorted from the most specific, layout-aware
//! pattern to the most generic fallback. Evaluation stops at the first rule
//! whose pattern matches and whose extractor accepts the capture; later rules
//! are never consulted, even if they would produce a different value.

use regex::{Captures, Regex};

use super::ExtractionMatch;

/// One step of a cascade: a pattern plus the function that turns its captures into a value.
pub struct Rule<T> {
    /// Rule name, reported as the source of a recovered value.
    pub name: &'static str,
    /// Pattern evaluated against the full text.
    pub pattern: &'static Regex,
    /// Confidence attached to values produced by this rule.
    pub confidence: f32,
    /// Whether the pattern is tied to a form label. Unanchored rules may hit unrelated text.
    pub anchored: bool,
    /// Converts captures into a value. Returning `None` rejects the match.
    pub extract: fn(&Captures<'_>) -> Option<T>,
}

impl<T> Rule<T> {
    /// Labeled rule with the given confidence.
    pub fn anchored(
        name: &'static str,
        pattern: &'static Regex,
        confidence: f32,
        extract: fn(&Captures<'_>) -> Option<T>,
    ) -> Self {
        Self {
            name,
            pattern,
            confidence,
            anchored: true,
            extract,
        }
    }

    /// Rule without a layout anchor.
    pub fn unanchored(
        name: &'static str,
        pattern: &'static Regex,
        confidence: f32,
        extract: fn(&Captures<'_>) -> Option<T>,
    ) -> Self {
        Self {
            anchored: false,
            ..Self::anchored(name, pattern, confidence, extract)
        }
    }

    /// Apply this rule to `text`, using the first place its pattern matches.
    pub fn apply(&self, text: &str) -> Option<ExtractionMatch<T>> {
        let caps = self.pattern.captures(text)?;
        let value = (self.extract)(&caps)?;
        let full_match = caps.get(0)?;

        Some(
            ExtractionMatch::new(value, self.confidence, full_match.as_str())
                .with_position(full_match.start(), full_match.end())
                .with_rule(self.name, self.anchored),
        )
    }
}

/// Evaluate `rules` in order and return the first successful match.
pub fn first_match<T>(rules: &[Rule<T>], text: &str) -> Option<ExtractionMatch<T>> {
    first_match_where(rules, text, |_| true)
}

/// Like [`first_match`], skipping rules for which `enabled` returns false.
pub fn first_match_where<T>(
    rules: &[Rule<T>],
    text: &str,
    enabled: impl Fn(&Rule<T>) -> bool,
) -> Option<ExtractionMatch<T>> {
    rules
        .iter()
        .filter(|rule| enabled(rule))
        .find_map(|rule| rule.apply(text))
}

/// Evaluate every rule and collect all successful matches, in rule order.
pub fn all_matches<T>(rules: &[Rule<T>], text: &str) -> Vec<ExtractionMatch<T>> {
    rules.iter().filter_map(|rule| rule.apply(text)).collect()
}

/// Extractor that returns the first capture group as an owned string.
pub fn first_group(caps: &Captures<'_>) -> Option<String> {
    caps.get(1).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_static::lazy_static;

    lazy_static! {
        static ref LABELED: Regex = Regex::new(r"ID:\s*(\d+)").unwrap();
        static ref ANY_NUMBER: Regex = Regex::new(r"(\d+)").unwrap();
        static ref NEVER: Regex = Regex::new(r"NOPE(\d+)").unwrap();
    }

    fn parse_nonzero(caps: &Captures<'_>) -> Option<u32> {
        caps[1].parse().ok().filter(|n| *n != 0)
    }

    fn rules() -> Vec<Rule<u32>> {
        vec![
            Rule::anchored("never", &NEVER, 0.99, parse_nonzero),
            Rule::anchored("labeled", &LABELED, 0.9, parse_nonzero),
            Rule::unanchored("any", &ANY_NUMBER, 0.3, parse_nonzero),
        ]
    }

    #[test]
    fn test_first_rule_in_order_wins() {
        let matched = first_match(&rules(), "7 items, ID: 42").unwrap();
        assert_eq!(matched.value, 42);
        assert_eq!(matched.rule, "labeled");
        assert!(matched.anchored);
    }

    #[test]
    fn test_rejected_capture_falls_through() {
        let matched = first_match(&rules(), "item 15, ID: 0").unwrap();
        assert_eq!(matched.rule, "any");
        assert_eq!(matched.value, 15);
        assert!(!matched.anchored);
    }

    #[test]
    fn test_no_match_is_none() {
        assert!(first_match(&rules(), "no digits here").is_none());
    }

    #[test]
    fn test_disabled_rules_are_skipped() {
        let matched = first_match_where(&rules(), "item 15, ID: 0", |r| r.anchored);
        assert!(matched.is_none());
    }

    #[test]
    fn test_all_matches_keeps_rule_order() {
        let names: Vec<_> = all_matches(&rules(), "ID: 42")
            .into_iter()
            .map(|m| m.rule)
            .collect();
        assert_eq!(names, vec!["labeled", "any"]);
    }
}
