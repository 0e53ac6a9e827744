//! Employee address recovery from W-2 text.

use lazy_static::lazy_static;
use regex::Captures;

use super::cascade::{all_matches, first_match, Rule};
use super::patterns::{
    collapse_whitespace, W2_ADDRESS_AFTER_LAST_NAME, W2_ADDRESS_AFTER_NAME, W2_ADDRESS_NEXT_LINE,
    W2_ADDRESS_SAME_LINE,
};
use super::{ExtractionMatch, FieldExtractor};

lazy_static! {
    /// Address rules, most specific first.
    pub static ref ADDRESS_RULES: Vec<Rule<String>> = vec![
        Rule::anchored("w2_name_address_zip_box", &W2_ADDRESS_AFTER_NAME, 0.9, cleaned_address),
        Rule::anchored("w2_address_zip_box", &W2_ADDRESS_NEXT_LINE, 0.9, cleaned_address),
        Rule::anchored("w2_after_last_name", &W2_ADDRESS_AFTER_LAST_NAME, 0.75, cleaned_address),
        Rule::anchored("w2_address_same_line", &W2_ADDRESS_SAME_LINE, 0.7, cleaned_address),
    ];
}

/// Employee address extractor.
pub struct AddressExtractor;

impl AddressExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AddressExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AddressExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        first_match(&ADDRESS_RULES, text)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        all_matches(&ADDRESS_RULES, text)
    }
}

/// Extract the employee address from text as a single line.
pub fn extract_address(text: &str) -> Option<String> {
    AddressExtractor::new().extract(text).map(|m| m.value)
}

/// Join captured lines with spaces and collapse whitespace runs.
fn cleaned_address(caps: &Captures<'_>) -> Option<String> {
    let address = collapse_whitespace(caps.get(1)?.as_str());
    if address.is_empty() {
        None
    } else {
        Some(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_after_name_and_address_label() {
        let text = "e/f Employee's name, address, and ZIP code\nJOHN DOE\n42 OAK AVE APT 3\nAUSTIN, TX 78701\n";
        let matched = AddressExtractor::new().extract(text).unwrap();
        assert_eq!(matched.value, "42 OAK AVE APT 3 AUSTIN, TX 78701");
        assert_eq!(matched.rule, "w2_name_address_zip_box");
    }

    #[test]
    fn test_address_on_line_after_label() {
        let text = "f Employee's address and ZIP code\n123  MAIN ST\nDALLAS, TX 75201-1234\n";
        assert_eq!(
            extract_address(text),
            Some("123 MAIN ST DALLAS, TX 75201-1234".to_string())
        );
    }

    #[test]
    fn test_address_after_split_name() {
        let text = "Last name\nPOTURI\n77 PINE RD, IRVING, TX 75038\n";
        let matched = AddressExtractor::new().extract(text).unwrap();
        assert_eq!(matched.value, "77 PINE RD, IRVING, TX 75038");
        assert_eq!(matched.rule, "w2_after_last_name");
    }

    #[test]
    fn test_address_on_label_line() {
        let text = "Employee's address: 9 LAKE DR, RENO, NV 89501\n";
        assert_eq!(
            extract_address(text),
            Some("9 LAKE DR, RENO, NV 89501".to_string())
        );
    }

    #[test]
    fn test_no_address_without_zip() {
        assert_eq!(extract_address("f Employee's address and ZIP code\nunknown\n"), None);
    }
}
