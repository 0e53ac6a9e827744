//! Rule-based text recovery for US tax forms.

pub mod address;
pub mod amounts;
pub mod cascade;
pub mod decompose;
pub mod identification;
pub mod names;
pub mod patterns;
pub mod wages;

pub use address::{extract_address, AddressExtractor};
pub use amounts::{normalize_amount, parse_amount, parse_amount_str, parse_positive_amount};
pub use cascade::{first_match, Rule};
pub use decompose::{decompose_address, AddressParts};
pub use identification::{extract_ssn, IdentificationExtractor};
pub use names::{extract_name, NameExtractor};
pub use wages::{extract_wages, WageExtractor};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
    /// Name of the rule that produced the value.
    pub rule: &'static str,
    /// Whether the rule is tied to a form label.
    pub anchored: bool,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
            rule: "",
            anchored: true,
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    pub fn with_rule(mut self, rule: &'static str, anchored: bool) -> Self {
        self.rule = rule;
        self.anchored = anchored;
        self
    }
}

/// Personal details recovered from raw OCR text. Each field is present only if a rule fired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonalInfo {
    pub name: Option<ExtractionMatch<String>>,
    pub identification_number: Option<ExtractionMatch<String>>,
    pub address: Option<ExtractionMatch<String>>,
}

impl PersonalInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.identification_number.is_none() && self.address.is_none()
    }
}

/// Recover employee name, SSN and address from W-2 text.
pub fn recover_personal_info(text: &str, allow_unanchored_ssn: bool) -> PersonalInfo {
    PersonalInfo {
        name: NameExtractor::new().extract(text),
        identification_number: IdentificationExtractor::new()
            .with_unanchored(allow_unanchored_ssn)
            .extract(text),
        address: AddressExtractor::new().extract(text),
    }
}
