//! Canonical record produced by extraction.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::extraction::rules::amounts::parse_amount_str;

/// Key under which the provider's full OCR text is stored.
pub const FULL_TEXT_KEY: &str = "fullText";

/// Key under which typed outputs record their document type tag.
pub const DOCUMENT_TYPE_KEY: &str = "documentType";

/// Tax form type selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// Form W-2, Wage and Tax Statement.
    #[serde(rename = "W2")]
    W2,
    /// Form 1099-INT, Interest Income.
    #[serde(rename = "FORM_1099_INT")]
    Form1099Int,
    /// Form 1099-DIV, Dividends and Distributions.
    #[serde(rename = "FORM_1099_DIV")]
    Form1099Div,
    /// Form 1099-MISC, Miscellaneous Information.
    #[serde(rename = "FORM_1099_MISC")]
    Form1099Misc,
    /// Form 1099-NEC, Nonemployee Compensation.
    #[serde(rename = "FORM_1099_NEC")]
    Form1099Nec,
    /// Anything else; analyzed with the generic layout model.
    #[serde(rename = "OTHER")]
    Other,
}

impl DocumentType {
    /// All document types.
    pub const ALL: [DocumentType; 6] = [
        DocumentType::W2,
        DocumentType::Form1099Int,
        DocumentType::Form1099Div,
        DocumentType::Form1099Misc,
        DocumentType::Form1099Nec,
        DocumentType::Other,
    ];

    /// Tag string for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::W2 => "W2",
            DocumentType::Form1099Int => "FORM_1099_INT",
            DocumentType::Form1099Div => "FORM_1099_DIV",
            DocumentType::Form1099Misc => "FORM_1099_MISC",
            DocumentType::Form1099Nec => "FORM_1099_NEC",
            DocumentType::Other => "OTHER",
        }
    }

    /// Provider model identifier requested for this type.
    pub fn model_id(&self) -> &'static str {
        match self {
            DocumentType::W2 => "prebuilt-tax.us.w2",
            DocumentType::Form1099Int => "prebuilt-tax.us.1099INT",
            DocumentType::Form1099Div => "prebuilt-tax.us.1099DIV",
            DocumentType::Form1099Misc => "prebuilt-tax.us.1099MISC",
            DocumentType::Form1099Nec => "prebuilt-tax.us.1099NEC",
            DocumentType::Other => "prebuilt-layout",
        }
    }

    /// Whether this is one of the 1099 variants.
    pub fn is_1099(&self) -> bool {
        matches!(
            self,
            DocumentType::Form1099Int
                | DocumentType::Form1099Div
                | DocumentType::Form1099Misc
                | DocumentType::Form1099Nec
        )
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "W2" | "W_2" => Ok(DocumentType::W2),
            "FORM_1099_INT" | "1099_INT" | "1099INT" => Ok(DocumentType::Form1099Int),
            "FORM_1099_DIV" | "1099_DIV" | "1099DIV" => Ok(DocumentType::Form1099Div),
            "FORM_1099_MISC" | "1099_MISC" | "1099MISC" => Ok(DocumentType::Form1099Misc),
            "FORM_1099_NEC" | "1099_NEC" | "1099NEC" => Ok(DocumentType::Form1099Nec),
            "OTHER" => Ok(DocumentType::Other),
            _ => Err(format!("unknown document type: {}", s)),
        }
    }
}

/// Value of a single canonical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A numeric amount.
    Amount(f64),
    /// Free text (names, addresses, identifiers).
    Text(String),
}

impl FieldValue {
    /// Normalize this value to a number. Text is parsed leniently; unparsable text is zero.
    pub fn as_amount(&self) -> f64 {
        match self {
            FieldValue::Amount(n) => *n,
            FieldValue::Text(s) => parse_amount_str(s),
        }
    }

    /// Text form of the value.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Amount(n) => n.to_string(),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Amount(n)
    }
}

/// Normalized output of one analysis call, keyed by canonical field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalRecord(BTreeMap<String, FieldValue>);

impl CanonicalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Insert a field only if the key is not present yet. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> bool {
        use std::collections::btree_map::Entry;

        match self.0.entry(key.into()) {
            Entry::Vacant(slot) => {
                slot.insert(value.into());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.0.remove(key)
    }

    /// Text value of a field, if present.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).map(FieldValue::as_text)
    }

    /// Numeric value of a field, if present.
    pub fn amount(&self, key: &str) -> Option<f64> {
        self.0.get(key).map(FieldValue::as_amount)
    }

    /// Text value of a field, or empty when absent.
    pub fn text_or_default(&self, key: &str) -> String {
        self.text(key).unwrap_or_default()
    }

    /// Numeric value of a field, or zero when absent.
    pub fn amount_or_default(&self, key: &str) -> f64 {
        self.amount(key).unwrap_or(0.0)
    }

    /// The provider's full OCR text.
    pub fn full_text(&self) -> &str {
        match self.0.get(FULL_TEXT_KEY) {
            Some(FieldValue::Text(s)) => s,
            _ => "",
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub(crate) fn into_inner(self) -> BTreeMap<String, FieldValue> {
        self.0
    }
}

impl IntoIterator for CanonicalRecord {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_from_str() {
        assert_eq!("w2".parse::<DocumentType>(), Ok(DocumentType::W2));
        assert_eq!("W-2".parse::<DocumentType>(), Ok(DocumentType::W2));
        assert_eq!("1099-int".parse::<DocumentType>(), Ok(DocumentType::Form1099Int));
        assert_eq!("FORM_1099_NEC".parse::<DocumentType>(), Ok(DocumentType::Form1099Nec));
        assert!("1040".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_model_ids_are_distinct() {
        let mut ids: Vec<_> = DocumentType::ALL.iter().map(|t| t.model_id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), DocumentType::ALL.len());
        assert_eq!(DocumentType::Other.model_id(), "prebuilt-layout");
    }

    #[test]
    fn test_field_value_serializes_untagged() {
        let mut record = CanonicalRecord::new();
        record.insert("wages", 900.0);
        record.insert("employeeName", "JANE DOE");

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"employeeName":"JANE DOE","wages":900.0}"#);
    }

    #[test]
    fn test_insert_if_absent_keeps_existing() {
        let mut record = CanonicalRecord::new();
        record.insert("wages", 100.0);

        assert!(!record.insert_if_absent("wages", "999"));
        assert!(record.insert_if_absent("note", "kept"));
        assert_eq!(record.amount("wages"), Some(100.0));
        assert_eq!(record.text("note"), Some("kept".to_string()));
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let record = CanonicalRecord::new();
        assert_eq!(record.text_or_default("employeeName"), "");
        assert_eq!(record.amount_or_default("wages"), 0.0);
        assert_eq!(record.full_text(), "");
    }
}
