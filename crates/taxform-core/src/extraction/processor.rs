//! Document processor turning a provider result into a canonical record.

use std::time::Instant;

use tracing::{debug, info, warn};

use super::mapping::map_fields;
use super::rules::{
    decompose_address, AddressExtractor, ExtractionMatch, FieldExtractor, IdentificationExtractor,
    NameExtractor, WageExtractor,
};
use crate::analysis::RawAnalysisResult;
use crate::models::{CanonicalRecord, DocumentType, ExtractionConfig, FULL_TEXT_KEY};

/// Result of processing one provider result.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted fields.
    pub record: CanonicalRecord,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Maps provider fields, recovers missing W-2 fields from text and merges key-value pairs.
#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    /// Minimum provider confidence for accepting a field.
    min_confidence: f32,
    /// Whether to run text recovery for W-2 documents.
    recover_w2_fields: bool,
    /// Whether SSN recovery may use the unlabeled fallback.
    allow_unanchored_ssn: bool,
}

impl DocumentProcessor {
    /// Create a processor with default settings.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            min_confidence: config.min_field_confidence,
            recover_w2_fields: config.recover_w2_fields,
            allow_unanchored_ssn: config.allow_unanchored_ssn,
        }
    }

    /// Set minimum confidence threshold.
    pub fn with_min_confidence(mut self, confidence: f32) -> Self {
        self.min_confidence = confidence;
        self
    }

    /// Enable or disable W-2 text recovery.
    pub fn with_w2_recovery(mut self, enabled: bool) -> Self {
        self.recover_w2_fields = enabled;
        self
    }

    /// Enable or disable the unlabeled SSN fallback.
    pub fn with_unanchored_ssn(mut self, allow: bool) -> Self {
        self.allow_unanchored_ssn = allow;
        self
    }

    /// Build the canonical record for `raw` as a document of type `doc_type`.
    pub fn process(&self, raw: &RawAnalysisResult, doc_type: DocumentType) -> ExtractionResult {
        let start = Instant::now();
        let mut warnings = Vec::new();

        info!(
            "Processing {} result with {} chars of text",
            doc_type,
            raw.content.len()
        );

        let mut record = CanonicalRecord::new();
        record.insert(FULL_TEXT_KEY, raw.content.as_str());

        if let Some(fields) = raw.fields().filter(|f| !f.is_empty()) {
            map_fields(doc_type, fields, self.min_confidence, &mut record);
            debug!("Mapped {} of {} provider fields", record.len() - 1, fields.len());
        } else {
            warnings.push("Provider returned no structured fields".to_string());
        }

        if doc_type == DocumentType::W2 && self.recover_w2_fields {
            self.recover_w2(&raw.content, &mut record, &mut warnings);
        }

        if doc_type == DocumentType::W2 {
            if let Some(address) = record.text("employeeAddress") {
                let parts = decompose_address(&address, &raw.content);
                debug!(
                    "Decomposed address into street={:?} city={:?} state={:?} zip={:?}",
                    parts.street, parts.city, parts.state, parts.zip_code
                );
                record.insert("employeeStreet", parts.street);
                record.insert("employeeCity", parts.city);
                record.insert("employeeState", parts.state);
                record.insert("employeeZipCode", parts.zip_code);
            } else {
                warnings.push("Could not extract employee address".to_string());
            }
        }

        let merged = merge_key_value_pairs(raw, &mut record);
        if merged > 0 {
            debug!("Merged {} key-value pairs", merged);
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Extracted {} fields in {}ms ({} warnings)",
            record.len(),
            processing_time_ms,
            warnings.len()
        );

        ExtractionResult {
            record,
            warnings,
            processing_time_ms,
        }
    }

    fn recover_w2(&self, text: &str, record: &mut CanonicalRecord, warnings: &mut Vec<String>) {
        if !record.contains_key("employeeName") {
            match NameExtractor::new().extract(text) {
                Some(name) => insert_recovered(record, "employeeName", name),
                None => warnings.push("Could not extract employee name".to_string()),
            }
        }

        if !record.contains_key("employeeSSN") {
            let ssn = IdentificationExtractor::new()
                .with_unanchored(self.allow_unanchored_ssn)
                .extract(text);
            match ssn {
                Some(ssn) => {
                    if !ssn.anchored {
                        warn!("Employee SSN taken from an unlabeled number in the text");
                        warnings.push(
                            "Employee SSN recovered from an unlabeled NNN-NN-NNNN number".to_string(),
                        );
                    }
                    insert_recovered(record, "employeeSSN", ssn);
                }
                None => warnings.push("Could not extract employee SSN".to_string()),
            }
        }

        if !record.contains_key("employeeAddress") {
            if let Some(address) = AddressExtractor::new().extract(text) {
                insert_recovered(record, "employeeAddress", address);
            }
        }

        if !record.contains_key("wages") {
            match WageExtractor::new().extract(text) {
                Some(wages) => {
                    debug!("Recovered wages via {}", wages.rule);
                    record.insert("wages", wages.value);
                }
                None => warnings.push("Could not extract wages (box 1)".to_string()),
            }
        }
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_recovered(record: &mut CanonicalRecord, key: &str, found: ExtractionMatch<String>) {
    debug!(
        "Recovered {} via {} (confidence {:.2})",
        key, found.rule, found.confidence
    );
    record.insert(key, found.value);
}

/// Add key-value pairs whose key is not already in the record. Returns how many were added.
fn merge_key_value_pairs(raw: &RawAnalysisResult, record: &mut CanonicalRecord) -> usize {
    let mut merged = 0;
    for pair in &raw.key_value_pairs {
        let key = pair.key.trim();
        if key.is_empty() {
            continue;
        }
        let Some(value) = pair.value.as_deref() else {
            continue;
        };
        if record.insert_if_absent(key, value) {
            merged += 1;
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalyzedDocument, KeyValuePair, ProviderField};
    use crate::models::FieldValue;
    use pretty_assertions::assert_eq;

    const W2_TEXT: &str = "a Employee's social security number\n123-45-6789\n\
                           1 Wages, tips, other comp. 900.00\n\
                           e Employee's first name and initial\nSAI KUMAR\nLast name\nPOTURI\n\
                           1234 ELM STREET\nDALLAS, TX 75201\n";

    fn with_fields(content: &str, fields: &[(&str, ProviderField)]) -> RawAnalysisResult {
        RawAnalysisResult {
            content: content.to_string(),
            document: Some(AnalyzedDocument {
                doc_type: Some("tax.us.w2".to_string()),
                fields: fields
                    .iter()
                    .map(|(name, field)| (name.to_string(), field.clone()))
                    .collect(),
            }),
            key_value_pairs: Vec::new(),
        }
    }

    #[test]
    fn test_w2_recovered_from_text_only() {
        let raw = RawAnalysisResult::from_text(W2_TEXT);
        let result = DocumentProcessor::new().process(&raw, DocumentType::W2);
        let record = &result.record;

        assert_eq!(record.full_text(), W2_TEXT);
        assert_eq!(record.text("employeeName").as_deref(), Some("SAI KUMAR POTURI"));
        assert_eq!(record.text("employeeSSN").as_deref(), Some("123-45-6789"));
        assert_eq!(record.amount("wages"), Some(900.0));
        assert_eq!(record.text("employeeStreet").as_deref(), Some("1234 ELM STREET"));
        assert_eq!(record.text("employeeCity").as_deref(), Some("DALLAS"));
        assert_eq!(record.text("employeeState").as_deref(), Some("TX"));
        assert_eq!(record.text("employeeZipCode").as_deref(), Some("75201"));
    }

    #[test]
    fn test_structured_fields_take_precedence() {
        let raw = with_fields(
            W2_TEXT,
            &[
                ("Employee.Name", ProviderField::new("JANE DOE", 0.99)),
                ("WagesAndTips", ProviderField::new(50000, 0.98)),
            ],
        );
        let record = DocumentProcessor::new().process(&raw, DocumentType::W2).record;

        assert_eq!(record.text("employeeName").as_deref(), Some("JANE DOE"));
        assert_eq!(record.amount("wages"), Some(50000.0));
    }

    #[test]
    fn test_low_confidence_field_is_recovered() {
        let raw = with_fields(W2_TEXT, &[("Employee.Name", ProviderField::new("5A1 KUMAR", 0.3))]);
        let record = DocumentProcessor::new()
            .with_min_confidence(0.5)
            .process(&raw, DocumentType::W2)
            .record;

        assert_eq!(record.text("employeeName").as_deref(), Some("SAI KUMAR POTURI"));
    }

    #[test]
    fn test_blank_provider_fields_are_recovered() {
        let raw = with_fields(
            "Employee's name: John Smith\n1 Wages, tips, other comp. 900.00",
            &[
                ("Employee.Name", ProviderField::new("", 0.9)),
                ("WagesTipsAndOtherCompensation", ProviderField::new(" ", 0.9)),
            ],
        );
        let record = DocumentProcessor::new().process(&raw, DocumentType::W2).record;

        assert_eq!(record.text("employeeName").as_deref(), Some("John Smith"));
        assert_eq!(record.amount("wages"), Some(900.0));
    }

    #[test]
    fn test_provider_address_is_decomposed() {
        let raw = with_fields(
            "",
            &[(
                "Employee.Address",
                ProviderField::default().with_content("77 PINE RD, IRVING TX 75038"),
            )],
        );
        let record = DocumentProcessor::new().process(&raw, DocumentType::W2).record;

        assert_eq!(record.text("employeeStreet").as_deref(), Some("77 PINE RD"));
        assert_eq!(record.text("employeeCity").as_deref(), Some("IRVING"));
        assert_eq!(record.text("employeeZipCode").as_deref(), Some("75038"));
    }

    #[test]
    fn test_no_wages_recovered_leaves_key_absent() {
        let raw = RawAnalysisResult::from_text("nothing useful");
        let result = DocumentProcessor::new().process(&raw, DocumentType::W2);
        assert!(!result.record.contains_key("wages"));
        assert!(result.warnings.iter().any(|w| w.contains("wages")));
    }

    #[test]
    fn test_labeled_ssn_wins_without_warning() {
        let text = "Reference 987-65-4321\nSSN: 123-45-6789\n";
        let result = DocumentProcessor::new().process(&RawAnalysisResult::from_text(text), DocumentType::W2);

        assert_eq!(result.record.text("employeeSSN").as_deref(), Some("123-45-6789"));
        assert!(!result.warnings.iter().any(|w| w.contains("unlabeled")));
    }

    #[test]
    fn test_unanchored_ssn_is_flagged_or_disabled() {
        let raw = RawAnalysisResult::from_text("Reference 987-65-4321\n");

        let result = DocumentProcessor::new().process(&raw, DocumentType::W2);
        assert_eq!(result.record.text("employeeSSN").as_deref(), Some("987-65-4321"));
        assert!(result.warnings.iter().any(|w| w.contains("unlabeled")));

        let strict = DocumentProcessor::new()
            .with_unanchored_ssn(false)
            .process(&raw, DocumentType::W2);
        assert!(!strict.record.contains_key("employeeSSN"));
    }

    #[test]
    fn test_key_value_pairs_do_not_overwrite() {
        let mut raw = with_fields("", &[("Employee.Name", ProviderField::new("JANE DOE", 0.99))]);
        raw.key_value_pairs = vec![
            KeyValuePair::new("employeeName", "SOMEONE ELSE"),
            KeyValuePair::new("  Plan  ", "401k"),
            KeyValuePair {
                key: "No value".to_string(),
                value: None,
                confidence: None,
            },
        ];

        let record = DocumentProcessor::new()
            .with_w2_recovery(false)
            .process(&raw, DocumentType::W2)
            .record;

        assert_eq!(record.text("employeeName").as_deref(), Some("JANE DOE"));
        assert_eq!(record.get("Plan"), Some(&FieldValue::Text("401k".to_string())));
        assert!(!record.contains_key("No value"));
    }

    #[test]
    fn test_1099_skips_w2_recovery() {
        let raw = RawAnalysisResult::from_text(W2_TEXT);
        let record = DocumentProcessor::new()
            .process(&raw, DocumentType::Form1099Int)
            .record;

        assert!(!record.contains_key("employeeName"));
        assert!(!record.contains_key("wages"));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_processing_is_idempotent() {
        let mut raw = with_fields(W2_TEXT, &[("FederalIncomeTaxWithheld", ProviderField::new("$100.00", 0.9))]);
        raw.key_value_pairs.push(KeyValuePair::new("Plan", "401k"));

        let processor = DocumentProcessor::new();
        let first = processor.process(&raw, DocumentType::W2);
        let second = processor.process(&raw, DocumentType::W2);

        assert_eq!(first.record, second.record);
        assert_eq!(first.warnings, second.warnings);
    }
}
