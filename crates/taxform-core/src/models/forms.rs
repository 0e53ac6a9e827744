//! Typed W-2 and 1099 outputs.
//!
//! These wrap a [`CanonicalRecord`] with a guaranteed key set: missing text
//! defaults to an empty string and missing amounts to zero. Every other key
//! the record carried is kept in `additional_fields`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::record::{CanonicalRecord, DocumentType, FieldValue, DOCUMENT_TYPE_KEY, FULL_TEXT_KEY};
use crate::error::AnalysisError;
use crate::extraction::mapping::{form_1099_identity_keys, table_for, FieldKind};

/// Fields left over after the fixed keys have been taken out.
struct Remaining(BTreeMap<String, FieldValue>);

impl Remaining {
    fn new(record: CanonicalRecord) -> Self {
        let mut fields = record.into_inner();
        fields.remove(DOCUMENT_TYPE_KEY);
        Self(fields)
    }

    fn text(&mut self, key: &str) -> String {
        self.0.remove(key).map(|v| v.as_text()).unwrap_or_default()
    }

    fn amount(&mut self, key: &str) -> f64 {
        self.0.remove(key).map(|v| v.as_amount()).unwrap_or(0.0)
    }

    fn into_inner(self) -> BTreeMap<String, FieldValue> {
        self.0
    }
}

/// W-2 Wage and Tax Statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct W2Document {
    pub document_type: DocumentType,

    // Employee
    pub employee_name: String,
    #[serde(rename = "employeeSSN")]
    pub employee_ssn: String,
    pub employee_address: String,
    pub employee_street: String,
    pub employee_city: String,
    pub employee_state: String,
    pub employee_zip_code: String,

    // Employer
    pub employer_name: String,
    #[serde(rename = "employerEIN")]
    pub employer_ein: String,
    pub employer_address: String,
    pub control_number: String,
    pub tax_year: String,

    // Boxes 1-12
    pub wages: f64,
    pub federal_tax_withheld: f64,
    pub social_security_wages: f64,
    pub social_security_tax_withheld: f64,
    pub medicare_wages: f64,
    pub medicare_tax_withheld: f64,
    pub social_security_tips: f64,
    pub allocated_tips: f64,
    pub dependent_care_benefits: f64,
    pub nonqualified_plans: f64,

    // Boxes 15-20, first line
    pub state: String,
    pub employer_state_id: String,
    pub state_wages: f64,
    pub state_tax_withheld: f64,
    pub local_wages: f64,
    pub local_tax_withheld: f64,
    pub locality_name: String,

    pub full_text: String,

    /// Any other key the extraction produced.
    #[serde(flatten)]
    pub additional_fields: BTreeMap<String, FieldValue>,
}

impl W2Document {
    /// Build from a canonical record, defaulting every missing fixed key.
    pub fn from_record(record: CanonicalRecord) -> Self {
        let mut r = Remaining::new(record);

        Self {
            document_type: DocumentType::W2,
            employee_name: r.text("employeeName"),
            employee_ssn: r.text("employeeSSN"),
            employee_address: r.text("employeeAddress"),
            employee_street: r.text("employeeStreet"),
            employee_city: r.text("employeeCity"),
            employee_state: r.text("employeeState"),
            employee_zip_code: r.text("employeeZipCode"),
            employer_name: r.text("employerName"),
            employer_ein: r.text("employerEIN"),
            employer_address: r.text("employerAddress"),
            control_number: r.text("controlNumber"),
            tax_year: r.text("taxYear"),
            wages: r.amount("wages"),
            federal_tax_withheld: r.amount("federalTaxWithheld"),
            social_security_wages: r.amount("socialSecurityWages"),
            social_security_tax_withheld: r.amount("socialSecurityTaxWithheld"),
            medicare_wages: r.amount("medicareWages"),
            medicare_tax_withheld: r.amount("medicareTaxWithheld"),
            social_security_tips: r.amount("socialSecurityTips"),
            allocated_tips: r.amount("allocatedTips"),
            dependent_care_benefits: r.amount("dependentCareBenefits"),
            nonqualified_plans: r.amount("nonqualifiedPlans"),
            state: r.text("state"),
            employer_state_id: r.text("employerStateId"),
            state_wages: r.amount("stateWages"),
            state_tax_withheld: r.amount("stateTaxWithheld"),
            local_wages: r.amount("localWages"),
            local_tax_withheld: r.amount("localTaxWithheld"),
            locality_name: r.text("localityName"),
            full_text: r.text(FULL_TEXT_KEY),
            additional_fields: r.into_inner(),
        }
    }
}

/// Any 1099 variant.
///
/// Identity fields are fixed. Box amounts depend on the variant and live in
/// `fields`, where every amount key of the variant's table is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form1099Document {
    pub document_type: DocumentType,

    pub payer_name: String,
    #[serde(rename = "payerTIN")]
    pub payer_tin: String,
    pub payer_address: String,
    pub recipient_name: String,
    #[serde(rename = "recipientTIN")]
    pub recipient_tin: String,
    pub recipient_address: String,
    pub account_number: String,
    pub tax_year: String,

    pub full_text: String,

    /// Box amounts and any other key the extraction produced.
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Form1099Document {
    /// Build from a canonical record for the given 1099 variant.
    pub fn from_record(
        record: CanonicalRecord,
        doc_type: DocumentType,
    ) -> std::result::Result<Self, AnalysisError> {
        let table = table_for(doc_type)
            .filter(|_| doc_type.is_1099())
            .ok_or_else(|| AnalysisError::UnsupportedDocumentType(doc_type.to_string()))?;

        let mut r = Remaining::new(record);
        let mut document = Self {
            document_type: doc_type,
            payer_name: r.text("payerName"),
            payer_tin: r.text("payerTIN"),
            payer_address: r.text("payerAddress"),
            recipient_name: r.text("recipientName"),
            recipient_tin: r.text("recipientTIN"),
            recipient_address: r.text("recipientAddress"),
            account_number: r.text("accountNumber"),
            tax_year: r.text("taxYear"),
            full_text: r.text(FULL_TEXT_KEY),
            fields: BTreeMap::new(),
        };

        for key in table.canonical_keys(FieldKind::Amount) {
            let value = r.amount(key);
            document.fields.insert(key.to_string(), FieldValue::Amount(value));
        }
        document.fields.extend(r.into_inner());

        Ok(document)
    }

    /// Amount of a box field, zero when absent.
    pub fn amount(&self, key: &str) -> f64 {
        self.fields.get(key).map(FieldValue::as_amount).unwrap_or(0.0)
    }

    /// Canonical identity keys held in the fixed fields.
    pub fn identity_keys() -> impl Iterator<Item = &'static str> {
        form_1099_identity_keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_w2_defaults_missing_fields() {
        let mut record = CanonicalRecord::new();
        record.insert(FULL_TEXT_KEY, "W-2 text");
        record.insert("employeeSSN", "123-45-6789");

        let w2 = W2Document::from_record(record);
        assert_eq!(w2.document_type, DocumentType::W2);
        assert_eq!(w2.wages, 0.0);
        assert_eq!(w2.employee_name, "");
        assert_eq!(w2.employee_ssn, "123-45-6789");
        assert_eq!(w2.full_text, "W-2 text");
        assert!(w2.additional_fields.is_empty());
    }

    #[test]
    fn test_w2_keeps_extra_keys_and_serializes_fixed_names() {
        let mut record = CanonicalRecord::new();
        record.insert("wages", 900.0);
        record.insert("Retirement plan", "X");

        let w2 = W2Document::from_record(record);
        let json = serde_json::to_value(&w2).unwrap();

        assert_eq!(json["documentType"], "W2");
        assert_eq!(json["wages"], 900.0);
        assert_eq!(json["employeeSSN"], "");
        assert_eq!(json["employeeZipCode"], "");
        assert_eq!(json["Retirement plan"], "X");
    }

    #[test]
    fn test_w2_text_amount_is_normalized() {
        let mut record = CanonicalRecord::new();
        record.insert("wages", "$1,000.25");
        assert_eq!(W2Document::from_record(record).wages, 1000.25);
    }

    #[test]
    fn test_1099_fills_table_amounts() {
        let mut record = CanonicalRecord::new();
        record.insert("payerName", "FIRST BANK");
        record.insert("interestIncome", 12.5);
        record.insert("Memo", "note");

        let form = Form1099Document::from_record(record, DocumentType::Form1099Int).unwrap();
        assert_eq!(form.document_type, DocumentType::Form1099Int);
        assert_eq!(form.payer_name, "FIRST BANK");
        assert_eq!(form.recipient_tin, "");
        assert_eq!(form.amount("interestIncome"), 12.5);
        assert_eq!(form.fields.get("taxExemptInterest"), Some(&FieldValue::Amount(0.0)));
        assert_eq!(form.fields.get("Memo"), Some(&FieldValue::Text("note".to_string())));
        assert!(!form.fields.contains_key("nonemployeeCompensation"));
    }

    #[test]
    fn test_1099_rejects_other_types() {
        assert!(matches!(
            Form1099Document::from_record(CanonicalRecord::new(), DocumentType::W2),
            Err(AnalysisError::UnsupportedDocumentType(_))
        ));
    }

    #[test]
    fn test_identity_keys() {
        let keys: Vec<_> = Form1099Document::identity_keys().collect();
        assert!(keys.contains(&"recipientTIN"));
        assert_eq!(keys.len(), 8);
    }
}
