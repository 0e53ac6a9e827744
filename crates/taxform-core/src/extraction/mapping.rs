//! Provider field name to canonical key tables.
//!
//! Provider names use the flattened dotted form produced by
//! [`crate::analysis::flatten_document_fields`]. Where several provider names
//! map to the same canonical key, the first defined one wins.

use std::collections::BTreeMap;

use tracing::debug;

use super::rules::amounts::normalize_amount;
use crate::analysis::ProviderField;
use crate::models::{CanonicalRecord, DocumentType, FieldValue};

/// How a mapped value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Normalized to a number.
    Amount,
    /// Kept as text.
    Text,
}

/// One row of a mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub provider: &'static str,
    pub canonical: &'static str,
    pub kind: FieldKind,
}

const fn amount(provider: &'static str, canonical: &'static str) -> FieldMapping {
    FieldMapping {
        provider,
        canonical,
        kind: FieldKind::Amount,
    }
}

const fn text(provider: &'static str, canonical: &'static str) -> FieldMapping {
    FieldMapping {
        provider,
        canonical,
        kind: FieldKind::Text,
    }
}

/// Mapping table for one document type, stored as ordered groups of rows.
#[derive(Debug)]
pub struct MappingTable {
    pub name: &'static str,
    groups: &'static [&'static [FieldMapping]],
}

impl MappingTable {
    /// Rows in table order.
    pub fn iter(&self) -> impl Iterator<Item = &'static FieldMapping> + '_ {
        self.groups.iter().flat_map(|group| group.iter())
    }

    /// Distinct canonical keys of the given kind, in table order.
    pub fn canonical_keys(&self, kind: FieldKind) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = Vec::new();
        for row in self.iter().filter(|row| row.kind == kind) {
            if !keys.contains(&row.canonical) {
                keys.push(row.canonical);
            }
        }
        keys
    }
}

const W2_IDENTITY: &[FieldMapping] = &[
    text("Employee.Name", "employeeName"),
    text("Employee.SocialSecurityNumber", "employeeSSN"),
    text("Employee.Address", "employeeAddress"),
    text("Employer.Name", "employerName"),
    text("Employer.IdNumber", "employerEIN"),
    text("Employer.Address", "employerAddress"),
    text("ControlNumber", "controlNumber"),
    text("TaxYear", "taxYear"),
];

const W2_BOXES: &[FieldMapping] = &[
    amount("WagesTipsAndOtherCompensation", "wages"),
    amount("WagesAndTips", "wages"),
    amount("FederalIncomeTaxWithheld", "federalTaxWithheld"),
    amount("SocialSecurityWages", "socialSecurityWages"),
    amount("SocialSecurityTaxWithheld", "socialSecurityTaxWithheld"),
    amount("MedicareWagesAndTips", "medicareWages"),
    amount("MedicareTaxWithheld", "medicareTaxWithheld"),
    amount("SocialSecurityTips", "socialSecurityTips"),
    amount("AllocatedTips", "allocatedTips"),
    amount("DependentCareBenefits", "dependentCareBenefits"),
    amount("NonQualifiedPlans", "nonqualifiedPlans"),
];

const W2_STATE_LOCAL: &[FieldMapping] = &[
    text("StateTaxInfos.State", "state"),
    text("StateTaxInfos.EmployerStateIdNumber", "employerStateId"),
    amount("StateTaxInfos.StateWagesTipsEtc", "stateWages"),
    amount("StateTaxInfos.StateIncomeTax", "stateTaxWithheld"),
    amount("LocalTaxInfos.LocalWagesTipsEtc", "localWages"),
    amount("LocalTaxInfos.LocalIncomeTax", "localTaxWithheld"),
    text("LocalTaxInfos.LocalityName", "localityName"),
];

const FORM_1099_IDENTITY: &[FieldMapping] = &[
    text("Payer.Name", "payerName"),
    text("Payer.TIN", "payerTIN"),
    text("Payer.Address", "payerAddress"),
    text("Recipient.Name", "recipientName"),
    text("Recipient.TIN", "recipientTIN"),
    text("Recipient.Address", "recipientAddress"),
    text("AccountNumber", "accountNumber"),
    text("TaxYear", "taxYear"),
];

const FORM_1099_STATE: &[FieldMapping] = &[
    text("StateTaxInfos.State", "state"),
    text("StateTaxInfos.PayerStateNumber", "payerStateId"),
    amount("StateTaxInfos.StateIncome", "stateIncome"),
    amount("StateTaxInfos.StateTaxWithheld", "stateTaxWithheld"),
];

const FORM_1099_INT_BOXES: &[FieldMapping] = &[
    amount("Box1", "interestIncome"),
    amount("Box2", "earlyWithdrawalPenalty"),
    amount("Box3", "usSavingsBondInterest"),
    amount("Box4", "federalTaxWithheld"),
    amount("Box5", "investmentExpenses"),
    amount("Box6", "foreignTaxPaid"),
    text("Box7", "foreignCountry"),
    amount("Box8", "taxExemptInterest"),
    amount("Box9", "privateActivityBondInterest"),
    amount("Box10", "marketDiscount"),
    amount("Box11", "bondPremium"),
    amount("Box12", "bondPremiumTreasury"),
    amount("Box13", "bondPremiumTaxExempt"),
];

const FORM_1099_DIV_BOXES: &[FieldMapping] = &[
    amount("Box1a", "totalOrdinaryDividends"),
    amount("Box1b", "qualifiedDividends"),
    amount("Box2a", "totalCapitalGain"),
    amount("Box2b", "unrecapturedSection1250Gain"),
    amount("Box2c", "section1202Gain"),
    amount("Box2d", "collectiblesGain"),
    amount("Box2e", "section897OrdinaryDividends"),
    amount("Box2f", "section897CapitalGain"),
    amount("Box3", "nondividendDistributions"),
    amount("Box4", "federalTaxWithheld"),
    amount("Box5", "section199aDividends"),
    amount("Box6", "investmentExpenses"),
    amount("Box7", "foreignTaxPaid"),
    text("Box8", "foreignCountry"),
    amount("Box9", "cashLiquidationDistributions"),
    amount("Box10", "noncashLiquidationDistributions"),
    amount("Box12", "exemptInterestDividends"),
    amount("Box13", "privateActivityBondDividends"),
];

const FORM_1099_MISC_BOXES: &[FieldMapping] = &[
    amount("Box1", "rents"),
    amount("Box2", "royalties"),
    amount("Box3", "otherIncome"),
    amount("Box4", "federalTaxWithheld"),
    amount("Box5", "fishingBoatProceeds"),
    amount("Box6", "medicalPayments"),
    amount("Box8", "substitutePayments"),
    amount("Box9", "cropInsuranceProceeds"),
    amount("Box10", "grossProceedsAttorney"),
    amount("Box11", "fishPurchasedForResale"),
    amount("Box12", "section409aDeferrals"),
    amount("Box14", "excessGoldenParachutePayments"),
    amount("Box15", "nonqualifiedDeferredCompensation"),
];

const FORM_1099_NEC_BOXES: &[FieldMapping] = &[
    amount("Box1", "nonemployeeCompensation"),
    text("Box2", "directSalesIndicator"),
    amount("Box4", "federalTaxWithheld"),
];

pub static W2_TABLE: MappingTable = MappingTable {
    name: "W-2",
    groups: &[W2_IDENTITY, W2_BOXES, W2_STATE_LOCAL],
};

pub static FORM_1099_INT_TABLE: MappingTable = MappingTable {
    name: "1099-INT",
    groups: &[FORM_1099_IDENTITY, FORM_1099_INT_BOXES, FORM_1099_STATE],
};

pub static FORM_1099_DIV_TABLE: MappingTable = MappingTable {
    name: "1099-DIV",
    groups: &[FORM_1099_IDENTITY, FORM_1099_DIV_BOXES, FORM_1099_STATE],
};

pub static FORM_1099_MISC_TABLE: MappingTable = MappingTable {
    name: "1099-MISC",
    groups: &[FORM_1099_IDENTITY, FORM_1099_MISC_BOXES, FORM_1099_STATE],
};

pub static FORM_1099_NEC_TABLE: MappingTable = MappingTable {
    name: "1099-NEC",
    groups: &[FORM_1099_IDENTITY, FORM_1099_NEC_BOXES, FORM_1099_STATE],
};

/// Canonical identity keys shared by every 1099 variant.
pub fn form_1099_identity_keys() -> impl Iterator<Item = &'static str> {
    FORM_1099_IDENTITY.iter().map(|row| row.canonical)
}

/// Table for a document type. `Other` has none and uses the generic mapper.
pub fn table_for(doc_type: DocumentType) -> Option<&'static MappingTable> {
    match doc_type {
        DocumentType::W2 => Some(&W2_TABLE),
        DocumentType::Form1099Int => Some(&FORM_1099_INT_TABLE),
        DocumentType::Form1099Div => Some(&FORM_1099_DIV_TABLE),
        DocumentType::Form1099Misc => Some(&FORM_1099_MISC_TABLE),
        DocumentType::Form1099Nec => Some(&FORM_1099_NEC_TABLE),
        DocumentType::Other => None,
    }
}

/// Copy defined provider fields into `record` by walking `table`.
///
/// Absent fields are omitted. Fields below `min_confidence` are treated as absent.
pub fn map_with_table(
    table: &MappingTable,
    fields: &BTreeMap<String, ProviderField>,
    min_confidence: f32,
    record: &mut CanonicalRecord,
) {
    for row in table.iter() {
        if record.contains_key(row.canonical) {
            continue;
        }
        let Some(field) = fields.get(row.provider) else {
            continue;
        };
        if !field.meets_confidence(min_confidence) {
            debug!(
                "Skipping {} ({:?} below {})",
                row.provider, field.confidence, min_confidence
            );
            continue;
        }

        let value = match row.kind {
            FieldKind::Amount if field.is_defined() => {
                Some(FieldValue::Amount(normalize_amount(field.amount_source().as_ref())))
            }
            FieldKind::Text => field.text_value().map(FieldValue::Text),
            FieldKind::Amount => None,
        };

        if let Some(value) = value {
            record.insert(row.canonical, value);
        }
    }
}

/// Copy every defined field under the provider's own name, without numeric coercion.
pub fn map_generic(
    fields: &BTreeMap<String, ProviderField>,
    min_confidence: f32,
    record: &mut CanonicalRecord,
) {
    for (name, field) in fields {
        if !field.has_value() || !field.meets_confidence(min_confidence) {
            continue;
        }
        let value = match &field.value {
            Some(serde_json::Value::Number(n)) => n.as_f64().map(FieldValue::Amount),
            _ => field.text_value().map(FieldValue::Text),
        };
        if let Some(value) = value {
            record.insert_if_absent(name.clone(), value);
        }
    }
}

/// Map provider fields for a document type into `record`.
pub fn map_fields(
    doc_type: DocumentType,
    fields: &BTreeMap<String, ProviderField>,
    min_confidence: f32,
    record: &mut CanonicalRecord,
) {
    match table_for(doc_type) {
        Some(table) => map_with_table(table, fields, min_confidence, record),
        None => map_generic(fields, min_confidence, record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(entries: &[(&str, ProviderField)]) -> BTreeMap<String, ProviderField> {
        entries
            .iter()
            .map(|(name, field)| (name.to_string(), field.clone()))
            .collect()
    }

    fn mapped(doc_type: DocumentType, fields: &BTreeMap<String, ProviderField>) -> CanonicalRecord {
        let mut record = CanonicalRecord::new();
        map_fields(doc_type, fields, 0.0, &mut record);
        record
    }

    #[test]
    fn test_wages_alias() {
        let fields = fields(&[("WagesAndTips", ProviderField::new(50000, 0.98))]);
        let record = mapped(DocumentType::W2, &fields);
        assert_eq!(record.get("wages"), Some(&FieldValue::Amount(50000.0)));
    }

    #[test]
    fn test_empty_fields_produce_no_wages() {
        let record = mapped(DocumentType::W2, &BTreeMap::new());
        assert!(!record.contains_key("wages"));
        assert!(record.is_empty());
    }

    #[test]
    fn test_first_defined_alias_wins() {
        let fields = fields(&[
            ("WagesTipsAndOtherCompensation", ProviderField::default()),
            ("WagesAndTips", ProviderField::new("$1,200.50", 0.9)),
        ]);
        let record = mapped(DocumentType::W2, &fields);
        assert_eq!(record.amount("wages"), Some(1200.5));
    }

    #[test]
    fn test_text_fields_kept_as_provider_strings() {
        let fields = fields(&[
            ("Employee.SocialSecurityNumber", ProviderField::new("123-45-6789", 0.9)),
            ("TaxYear", ProviderField::new(2023, 0.9)),
            (
                "Employee.Address",
                ProviderField::new(json!({"road": "MAIN ST"}), 0.9).with_content("1 MAIN ST, DALLAS, TX 75201"),
            ),
        ]);
        let record = mapped(DocumentType::W2, &fields);
        assert_eq!(record.text("employeeSSN").as_deref(), Some("123-45-6789"));
        assert_eq!(record.get("taxYear"), Some(&FieldValue::Text("2023".to_string())));
        assert_eq!(
            record.text("employeeAddress").as_deref(),
            Some("1 MAIN ST, DALLAS, TX 75201")
        );
    }

    #[test]
    fn test_low_confidence_treated_as_absent() {
        let fields = fields(&[("Employee.Name", ProviderField::new("J0HN", 0.2))]);
        let mut record = CanonicalRecord::new();
        map_fields(DocumentType::W2, &fields, 0.5, &mut record);
        assert!(!record.contains_key("employeeName"));
    }

    #[test]
    fn test_1099_tables_differ_per_form() {
        let fields = fields(&[
            ("Box1", ProviderField::new(321.0, 0.9)),
            ("Payer.Name", ProviderField::new("FIRST BANK", 0.9)),
        ]);

        let int = mapped(DocumentType::Form1099Int, &fields);
        assert_eq!(int.amount("interestIncome"), Some(321.0));
        assert_eq!(int.text("payerName").as_deref(), Some("FIRST BANK"));

        let nec = mapped(DocumentType::Form1099Nec, &fields);
        assert_eq!(nec.amount("nonemployeeCompensation"), Some(321.0));
        assert!(!nec.contains_key("interestIncome"));
    }

    #[test]
    fn test_generic_mapper_copies_without_coercion() {
        let fields = fields(&[
            ("Invoice Total", ProviderField::new("$45.00", 0.9)),
            ("Count", ProviderField::new(3, 0.9)),
            ("Empty", ProviderField::default().with_content("ignored")),
        ]);
        let record = mapped(DocumentType::Other, &fields);
        assert_eq!(record.get("Invoice Total"), Some(&FieldValue::Text("$45.00".to_string())));
        assert_eq!(record.get("Count"), Some(&FieldValue::Amount(3.0)));
        assert!(!record.contains_key("Empty"));
    }

    #[test]
    fn test_canonical_keys_are_distinct() {
        let amounts = W2_TABLE.canonical_keys(FieldKind::Amount);
        assert_eq!(amounts.iter().filter(|k| **k == "wages").count(), 1);
        assert!(amounts.contains(&"localTaxWithheld"));
        assert!(W2_TABLE.canonical_keys(FieldKind::Text).contains(&"employeeSSN"));
    }
}
