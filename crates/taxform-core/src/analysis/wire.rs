//! Provider wire format and conversion into [`RawAnalysisResult`].

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::{AnalyzedDocument, KeyValuePair, ProviderField, RawAnalysisResult};

/// Polling response for an analyze operation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireOperation {
    pub status: String,
    #[serde(default)]
    pub analyze_result: Option<WireAnalyzeResult>,
    #[serde(default)]
    pub error: Option<WireError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl WireError {
    pub fn describe(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (None, Some(message)) => message.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

/// `analyzeResult` body of a completed operation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAnalyzeResult {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub documents: Vec<WireDocument>,
    #[serde(default)]
    pub key_value_pairs: Vec<WireKeyValuePair>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDocument {
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, WireField>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireField {
    #[serde(default)]
    pub value_string: Option<String>,
    #[serde(default)]
    pub value_number: Option<f64>,
    #[serde(default)]
    pub value_integer: Option<i64>,
    #[serde(default)]
    pub value_date: Option<String>,
    #[serde(default)]
    pub value_selection_mark: Option<String>,
    #[serde(default)]
    pub value_boolean: Option<bool>,
    #[serde(default)]
    pub value_currency: Option<WireCurrency>,
    #[serde(default)]
    pub value_address: Option<Value>,
    #[serde(default)]
    pub value_object: Option<BTreeMap<String, WireField>>,
    #[serde(default)]
    pub value_array: Option<Vec<WireField>>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireCurrency {
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireKeyValuePair {
    #[serde(default)]
    pub key: Option<WireContent>,
    #[serde(default)]
    pub value: Option<WireContent>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireContent {
    #[serde(default)]
    pub content: String,
}

impl WireField {
    /// Scalar value, if the field has one.
    fn scalar(&self) -> Option<Value> {
        if let Some(s) = &self.value_string {
            return Some(Value::String(s.clone()));
        }
        if let Some(amount) = self.value_currency.as_ref().and_then(|c| c.amount) {
            return Some(Value::from(amount));
        }
        if let Some(n) = self.value_number {
            return Some(Value::from(n));
        }
        if let Some(n) = self.value_integer {
            return Some(Value::from(n));
        }
        if let Some(d) = &self.value_date {
            return Some(Value::String(d.clone()));
        }
        if let Some(b) = self.value_boolean {
            return Some(Value::Bool(b));
        }
        if let Some(mark) = &self.value_selection_mark {
            return Some(Value::String(mark.clone()));
        }
        self.value_address.clone()
    }
}

impl From<WireAnalyzeResult> for RawAnalysisResult {
    fn from(result: WireAnalyzeResult) -> Self {
        let document = result.documents.into_iter().next().map(|doc| AnalyzedDocument {
            doc_type: doc.doc_type,
            fields: flatten_document_fields(&doc.fields),
        });

        let key_value_pairs = result
            .key_value_pairs
            .into_iter()
            .filter_map(|pair| {
                let key = pair.key?.content.trim().to_string();
                if key.is_empty() {
                    return None;
                }
                Some(KeyValuePair {
                    key,
                    value: pair.value.map(|v| v.content.trim().to_string()),
                    confidence: pair.confidence,
                })
            })
            .collect();

        RawAnalysisResult {
            content: result.content,
            document,
            key_value_pairs,
        }
    }
}

/// Flatten nested object fields into dotted names (`Employee.Name`).
///
/// Arrays contribute their first element under the array's own name, so
/// `StateTaxInfos[0].State` becomes `StateTaxInfos.State`.
pub fn flatten_document_fields(fields: &BTreeMap<String, WireField>) -> BTreeMap<String, ProviderField> {
    let mut flat = BTreeMap::new();
    for (name, field) in fields {
        flatten_into(&mut flat, name, field);
    }
    flat
}

fn flatten_into(flat: &mut BTreeMap<String, ProviderField>, name: &str, field: &WireField) {
    if let Some(object) = &field.value_object {
        for (child_name, child) in object {
            flatten_into(flat, &format!("{}.{}", name, child_name), child);
        }
        // The object itself is kept when it has text, e.g. a whole address block.
        if field.content.is_none() {
            return;
        }
    }

    if let Some(first) = field.value_array.as_ref().and_then(|items| items.first()) {
        flatten_into(flat, name, first);
        return;
    }

    flat.insert(
        name.to_string(),
        ProviderField {
            value: field.scalar(),
            content: field.content.clone(),
            confidence: field.confidence,
        },
    );
}
