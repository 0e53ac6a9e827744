//! Document-analysis provider contract.
//!
//! The provider is an external OCR + layout service. This module defines the
//! shape of its result as consumed by extraction, the [`DocumentAnalyzer`]
//! trait the service talks to, and (with the `native` feature) an HTTP
//! implementation.

#[cfg(feature = "native")]
mod http;
mod wire;

#[cfg(feature = "native")]
pub use http::HttpDocumentAnalyzer;
pub use wire::{flatten_document_fields, WireAnalyzeResult};

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AnalysisError;

/// Raw result of one provider analysis call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnalysisResult {
    /// Full OCR text of the document.
    #[serde(default)]
    pub content: String,

    /// Primary analyzed document, if the model produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<AnalyzedDocument>,

    /// Key-value pairs found outside the form model (tables, free layout).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_value_pairs: Vec<KeyValuePair>,
}

impl RawAnalysisResult {
    /// Result carrying only OCR text.
    pub fn from_text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Fields of the primary document, if any.
    pub fn fields(&self) -> Option<&BTreeMap<String, ProviderField>> {
        self.document.as_ref().map(|d| &d.fields)
    }
}

/// A document recognized by the provider's model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedDocument {
    /// Provider document type, e.g. `tax.us.w2`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,

    /// Field name to value, nested fields flattened to dotted names.
    #[serde(default)]
    pub fields: BTreeMap<String, ProviderField>,
}

/// A single structured field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderField {
    /// Typed value as returned by the provider: string, number, or something else.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Text the value was read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Provider confidence (0.0 - 1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl ProviderField {
    /// Field with a value and confidence.
    pub fn new(value: impl Into<Value>, confidence: f32) -> Self {
        Self {
            value: Some(value.into()),
            content: None,
            confidence: Some(confidence),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Whether the provider returned a typed value. Blank strings do not count.
    pub fn has_value(&self) -> bool {
        match &self.value {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// Whether the field carries anything usable: a typed value or non-empty content.
    pub fn is_defined(&self) -> bool {
        self.has_value() || self.content.as_deref().is_some_and(|c| !c.trim().is_empty())
    }

    /// Whether confidence is at least `min`. Fields without a confidence pass.
    pub fn meets_confidence(&self, min: f32) -> bool {
        self.confidence.is_none_or(|c| c >= min)
    }

    /// Value to feed the amount normalizer: the typed value, else the content string.
    pub fn amount_source(&self) -> Option<Value> {
        if self.has_value() {
            self.value.clone()
        } else {
            self.content.clone().map(Value::String)
        }
    }

    /// Text form: strings as-is, scalars in their textual form, structured values via content.
    pub fn text_value(&self) -> Option<String> {
        match &self.value {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            Some(other @ (Value::Array(_) | Value::Object(_))) => {
                self.content.clone().or_else(|| Some(other.to_string()))
            }
            Some(Value::String(_) | Value::Null) | None => {
                self.content.clone().filter(|c| !c.trim().is_empty())
            }
        }
    }
}

/// A key-value pair from the provider's layout analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl KeyValuePair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            confidence: None,
        }
    }
}

/// External document-analysis provider.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Submit `document` for analysis with the given model and wait for the result.
    async fn analyze(
        &self,
        document: &[u8],
        model_id: &str,
    ) -> Result<RawAnalysisResult, AnalysisError>;
}
