//! Data models for extraction output and configuration.

pub mod config;
pub mod forms;
pub mod record;

pub use config::{ExtractionConfig, ProviderConfig, TaxFormConfig};
pub use forms::{Form1099Document, W2Document};
pub use record::{CanonicalRecord, DocumentType, FieldValue, DOCUMENT_TYPE_KEY, FULL_TEXT_KEY};
