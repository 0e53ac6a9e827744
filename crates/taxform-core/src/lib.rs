//! Core library for US tax form extraction.
//!
//! This crate provides:
//! - The document-analysis provider contract and an HTTP client for it
//! - Provider field mapping for W-2 and 1099 variants
//! - Rule-based recovery of W-2 fields from raw OCR text
//! - US address decomposition
//! - Typed W-2 and 1099 outputs

pub mod analysis;
pub mod error;
pub mod extraction;
pub mod models;
pub mod service;

pub use analysis::{DocumentAnalyzer, KeyValuePair, ProviderField, RawAnalysisResult};
#[cfg(feature = "native")]
pub use analysis::HttpDocumentAnalyzer;
pub use error::{AnalysisError, Result, TaxFormError};
pub use extraction::rules::{decompose_address, normalize_amount, AddressParts};
pub use extraction::{DocumentProcessor, ExtractionResult};
pub use models::{
    CanonicalRecord, DocumentType, ExtractionConfig, FieldValue, Form1099Document, ProviderConfig,
    TaxFormConfig, W2Document,
};
pub use service::TaxFormService;
