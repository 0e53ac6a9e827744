//! Error types for the taxform-core library.

use thiserror::Error;

/// Main error type for the taxform library.
#[derive(Error, Debug)]
pub enum TaxFormError {
    /// Document analysis by the provider failed.
    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the external document-analysis provider call.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The submit response carried no operation URL to poll.
    #[error("provider response has no Operation-Location header")]
    MissingOperationLocation,

    /// The provider reported the analysis operation as failed.
    #[error("analysis operation failed: {0}")]
    Failed(String),

    /// Polling gave up before the operation completed.
    #[error("analysis did not complete after {attempts} polls")]
    Timeout { attempts: u32 },

    /// The provider result could not be decoded.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// The requested operation does not accept this document type.
    #[error("unsupported document type: {0}")]
    UnsupportedDocumentType(String),
}

/// Result type for the taxform library.
pub type Result<T> = std::result::Result<T, TaxFormError>;
