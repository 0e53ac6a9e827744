//! Tax form extraction service.

use std::sync::Arc;

use tracing::{info, warn};

use crate::analysis::{DocumentAnalyzer, RawAnalysisResult};
use crate::error::{AnalysisError, Result};
use crate::extraction::{DocumentProcessor, ExtractionResult};
use crate::models::{CanonicalRecord, DocumentType, ExtractionConfig, Form1099Document, W2Document};

#[cfg(feature = "native")]
use crate::analysis::HttpDocumentAnalyzer;
#[cfg(feature = "native")]
use crate::models::TaxFormConfig;

/// Sends documents to the provider and turns the results into records.
///
/// Immutable after construction; share it behind a reference or `Arc`.
#[derive(Clone)]
pub struct TaxFormService {
    analyzer: Arc<dyn DocumentAnalyzer>,
    processor: DocumentProcessor,
}

impl TaxFormService {
    /// Build the service with the HTTP provider client. Fails if the configuration is incomplete.
    #[cfg(feature = "native")]
    pub fn from_config(config: &TaxFormConfig) -> Result<Self> {
        config.validate()?;
        let analyzer = HttpDocumentAnalyzer::new(&config.provider)?;
        Ok(Self::with_analyzer(analyzer, &config.extraction))
    }

    /// Build the service around any provider implementation.
    pub fn with_analyzer(analyzer: impl DocumentAnalyzer + 'static, config: &ExtractionConfig) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            processor: DocumentProcessor::from_config(config),
        }
    }

    pub fn processor(&self) -> &DocumentProcessor {
        &self.processor
    }

    /// Run the provider on `document` with the model for `doc_type`.
    pub async fn analyze(&self, document: &[u8], doc_type: DocumentType) -> Result<RawAnalysisResult> {
        info!("Analyzing {} document ({} bytes)", doc_type, document.len());
        let raw = self.analyzer.analyze(document, doc_type.model_id()).await?;
        Ok(raw)
    }

    /// Process a provider result that is already at hand, e.g. one saved earlier.
    pub fn process_analysis(&self, raw: &RawAnalysisResult, doc_type: DocumentType) -> ExtractionResult {
        let result = self.processor.process(raw, doc_type);
        for warning in &result.warnings {
            warn!("{}", warning);
        }
        result
    }

    /// Analyze a document and return its canonical record. Missing fields are absent.
    pub async fn analyze_document(&self, document: &[u8], doc_type: DocumentType) -> Result<CanonicalRecord> {
        let raw = self.analyze(document, doc_type).await?;
        Ok(self.process_analysis(&raw, doc_type).record)
    }

    /// Analyze a W-2 and return it with every W-2 key present.
    pub async fn process_w2_document(&self, document: &[u8]) -> Result<W2Document> {
        let record = self.analyze_document(document, DocumentType::W2).await?;
        Ok(W2Document::from_record(record))
    }

    /// Analyze a 1099 of the given variant and return it with every key of that variant present.
    pub async fn process_1099_document(
        &self,
        document: &[u8],
        doc_type: DocumentType,
    ) -> Result<Form1099Document> {
        if !doc_type.is_1099() {
            return Err(AnalysisError::UnsupportedDocumentType(doc_type.to_string()).into());
        }
        let record = self.analyze_document(document, doc_type).await?;
        Ok(Form1099Document::from_record(record, doc_type)?)
    }
}
