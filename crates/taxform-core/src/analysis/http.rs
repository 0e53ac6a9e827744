//! HTTP document-analysis client.
//!
//! Submits a document with `POST .../documentModels/{model}:analyze`, then
//! polls the URL from the `Operation-Location` response header until the
//! operation succeeds or fails.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::{debug, info};

use super::wire::WireOperation;
use super::{DocumentAnalyzer, RawAnalysisResult};
use crate::error::{AnalysisError, Result, TaxFormError};
use crate::models::config::ProviderConfig;

const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION_HEADER: &str = "operation-location";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    base64_source: String,
}

/// Provider client speaking the document-intelligence REST API.
pub struct HttpDocumentAnalyzer {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl HttpDocumentAnalyzer {
    /// Build a client from provider configuration. Endpoint and key must be set.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TaxFormError::Config("provider API key is not set".to_string()))?;

        if config.endpoint.trim().is_empty() {
            return Err(TaxFormError::Config("provider endpoint is not set".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("taxform/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TaxFormError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            api_version: config.api_version.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_poll_attempts: config.max_poll_attempts.max(1),
        })
    }

    fn analyze_url(&self, model_id: &str) -> String {
        format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}",
            self.endpoint, model_id, self.api_version
        )
    }

    async fn submit(&self, document: &[u8], model_id: &str) -> std::result::Result<String, AnalysisError> {
        let request = AnalyzeRequest {
            base64_source: base64::engine::general_purpose::STANDARD.encode(document),
        };

        let response = self
            .client
            .post(self.analyze_url(model_id))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        let response = ensure_success(response).await?;
        operation_location(response.headers())
    }

    async fn poll(&self, operation_url: &str) -> std::result::Result<RawAnalysisResult, AnalysisError> {
        for attempt in 1..=self.max_poll_attempts {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(operation_url)
                .header(API_KEY_HEADER, &self.api_key)
                .send()
                .await
                .map_err(|e| AnalysisError::Request(e.to_string()))?;

            let response = ensure_success(response).await?;
            let body = response
                .text()
                .await
                .map_err(|e| AnalysisError::Request(e.to_string()))?;
            let operation: WireOperation =
                serde_json::from_str(&body).map_err(|e| AnalysisError::Malformed(e.to_string()))?;

            debug!("Poll {}/{}: status {}", attempt, self.max_poll_attempts, operation.status);

            match operation.status.to_ascii_lowercase().as_str() {
                "succeeded" => {
                    let result = operation.analyze_result.ok_or_else(|| {
                        AnalysisError::Malformed("succeeded operation has no analyzeResult".to_string())
                    })?;
                    return Ok(result.into());
                }
                "failed" | "canceled" => {
                    let reason = operation
                        .error
                        .map(|e| e.describe())
                        .unwrap_or_else(|| operation.status.clone());
                    return Err(AnalysisError::Failed(reason));
                }
                _ => {}
            }
        }

        Err(AnalysisError::Timeout {
            attempts: self.max_poll_attempts,
        })
    }
}

#[async_trait]
impl DocumentAnalyzer for HttpDocumentAnalyzer {
    async fn analyze(
        &self,
        document: &[u8],
        model_id: &str,
    ) -> std::result::Result<RawAnalysisResult, AnalysisError> {
        info!("Submitting {} bytes for analysis with {}", document.len(), model_id);

        let operation_url = self.submit(document, model_id).await?;
        debug!("Analysis accepted, polling {}", operation_url);

        let result = self.poll(&operation_url).await?;
        info!(
            "Analysis complete: {} chars of text, {} fields",
            result.content.len(),
            result.fields().map_or(0, |f| f.len())
        );
        Ok(result)
    }
}

async fn ensure_success(response: Response) -> std::result::Result<Response, AnalysisError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AnalysisError::Api {
        status: status.as_u16(),
        body,
    })
}

fn operation_location(headers: &HeaderMap) -> std::result::Result<String, AnalysisError> {
    headers
        .get(OPERATION_LOCATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or(AnalysisError::MissingOperationLocation)
}
