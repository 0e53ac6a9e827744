//! Configuration structures for the extraction service.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, TaxFormError};

/// Environment variable overriding [`ProviderConfig::endpoint`].
pub const ENV_ENDPOINT: &str = "TAXFORM_ENDPOINT";
/// Environment variable overriding [`ProviderConfig::api_key`].
pub const ENV_API_KEY: &str = "TAXFORM_API_KEY";
/// Environment variable overriding [`ProviderConfig::api_version`].
pub const ENV_API_VERSION: &str = "TAXFORM_API_VERSION";

/// Main configuration for taxform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxFormConfig {
    /// Document-analysis provider configuration.
    pub provider: ProviderConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Document-analysis provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the provider resource, e.g. `https://name.cognitiveservices.azure.com`.
    pub endpoint: String,

    /// Subscription key. Usually supplied through `TAXFORM_API_KEY` rather than the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// REST API version sent with every request.
    pub api_version: String,

    /// Delay between status polls, in milliseconds.
    pub poll_interval_ms: u64,

    /// Number of status polls before giving up.
    pub max_poll_attempts: u32,

    /// Timeout for each HTTP request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            api_version: "2024-11-30".to_string(),
            poll_interval_ms: 1000,
            max_poll_attempts: 60,
            request_timeout_secs: 30,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Provider fields below this confidence are treated as missing (0.0 disables the check).
    pub min_field_confidence: f32,

    /// Recover missing W-2 fields from the OCR text.
    pub recover_w2_fields: bool,

    /// Let SSN recovery fall back to any `NNN-NN-NNNN` shape in the text.
    pub allow_unanchored_ssn: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_field_confidence: 0.0,
            recover_w2_fields: true,
            allow_unanchored_ssn: true,
        }
    }
}

impl TaxFormConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `TAXFORM_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = get(ENV_ENDPOINT) {
            self.provider.endpoint = endpoint;
        }
        if let Some(api_key) = get(ENV_API_KEY) {
            self.provider.api_key = Some(api_key);
        }
        if let Some(api_version) = get(ENV_API_VERSION) {
            self.provider.api_version = api_version;
        }
    }

    /// Check that the provider can be reached with this configuration.
    pub fn validate(&self) -> Result<()> {
        let provider = &self.provider;

        if provider.endpoint.trim().is_empty() {
            return Err(TaxFormError::Config(format!(
                "provider endpoint is not set (config file or {})",
                ENV_ENDPOINT
            )));
        }
        if !provider.endpoint.starts_with("http://") && !provider.endpoint.starts_with("https://") {
            return Err(TaxFormError::Config(format!(
                "provider endpoint must be an http(s) URL: {}",
                provider.endpoint
            )));
        }
        if provider.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(TaxFormError::Config(format!(
                "provider API key is not set ({})",
                ENV_API_KEY
            )));
        }
        if provider.api_version.trim().is_empty() {
            return Err(TaxFormError::Config("provider api_version is empty".to_string()));
        }
        if provider.max_poll_attempts == 0 {
            return Err(TaxFormError::Config("max_poll_attempts must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.extraction.min_field_confidence) {
            return Err(TaxFormError::Config(format!(
                "min_field_confidence must be between 0.0 and 1.0, got {}",
                self.extraction.min_field_confidence
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn configured() -> TaxFormConfig {
        let mut config = TaxFormConfig::default();
        config.provider.endpoint = "https://forms.example.com".to_string();
        config.provider.api_key = Some("secret".to_string());
        config
    }

    #[test]
    fn test_defaults() {
        let config = TaxFormConfig::default();
        assert_eq!(config.extraction.min_field_confidence, 0.0);
        assert!(config.extraction.recover_w2_fields);
        assert!(config.extraction.allow_unanchored_ssn);
        assert_eq!(config.provider.max_poll_attempts, 60);
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let config: TaxFormConfig =
            serde_json::from_str(r#"{"provider": {"endpoint": "https://x.example.com"}}"#).unwrap();
        assert_eq!(config.provider.endpoint, "https://x.example.com");
        assert_eq!(config.provider.poll_interval_ms, 1000);
        assert!(config.extraction.recover_w2_fields);
    }

    #[test]
    fn test_validate_rejects_missing_endpoint_and_key() {
        let mut config = configured();
        assert!(config.validate().is_ok());

        config.provider.api_key = None;
        assert!(matches!(config.validate(), Err(TaxFormError::Config(_))));

        let mut config = configured();
        config.provider.endpoint = "  ".to_string();
        assert!(matches!(config.validate(), Err(TaxFormError::Config(_))));

        let mut config = configured();
        config.provider.endpoint = "forms.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "https://env.example.com"),
            (ENV_API_KEY, "from-env"),
            (ENV_API_VERSION, ""),
        ]
        .into_iter()
        .collect();

        let mut config = TaxFormConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.provider.endpoint, "https://env.example.com");
        assert_eq!(config.provider.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.provider.api_version, "2024-11-30");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = configured();
        config.save(&path).unwrap();
        let loaded = TaxFormConfig::from_file(&path).unwrap();
        assert_eq!(loaded.provider.endpoint, config.provider.endpoint);
        assert_eq!(loaded.provider.api_key, config.provider.api_key);
    }
}
