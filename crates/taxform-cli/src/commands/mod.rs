//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod output;
pub mod process;

use std::path::{Path, PathBuf};

use tracing::debug;

use taxform_core::TaxFormConfig;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taxform")
        .join("config.json")
}

/// Config file to use: the `--config` argument, else the default location.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration file if it exists, then apply environment overrides.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<TaxFormConfig> {
    let path = config_file(config_path);

    let mut config = if path.exists() {
        debug!("Loading configuration from {}", path.display());
        TaxFormConfig::from_file(&path)?
    } else if config_path.is_some() {
        anyhow::bail!("Config file not found: {}", path.display());
    } else {
        TaxFormConfig::default()
    };

    config.apply_env_overrides();
    Ok(config)
}

/// Read a saved provider result from a JSON file.
pub fn read_analysis(path: &Path) -> anyhow::Result<taxform_core::RawAnalysisResult> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid analysis file {}: {}", path.display(), e))
}
