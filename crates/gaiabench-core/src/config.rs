use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use gaiabench_store::StoreConfig;

use crate::ingest::IngestConfig;
use crate::llm::LlmConfig;

/// Top-level configuration. Every field has a usable default; secrets come
/// from the environment rather than the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl AppConfig {
    /// Load from an optional YAML file, then apply environment overrides.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("failed to read config {path:?}"))?;
                serde_yaml::from_str(&content)
                    .with_context(|| format!("invalid config {path:?}"))?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.llm.api_key = key;
        }
        if let Ok(base) = std::env::var("OPENAI_API_BASE") {
            self.llm.api_base = base;
        }
        if let Ok(token) = std::env::var("GAIA_STORE_TOKEN") {
            self.store.token = Some(token);
        }
        if let Ok(token) = std::env::var("HF_TOKEN") {
            self.ingest.token = Some(token);
        }
    }
}
