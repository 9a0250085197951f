//! Embedding configuration.

use civic_core::config::EmbeddingSettings;
use serde::{Deserialize, Serialize};

/// Settings needed to construct an embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "ollama" or "trigram"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Number of texts embedded per provider call during a build
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Provider endpoint, for HTTP-backed providers
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_batch_size() -> usize {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::from(&EmbeddingSettings::default())
    }
}

impl From<&EmbeddingSettings> for EmbeddingConfig {
    fn from(settings: &EmbeddingSettings) -> Self {
        Self {
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            batch_size: settings.batch_size,
            endpoint: Some(settings.endpoint.clone()),
            timeout_secs: settings.timeout_secs,
        }
    }
}

impl EmbeddingConfig {
    /// Offline configuration used in development and tests.
    pub fn trigram(dimensions: usize) -> Self {
        Self {
            provider: "trigram".to_string(),
            model: super::providers::trigram::TRIGRAM_MODEL.to_string(),
            dimensions,
            batch_size: default_batch_size(),
            endpoint: None,
            timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "mxbai-embed-large");
        assert_eq!(config.dimensions, 1024);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:11434"));
    }

    #[test]
    fn test_trigram_config() {
        let config = EmbeddingConfig::trigram(256);
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.model, "trigram-v1");
        assert_eq!(config.dimensions, 256);
        assert!(config.endpoint.is_none());
    }
}
