//! LLM provider factory.
//!
//! Builds a shared completion client from the configured provider name.

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use crate::types::ProviderType;
use civic_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `timeout` - Optional per-request timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or the HTTP client
/// cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    timeout: Option<Duration>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown LLM provider: {}", provider)))?;

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or(OllamaClient::DEFAULT_BASE_URL);
            let client = match timeout {
                Some(timeout) => OllamaClient::with_timeout(base_url, timeout)?,
                None => OllamaClient::with_base_url(base_url),
            };
            tracing::debug!("Created Ollama completion client for {}", base_url);
            Ok(Arc::new(client))
        }
    }
}
