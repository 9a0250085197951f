//! Grounded answer generation.

use crate::types::ScoredDocument;
use civic_core::{AppError, AppResult};
use civic_llm::{LlmClient, LlmRequest};
use civic_prompt::{answer_prompt, build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;

/// Context handed to the model when no documents were retrieved.
pub const NO_CONTEXT_SENTINEL: &str = "No relevant information found in the knowledge base.";

/// Formats retrieved documents into a prompt and asks the model once.
pub struct AnswerComposer {
    client: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl AnswerComposer {
    /// Composer using the built-in answer prompt.
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self::with_prompt(client, model, answer_prompt())
    }

    pub fn with_prompt(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        prompt: PromptDefinition,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            prompt,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Sampling options passed through to every completion request.
    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// One block per document, in retrieval order.
    pub fn format_context(documents: &[ScoredDocument]) -> String {
        if documents.is_empty() {
            return NO_CONTEXT_SENTINEL.to_string();
        }

        documents
            .iter()
            .map(|scored| {
                let document = &scored.document;
                format!(
                    "Source Title: {}\nCategory: {}\nContent: {}\n---",
                    document.metadata.title, document.metadata.category, document.body
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Answer `question` from `documents` with a single completion request.
    ///
    /// The model's text is returned unmodified. Any provider failure is
    /// reported as `AppError::Generation`.
    pub async fn compose(&self, question: &str, documents: &[ScoredDocument]) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("context".to_string(), Self::format_context(documents));
        variables.insert("question".to_string(), question.to_string());

        let built = build_prompt(&self.prompt, variables)?;

        tracing::debug!(
            "Invoking {} ({}) with {} context documents",
            self.client.provider_name(),
            self.model,
            documents.len()
        );

        let mut request = LlmRequest::new(built.user, self.model.clone());
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self
            .client
            .complete(&request)
            .await
            .map_err(|e| match e {
                AppError::Generation(_) => e,
                other => AppError::Generation(other.to_string()),
            })?;

        Ok(response.content)
    }
}
