//! Test doubles shared by the answering tests.

use crate::types::{DocumentMetadata, IndexedDocument, ScoredDocument};
use async_trait::async_trait;
use civic_core::{AppError, AppResult};
use civic_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use serde_json::Map;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Completion client that records every request and answers from a script.
pub struct RecordingClient {
    answer: String,
    failing: AtomicBool,
    calls: AtomicUsize,
    last: Mutex<Option<LlmRequest>>,
}

impl RecordingClient {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        let client = Self::answering("");
        client.set_failing(true);
        client
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last.lock().unwrap().as_ref().map(|r| r.prompt.clone())
    }

    pub fn last_model(&self) -> Option<String> {
        self.last.lock().unwrap().as_ref().map(|r| r.model.clone())
    }

    pub fn last_request(&self) -> Option<LlmRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for RecordingClient {
    fn provider_name(&self) -> &str {
        "recording"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());

        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Generation("connection refused".to_string()));
        }

        Ok(LlmResponse {
            content: self.answer.clone(),
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

/// A scored document whose body is composed the way the store composes it.
pub fn scored(id: &str, title: &str, category: &str, content: &str) -> ScoredDocument {
    ScoredDocument {
        document: IndexedDocument {
            id: id.to_string(),
            body: crate::document::compose_body(title, category, content),
            metadata: DocumentMetadata {
                id: id.to_string(),
                title: title.to_string(),
                category: category.to_string(),
                subcategory: String::new(),
                attributes: Map::new(),
            },
        },
        score: 1.0,
    }
}
