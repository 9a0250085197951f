//! Router, bootstrap and client tests against a real store.


use async_trait::async_trait;
use civic_core::{AppConfig, AppError, AppResult};
use civic_knowledge::embeddings::providers::TrigramProvider;
use civic_knowledge::{
    AnswerComposer, KnowledgeStore, QueryOptions, QueryService, SqliteStorage, StoreOptions,
};
use civic_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::sync::Arc;
use tempfile::TempDir;

use crate::state::AppState;

pub const CITY_KB: &str = r#"{
    "knowledge_base": {
        "permits": [
            {"id": "p1", "title": "Building Permit", "content": "Apply for a building permit online at city hall."},
            {"id": "p2", "title": "Event Permit", "content": "Submit event permit requests 30 days ahead."}
        ],
        "transport": [
            {"id": "t1", "title": "Bus Passes", "content": "Monthly bus passes are sold at transit kiosks."}
        ],
        "waste": [
            {"id": "w1", "title": "Recycling Pickup", "content": "Recycling is collected every Tuesday."}
        ]
    }
}"#;

/// Completion client with a fixed outcome.
pub struct StubClient {
    answer: Option<String>,
}

impl StubClient {
    pub fn answering(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Some(answer.to_string()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { answer: None })
    }
}

#[async_trait]
impl LlmClient for StubClient {
    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        match &self.answer {
            Some(answer) => Ok(LlmResponse {
                content: answer.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            }),
            None => Err(AppError::Generation("connection refused".to_string())),
        }
    }
}

/// Build a store from `kb` and wire it to `client`.
pub async fn ready_state(temp: &TempDir, kb: &str, client: Arc<StubClient>) -> AppState {
    let kb_path = temp.path().join("knowledge.json");
    std::fs::write(&kb_path, kb).unwrap();

    let storage = Arc::new(SqliteStorage::open(&temp.path().join("store.sqlite")).unwrap());
    let store = KnowledgeStore::new(
        storage,
        Arc::new(TrigramProvider::new(256)),
        StoreOptions::default(),
    )
    .unwrap();
    store.build(&kb_path).await.unwrap();

    let service = QueryService::new(
        store.retriever(),
        AnswerComposer::new(client, "llama2"),
        QueryOptions::default(),
    );
    AppState::ready(service)
}

/// Config pointing at an offline workspace in `temp`.
pub fn offline_config(temp: &TempDir) -> AppConfig {
    let mut config = AppConfig {
        workspace: temp.path().to_path_buf(),
        ..AppConfig::default()
    };
    config.embedding.provider = "trigram".to_string();
    config.embedding.dimensions = 256;
    config
}
