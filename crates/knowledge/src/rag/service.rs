//! The question/answer contract.

use crate::rag::compose::AnswerComposer;
use crate::retriever::{RetrievalOutcome, Retriever, DEFAULT_TOP_K};
use crate::types::Source;
use civic_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Sources listed with an answer, independent of retrieval `k`.
pub const MAX_SOURCES_RETURNED: usize = 3;

/// Answer given when nothing was retrieved.
pub const NO_INFORMATION_ANSWER: &str =
    "I couldn't find specific information for your query in the knowledge base.";

/// Answer plus the documents it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<Source>,
}

impl QueryResponse {
    /// Canned response for an empty retrieval.
    pub fn no_information() -> Self {
        Self {
            answer: NO_INFORMATION_ANSWER.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Retrieval and answer limits.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub top_k: usize,
    pub max_sources: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_sources: MAX_SOURCES_RETURNED,
        }
    }
}

/// Stateless per call; safe to share across concurrent requests.
pub struct QueryService {
    retriever: Retriever,
    composer: AnswerComposer,
    options: QueryOptions,
}

impl QueryService {
    pub fn new(retriever: Retriever, composer: AnswerComposer, options: QueryOptions) -> Self {
        Self {
            retriever,
            composer,
            options,
        }
    }

    /// Retrieve, compose and attach sources.
    ///
    /// An empty retrieval short-circuits to [`QueryResponse::no_information`]
    /// without calling the model.
    pub async fn handle_query(&self, question: &str) -> AppResult<QueryResponse> {
        if question.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Question text must not be empty".to_string(),
            ));
        }

        tracing::info!("Searching knowledge base for: {}", question);

        let documents = match self.retriever.retrieve(question, self.options.top_k).await? {
            RetrievalOutcome::Empty => {
                tracing::info!("No relevant documents found in knowledge base");
                return Ok(QueryResponse::no_information());
            }
            RetrievalOutcome::Found(documents) => documents,
        };

        tracing::info!("Retrieved {} documents, invoking answer chain", documents.len());

        let answer = self.composer.compose(question, &documents).await?;

        let sources = documents
            .iter()
            .take(self.options.max_sources)
            .map(|scored| Source::from(&scored.document))
            .collect();

        Ok(QueryResponse { answer, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use crate::rag::testing::RecordingClient;
    use crate::storage::SqliteStorage;
    use crate::store::{KnowledgeStore, StoreOptions};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn service_over(
        temp: &TempDir,
        knowledge_base: &str,
        client: Arc<RecordingClient>,
        options: QueryOptions,
    ) -> QueryService {
        let kb = temp.path().join("kb.json");
        std::fs::write(&kb, knowledge_base).unwrap();

        let storage = Arc::new(SqliteStorage::open(&temp.path().join("store.sqlite")).unwrap());
        let store = KnowledgeStore::new(
            storage,
            Arc::new(TrigramProvider::new(256)),
            StoreOptions::default(),
        )
        .unwrap();
        store.build(&kb).await.unwrap();

        QueryService::new(
            store.retriever(),
            AnswerComposer::new(client, "llama2"),
            options,
        )
    }

    #[tokio::test]
    async fn test_scenario_single_permit() {
        let temp = TempDir::new().unwrap();
        let client = Arc::new(RecordingClient::answering("Apply online at city hall."));
        let service = service_over(
            &temp,
            r#"{"permits": [{"id": "p1", "title": "Building Permit", "content": "Apply online at city hall."}]}"#,
            client.clone(),
            QueryOptions::default(),
        )
        .await;

        let response = service
            .handle_query("How do I apply for a building permit?")
            .await
            .unwrap();

        assert_eq!(response.answer, "Apply online at city hall.");
        assert_eq!(
            response.sources,
            vec![Source {
                title: "Building Permit".to_string(),
                category: "permits".to_string()
            }]
        );
        assert!(client
            .last_prompt()
            .unwrap()
            .contains("Source Title: Building Permit"));
    }

    #[tokio::test]
    async fn test_scenario_empty_knowledge_base() {
        let temp = TempDir::new().unwrap();
        let client = Arc::new(RecordingClient::answering("should not be used"));
        let service = service_over(&temp, r#"{"misc": []}"#, client.clone(), QueryOptions::default()).await;

        for question in ["Where is city hall?", "When is trash pickup?"] {
            let response = service.handle_query(question).await.unwrap();
            assert_eq!(response, QueryResponse::no_information());
        }
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_scenario_provider_failure_then_recovery() {
        let temp = TempDir::new().unwrap();
        let client = Arc::new(RecordingClient::failing());
        let service = service_over(
            &temp,
            r#"{"permits": [{"id": "p1", "title": "Building Permit", "content": "Apply online."}]}"#,
            client.clone(),
            QueryOptions::default(),
        )
        .await;

        let first = service.handle_query("permit?").await;
        assert!(matches!(first, Err(AppError::Generation(_))));

        client.set_failing(false);
        let second = service.handle_query("permit?").await.unwrap();
        assert_eq!(second.sources.len(), 1);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_sources_capped_independently_of_k() {
        let temp = TempDir::new().unwrap();
        let client = Arc::new(RecordingClient::answering("ok"));
        let service = service_over(
            &temp,
            r#"{"services": [
                {"title": "Water billing", "content": "Pay online."},
                {"title": "Water outages", "content": "Call the hotline."},
                {"title": "Water quality", "content": "Annual report."},
                {"title": "Water meters", "content": "Meter reading schedule."},
                {"title": "Water leaks", "content": "Report leaks."}
            ]}"#,
            client.clone(),
            QueryOptions {
                top_k: 5,
                max_sources: MAX_SOURCES_RETURNED,
            },
        )
        .await;

        let response = service.handle_query("water").await.unwrap();
        assert_eq!(response.sources.len(), 3);
        assert_eq!(client.last_prompt().unwrap().matches("Source Title:").count(), 5);
    }

    #[tokio::test]
    async fn test_duplicate_title_category_is_not_deduplicated() {
        let temp = TempDir::new().unwrap();
        let client = Arc::new(RecordingClient::answering("ok"));
        let service = service_over(
            &temp,
            r#"{"parks": [
                {"id": "a", "title": "Dog Park", "content": "North side."},
                {"id": "b", "title": "Dog Park", "content": "South side."}
            ]}"#,
            client,
            QueryOptions::default(),
        )
        .await;

        let response = service.handle_query("dog park").await.unwrap();
        assert_eq!(response.sources.len(), 2);
        assert_eq!(response.sources[0], response.sources[1]);
    }

    #[tokio::test]
    async fn test_blank_question_is_invalid_input() {
        let temp = TempDir::new().unwrap();
        let client = Arc::new(RecordingClient::answering("ok"));
        let service = service_over(&temp, r#"{"misc": []}"#, client, QueryOptions::default()).await;

        let result = service.handle_query("   ").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
