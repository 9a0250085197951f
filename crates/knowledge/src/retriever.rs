//! Similarity search over a knowledge store.

use crate::embeddings::EmbeddingProvider;
use crate::storage::VectorStorage;
use crate::types::ScoredDocument;
use civic_core::{AppError, AppResult};
use std::sync::Arc;

/// Documents retrieved per query when no `k` is given.
pub const DEFAULT_TOP_K: usize = 3;

/// What a retrieval produced. An empty store is a normal outcome.
#[derive(Debug, Clone)]
pub enum RetrievalOutcome {
    /// Nothing to ground an answer on
    Empty,

    /// Documents ordered by descending similarity, never empty
    Found(Vec<ScoredDocument>),
}

/// Embeds queries and ranks stored documents against them.
///
/// Read-only: shares the store with its owner and holds no document copies.
#[derive(Clone)]
pub struct Retriever {
    storage: Arc<dyn VectorStorage>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    pub fn new(storage: Arc<dyn VectorStorage>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { storage, embedder }
    }

    /// Up to `k` documents most similar to `query`, best first.
    ///
    /// # Errors
    /// `AppError::InvalidInput` if `k` is zero; embedding and storage
    /// failures are propagated.
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<ScoredDocument>> {
        if k == 0 {
            return Err(AppError::InvalidInput(
                "k must be a positive integer".to_string(),
            ));
        }

        if self.storage.count()? == 0 {
            tracing::debug!("Store is empty, skipping query embedding");
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        if query_embedding.len() != self.embedder.dimensions() {
            return Err(AppError::Embedding(format!(
                "Query embedding has {} dimensions, expected {}",
                query_embedding.len(),
                self.embedder.dimensions()
            )));
        }

        let results = self.storage.query_top_k(&query_embedding, k)?;

        if let Some(best) = results.first() {
            tracing::debug!(
                "Top match '{}' (score {:.3}) of {} results",
                best.document.id,
                best.score,
                results.len()
            );
        }

        Ok(results)
    }

    /// Like [`Retriever::search`], but with the empty case made explicit.
    pub async fn retrieve(&self, query: &str, k: usize) -> AppResult<RetrievalOutcome> {
        let results = self.search(query, k).await?;
        if results.is_empty() {
            Ok(RetrievalOutcome::Empty)
        } else {
            Ok(RetrievalOutcome::Found(results))
        }
    }
}
