//! Knowledge base for the Smart City Assistant.
//!
//! Loads a JSON knowledge base of city services and facts, embeds one
//! document per entry into a local SQLite store, and answers questions with
//! retrieval-augmented generation:
//!
//! question → [`Retriever`] → [`AnswerComposer`] → [`QueryResponse`]

pub mod document;
pub mod embeddings;
pub mod loader;
pub mod rag;
pub mod retriever;
pub mod storage;
pub mod store;
pub mod types;


// Re-export commonly used types
pub use rag::{AnswerComposer, QueryOptions, QueryResponse, QueryService};
pub use retriever::{RetrievalOutcome, Retriever, DEFAULT_TOP_K};
pub use storage::{SqliteStorage, VectorStorage};
pub use store::{KnowledgeStore, StoreOptions};
pub use types::{
    BuildOutcome, DocumentMetadata, IndexedDocument, KnowledgeEntry, ScoredDocument, Source,
    StoreManifest, StoreStats,
};
