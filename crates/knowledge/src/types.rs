//! Knowledge base types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One fact or service record read from the knowledge-base file.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeEntry {
    /// Unique within the store
    pub id: String,

    pub title: String,

    /// Top-level grouping the entry was listed under
    pub category: String,

    /// The entry's own `category` field, empty when absent
    pub subcategory: String,

    pub content: String,

    /// Every other field of the entry, carried unchanged
    pub attributes: Map<String, Value>,
}

/// Keys [`DocumentMetadata`] writes itself; never carried as attributes.
pub const RESERVED_METADATA_KEYS: &[&str] = &["id", "title", "category", "subcategory"];

/// Metadata stored beside each indexed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// The retrievable unit: a composed text body plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: String,
    pub body: String,
    pub metadata: DocumentMetadata,
}

/// A document paired with its similarity to a query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub document: IndexedDocument,
    pub score: f32,
}

/// Response-facing projection of document metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub category: String,
}

impl From<&IndexedDocument> for Source {
    fn from(document: &IndexedDocument) -> Self {
        Self {
            title: document.metadata.title.clone(),
            category: document.metadata.category.clone(),
        }
    }
}

/// Facts recorded when a build completes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreManifest {
    pub embedding_provider: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub built_at: DateTime<Utc>,
    /// SHA-256 of the knowledge-base file the store was built from
    pub source_sha256: String,
}

/// Result of [`crate::KnowledgeStore::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Documents were embedded and written
    Built { documents: usize },

    /// The store was already populated and left untouched
    AlreadyBuilt {
        documents: usize,
        /// The knowledge-base file changed since the store was built
        stale: bool,
    },
}

impl BuildOutcome {
    /// Number of documents in the store after the call.
    pub fn documents(&self) -> usize {
        match self {
            Self::Built { documents } | Self::AlreadyBuilt { documents, .. } => *documents,
        }
    }
}

/// Statistics for a knowledge store.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub documents: usize,
    pub manifest: Option<StoreManifest>,
    pub db_size_bytes: u64,
    /// `None` when the knowledge-base file could not be read
    pub source_changed: Option<bool>,
}
