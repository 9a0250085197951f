//! The knowledge store: one-time build from a knowledge-base file, then
//! read-only similarity search.

use crate::document::compose_document;
use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::loader::{file_digest, load_knowledge_base};
use crate::retriever::Retriever;
use crate::storage::{SqliteStorage, VectorStorage};
use crate::types::{BuildOutcome, IndexedDocument, ScoredDocument, StoreManifest, StoreStats};
use chrono::Utc;
use civic_core::{AppConfig, AppError, AppResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Options that shape how entries are loaded and embedded.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Reject entries without an explicit id
    pub require_ids: bool,

    /// Texts per embedding call during a build
    pub batch_size: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            require_ids: false,
            batch_size: 32,
        }
    }
}

/// Persistent vector store for knowledge-base documents.
pub struct KnowledgeStore {
    storage: Arc<dyn VectorStorage>,
    embedder: Arc<dyn EmbeddingProvider>,
    options: StoreOptions,
    sqlite_file: Option<Arc<SqliteStorage>>,
}

impl KnowledgeStore {
    /// Assemble a store from its parts.
    ///
    /// Fails with `AppError::Config` if the storage was built with a
    /// different embedding provider, model or dimension count.
    pub fn new(
        storage: Arc<dyn VectorStorage>,
        embedder: Arc<dyn EmbeddingProvider>,
        options: StoreOptions,
    ) -> AppResult<Self> {
        let store = Self {
            storage,
            embedder,
            options,
            sqlite_file: None,
        };
        store.ensure_embedding_compatible()?;
        Ok(store)
    }

    /// Open the SQLite store named by the application config.
    pub fn open(config: &AppConfig) -> AppResult<Self> {
        let embedder = create_provider(&EmbeddingConfig::from(&config.embedding))?;
        let sqlite = Arc::new(SqliteStorage::open(&config.store_path())?);

        let mut store = Self::new(
            sqlite.clone(),
            embedder,
            StoreOptions {
                require_ids: config.knowledge.require_ids,
                batch_size: config.embedding.batch_size,
            },
        )?;
        store.sqlite_file = Some(sqlite);
        Ok(store)
    }

    fn ensure_embedding_compatible(&self) -> AppResult<()> {
        let Some(manifest) = self.storage.manifest()? else {
            return Ok(());
        };

        let configured = (
            self.embedder.provider_name(),
            self.embedder.model_name(),
            self.embedder.dimensions(),
        );
        let recorded = (
            manifest.embedding_provider.as_str(),
            manifest.embedding_model.as_str(),
            manifest.embedding_dimensions,
        );

        if configured != recorded {
            return Err(AppError::Config(format!(
                "Store was built with embedding {}/{} ({} dims) but {}/{} ({} dims) is configured. \
                 Use the original model or rebuild the store.",
                recorded.0, recorded.1, recorded.2, configured.0, configured.1, configured.2
            )));
        }

        Ok(())
    }

    /// Build the store from a knowledge-base file.
    ///
    /// The file is always loaded and validated first. If the store already
    /// holds a committed build it is left untouched.
    pub async fn build(&self, knowledge_base: &Path) -> AppResult<BuildOutcome> {
        let loaded = load_knowledge_base(knowledge_base, self.options.require_ids)?;

        if let Some(manifest) = self.storage.manifest()? {
            let documents = self.storage.count()?;
            let stale = manifest.source_sha256 != loaded.sha256;
            if stale {
                tracing::warn!(
                    "Knowledge base {} changed since the store was built at {}; run `civic index --rebuild` to pick up the changes",
                    knowledge_base.display(),
                    manifest.built_at.to_rfc3339()
                );
            }
            tracing::info!("Store already populated with {} documents", documents);
            return Ok(BuildOutcome::AlreadyBuilt { documents, stale });
        }

        let start = Instant::now();
        let documents: Vec<IndexedDocument> = loaded.entries.iter().map(compose_document).collect();

        let mut batch = Vec::with_capacity(documents.len());
        for group in documents.chunks(self.options.batch_size.max(1)) {
            let bodies: Vec<String> = group.iter().map(|d| d.body.clone()).collect();
            let embeddings = self.embedder.embed_batch(&bodies).await?;

            if embeddings.len() != group.len() {
                return Err(AppError::Embedding(format!(
                    "Provider returned {} embeddings for {} documents",
                    embeddings.len(),
                    group.len()
                )));
            }

            for (document, embedding) in group.iter().zip(embeddings) {
                if embedding.len() != self.embedder.dimensions() {
                    return Err(AppError::Embedding(format!(
                        "Embedding for '{}' has {} dimensions, expected {}",
                        document.id,
                        embedding.len(),
                        self.embedder.dimensions()
                    )));
                }
                batch.push((document.clone(), embedding));
            }
        }

        let manifest = StoreManifest {
            embedding_provider: self.embedder.provider_name().to_string(),
            embedding_model: self.embedder.model_name().to_string(),
            embedding_dimensions: self.embedder.dimensions(),
            built_at: Utc::now(),
            source_sha256: loaded.sha256,
        };
        self.storage.commit_build(&batch, &manifest)?;

        tracing::info!(
            "Added {} documents to the store in {:.2}s",
            batch.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(BuildOutcome::Built {
            documents: batch.len(),
        })
    }

    /// Delete stored documents and build again.
    ///
    /// The file is validated before anything is deleted.
    pub async fn rebuild(&self, knowledge_base: &Path) -> AppResult<BuildOutcome> {
        load_knowledge_base(knowledge_base, self.options.require_ids)?;
        self.storage.reset()?;
        self.build(knowledge_base).await
    }

    /// Retriever sharing this store's storage and embedder.
    pub fn retriever(&self) -> Retriever {
        Retriever::new(self.storage.clone(), self.embedder.clone())
    }

    /// Up to `k` documents most similar to `query`.
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<ScoredDocument>> {
        self.retriever().search(query, k).await
    }

    /// Document count, build manifest and staleness against `knowledge_base`.
    pub fn stats(&self, knowledge_base: &Path) -> AppResult<StoreStats> {
        let manifest = self.storage.manifest()?;

        let source_changed = match (&manifest, std::fs::read(knowledge_base)) {
            (Some(manifest), Ok(bytes)) => Some(file_digest(&bytes) != manifest.source_sha256),
            _ => None,
        };

        Ok(StoreStats {
            documents: self.storage.count()?,
            manifest,
            db_size_bytes: self.sqlite_file.as_ref().map(|s| s.size_bytes()).unwrap_or(0),
            source_changed,
        })
    }
}
