//! Vector storage for indexed documents.
//!
//! [`SqliteStorage`] keeps documents, their embeddings (little-endian `f32`
//! blobs) and JSON metadata in one table, plus a key/value `store_meta`
//! table holding the [`StoreManifest`] written when a build commits.

use crate::types::{DocumentMetadata, IndexedDocument, ScoredDocument, StoreManifest};
use chrono::{DateTime, Utc};
use civic_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const META_PROVIDER: &str = "embedding_provider";
const META_MODEL: &str = "embedding_model";
const META_DIMENSIONS: &str = "embedding_dimensions";
const META_BUILT_AT: &str = "built_at";
const META_SOURCE_SHA256: &str = "source_sha256";

/// Trait for vector storage backends.
pub trait VectorStorage: Send + Sync {
    /// Insert or replace one document, keyed by its id.
    fn upsert(&self, document: &IndexedDocument, embedding: &[f32]) -> AppResult<()>;

    /// Write a whole build atomically: every document plus the manifest.
    fn commit_build(
        &self,
        documents: &[(IndexedDocument, Vec<f32>)],
        manifest: &StoreManifest,
    ) -> AppResult<()>;

    /// The `k` documents most similar to `query`, best first.
    fn query_top_k(&self, query: &[f32], k: usize) -> AppResult<Vec<ScoredDocument>>;

    /// Number of stored documents.
    fn count(&self) -> AppResult<usize>;

    /// Manifest of the last committed build, if any.
    fn manifest(&self) -> AppResult<Option<StoreManifest>>;

    /// Remove all documents and the manifest.
    fn reset(&self) -> AppResult<()>;
}

/// SQLite-backed vector storage.
pub struct SqliteStorage {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Storage(format!("Failed to create store directory: {}", e))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Storage(format!("Failed to open SQLite store: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                embedding BLOB NOT NULL,
                metadata TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::Storage(format!("Failed to create tables: {}", e)))?;

        tracing::debug!("Opened SQLite store at {:?}", path);

        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    /// Size of the database file in bytes.
    pub fn size_bytes(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Storage("SQLite connection lock poisoned".to_string()))
    }
}

fn write_document(
    conn: &Connection,
    document: &IndexedDocument,
    embedding: &[f32],
) -> AppResult<()> {
    let metadata_json = serde_json::to_string(&document.metadata)?;

    conn.execute(
        "INSERT OR REPLACE INTO documents (id, body, embedding, metadata) VALUES (?1, ?2, ?3, ?4)",
        params![
            document.id,
            document.body,
            embedding_to_bytes(embedding),
            metadata_json
        ],
    )
    .map_err(|e| AppError::Storage(format!("Failed to write document {}: {}", document.id, e)))?;

    Ok(())
}

fn write_meta(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO store_meta (key, value) VALUES (?1, ?2)",
        params![key, value],
    )
    .map_err(|e| AppError::Storage(format!("Failed to write store metadata: {}", e)))?;
    Ok(())
}

fn read_meta(conn: &Connection, key: &str) -> AppResult<Option<String>> {
    conn.query_row(
        "SELECT value FROM store_meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| AppError::Storage(format!("Failed to read store metadata: {}", e)))
}

impl VectorStorage for SqliteStorage {
    fn upsert(&self, document: &IndexedDocument, embedding: &[f32]) -> AppResult<()> {
        let conn = self.lock()?;
        write_document(&conn, document, embedding)
    }

    fn commit_build(
        &self,
        documents: &[(IndexedDocument, Vec<f32>)],
        manifest: &StoreManifest,
    ) -> AppResult<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Storage(format!("Failed to begin transaction: {}", e)))?;

        for (document, embedding) in documents {
            write_document(&tx, document, embedding)?;
        }

        write_meta(&tx, META_PROVIDER, &manifest.embedding_provider)?;
        write_meta(&tx, META_MODEL, &manifest.embedding_model)?;
        write_meta(
            &tx,
            META_DIMENSIONS,
            &manifest.embedding_dimensions.to_string(),
        )?;
        write_meta(&tx, META_SOURCE_SHA256, &manifest.source_sha256)?;
        write_meta(&tx, META_BUILT_AT, &manifest.built_at.to_rfc3339())?;

        tx.commit()
            .map_err(|e| AppError::Storage(format!("Failed to commit build: {}", e)))?;

        tracing::debug!("Committed {} documents to {:?}", documents.len(), self.path);
        Ok(())
    }

    fn query_top_k(&self, query: &[f32], k: usize) -> AppResult<Vec<ScoredDocument>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, body, embedding, metadata FROM documents ORDER BY rowid")
            .map_err(|e| AppError::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| AppError::Storage(format!("Failed to query documents: {}", e)))?;

        let mut results = Vec::new();
        for row in rows {
            let (id, body, embedding_bytes, metadata_json) =
                row.map_err(|e| AppError::Storage(format!("Failed to read document: {}", e)))?;

            let embedding = bytes_to_embedding(&embedding_bytes)?;
            let metadata: DocumentMetadata = serde_json::from_str(&metadata_json)?;

            results.push(ScoredDocument {
                score: cosine_similarity(query, &embedding),
                document: IndexedDocument { id, body, metadata },
            });
        }

        // Stable sort keeps insertion order among equal scores
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        tracing::debug!("Retrieved {} documents (requested top-{})", results.len(), k);

        Ok(results)
    }

    fn count(&self) -> AppResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(|e| AppError::Storage(format!("Failed to count documents: {}", e)))?;
        Ok(count as usize)
    }

    fn manifest(&self) -> AppResult<Option<StoreManifest>> {
        let conn = self.lock()?;

        let Some(built_at) = read_meta(&conn, META_BUILT_AT)? else {
            return Ok(None);
        };

        let built_at = DateTime::parse_from_rfc3339(&built_at)
            .map_err(|e| AppError::Storage(format!("Invalid built_at timestamp: {}", e)))?
            .with_timezone(&Utc);

        let dimensions = read_meta(&conn, META_DIMENSIONS)?
            .unwrap_or_default()
            .parse::<usize>()
            .map_err(|e| AppError::Storage(format!("Invalid embedding dimensions: {}", e)))?;

        Ok(Some(StoreManifest {
            embedding_provider: read_meta(&conn, META_PROVIDER)?.unwrap_or_default(),
            embedding_model: read_meta(&conn, META_MODEL)?.unwrap_or_default(),
            embedding_dimensions: dimensions,
            built_at,
            source_sha256: read_meta(&conn, META_SOURCE_SHA256)?.unwrap_or_default(),
        }))
    }

    fn reset(&self) -> AppResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("DELETE FROM documents; DELETE FROM store_meta;")
            .map_err(|e| AppError::Storage(format!("Failed to reset store: {}", e)))?;

        tracing::info!("Reset knowledge store at {:?}", self.path);
        Ok(())
    }
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Storage(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};
    use tempfile::TempDir;

    fn document(id: &str, title: &str) -> IndexedDocument {
        let mut attributes = Map::new();
        attributes.insert("phone".to_string(), json!("555-0100"));

        IndexedDocument {
            id: id.to_string(),
            body: format!("Title: {}\nCategory: test\n", title),
            metadata: DocumentMetadata {
                id: id.to_string(),
                title: title.to_string(),
                category: "test".to_string(),
                subcategory: String::new(),
                attributes,
            },
        }
    }

    fn manifest() -> StoreManifest {
        StoreManifest {
            embedding_provider: "trigram".to_string(),
            embedding_model: "trigram-v1".to_string(),
            embedding_dimensions: 3,
            built_at: Utc::now(),
            source_sha256: "abc".to_string(),
        }
    }

    #[test]
    fn test_open_creates_tables() {
        let temp = TempDir::new().unwrap();
        let storage = SqliteStorage::open(&temp.path().join("nested/store.sqlite")).unwrap();
        assert_eq!(storage.count().unwrap(), 0);
        assert!(storage.manifest().unwrap().is_none());
        assert!(storage.size_bytes() > 0);
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let temp = TempDir::new().unwrap();
        let storage = SqliteStorage::open(&temp.path().join("store.sqlite")).unwrap();

        storage.upsert(&document("d1", "First"), &[1.0, 0.0, 0.0]).unwrap();
        storage.upsert(&document("d1", "Renamed"), &[0.0, 1.0, 0.0]).unwrap();

        assert_eq!(storage.count().unwrap(), 1);
        let results = storage.query_top_k(&[0.0, 1.0, 0.0], 5).unwrap();
        assert_eq!(results[0].document.metadata.title, "Renamed");
    }

    #[test]
    fn test_query_orders_by_similarity() {
        let temp = TempDir::new().unwrap();
        let storage = SqliteStorage::open(&temp.path().join("store.sqlite")).unwrap();

        storage.upsert(&document("x", "X"), &[1.0, 0.0, 0.0]).unwrap();
        storage.upsert(&document("y", "Y"), &[0.0, 1.0, 0.0]).unwrap();
        storage.upsert(&document("xy", "XY"), &[1.0, 1.0, 0.0]).unwrap();

        let results = storage.query_top_k(&[1.0, 0.2, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.id, "x");
        assert_eq!(results[1].document.id, "xy");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let temp = TempDir::new().unwrap();
        let storage = SqliteStorage::open(&temp.path().join("store.sqlite")).unwrap();

        for id in ["first", "second", "third"] {
            storage.upsert(&document(id, id), &[0.0, 0.0, 1.0]).unwrap();
        }

        let ids: Vec<String> = storage
            .query_top_k(&[0.0, 0.0, 1.0], 3)
            .unwrap()
            .into_iter()
            .map(|r| r.document.id)
            .collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_commit_build_persists_manifest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.sqlite");
        let written = manifest();

        {
            let storage = SqliteStorage::open(&path).unwrap();
            storage
                .commit_build(
                    &[
                        (document("a", "A"), vec![1.0, 0.0, 0.0]),
                        (document("b", "B"), vec![0.0, 1.0, 0.0]),
                    ],
                    &written,
                )
                .unwrap();
        }

        let reopened = SqliteStorage::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 2);

        let read = reopened.manifest().unwrap().unwrap();
        assert_eq!(read.embedding_model, "trigram-v1");
        assert_eq!(read.embedding_dimensions, 3);
        assert_eq!(read.source_sha256, "abc");
        assert_eq!(read.built_at.timestamp(), written.built_at.timestamp());
    }

    #[test]
    fn test_metadata_round_trips() {
        let temp = TempDir::new().unwrap();
        let storage = SqliteStorage::open(&temp.path().join("store.sqlite")).unwrap();
        let doc = document("m1", "Meta");

        storage.upsert(&doc, &[1.0, 0.0, 0.0]).unwrap();
        let results = storage.query_top_k(&[1.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(results[0].document, doc);
    }

    #[test]
    fn test_reset_clears_documents_and_manifest() {
        let temp = TempDir::new().unwrap();
        let storage = SqliteStorage::open(&temp.path().join("store.sqlite")).unwrap();
        storage
            .commit_build(&[(document("a", "A"), vec![1.0, 0.0, 0.0])], &manifest())
            .unwrap();

        storage.reset().unwrap();
        assert_eq!(storage.count().unwrap(), 0);
        assert!(storage.manifest().unwrap().is_none());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
