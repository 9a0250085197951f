//! Knowledge-base file loading.
//!
//! The file is a JSON object mapping category names to lists of entry
//! objects, optionally nested under a top-level `knowledge_base` key. The
//! reserved `test_queries` key holds example questions and is never indexed.

use crate::types::{KnowledgeEntry, RESERVED_METADATA_KEYS};
use civic_core::{AppError, AppResult};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;

/// Key wrapping the category mapping in exported knowledge bases.
const WRAPPER_KEY: &str = "knowledge_base";

/// Reserved key excluded from indexing.
const TEST_QUERIES_KEY: &str = "test_queries";

const FIELD_ID: &str = "id";
const FIELD_TITLE: &str = "title";
const FIELD_CONTENT: &str = "content";
const FIELD_CATEGORY: &str = "category";
const FIELD_SUBCATEGORY: &str = "subcategory";

const DEFAULT_TITLE: &str = "N/A";

/// Entries parsed from a knowledge-base file.
#[derive(Debug, Clone)]
pub struct LoadedKnowledgeBase {
    pub entries: Vec<KnowledgeEntry>,
    /// Hex SHA-256 of the raw file bytes
    pub sha256: String,
}

/// Read and validate a knowledge-base file.
///
/// # Errors
/// - `AppError::NotFound` if the file does not exist
/// - `AppError::Format` if it is not JSON or has no category mapping
/// - `AppError::Schema` if a category is not a list, an entry is not an
///   object, an id is unusable or duplicated
pub fn load_knowledge_base(path: &Path, require_ids: bool) -> AppResult<LoadedKnowledgeBase> {
    if !path.exists() {
        return Err(AppError::NotFound(format!(
            "Knowledge base file not found: {}",
            path.display()
        )));
    }

    let bytes = std::fs::read(path)?;
    let sha256 = file_digest(&bytes);

    let root: Value = serde_json::from_slice(&bytes).map_err(|e| {
        AppError::Format(format!(
            "Knowledge base {} is not valid JSON: {}",
            path.display(),
            e
        ))
    })?;

    let entries = parse_entries(&root, require_ids)?;

    tracing::debug!(
        "Loaded {} entries from {}",
        entries.len(),
        path.display()
    );

    Ok(LoadedKnowledgeBase { entries, sha256 })
}

/// Hex SHA-256 of a knowledge-base file's contents.
pub fn file_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Turn a parsed JSON document into knowledge entries.
pub fn parse_entries(root: &Value, require_ids: bool) -> AppResult<Vec<KnowledgeEntry>> {
    let mapping = category_mapping(root)?;

    let mut entries = Vec::new();
    let mut seen_ids = HashSet::new();

    for (category, value) in mapping {
        if category == TEST_QUERIES_KEY {
            continue;
        }

        let items = value.as_array().ok_or_else(|| {
            AppError::Schema(format!(
                "Category '{}' must be a list of entries",
                category
            ))
        })?;

        for (index, item) in items.iter().enumerate() {
            let fields = item.as_object().ok_or_else(|| {
                AppError::Schema(format!(
                    "Entry {} in category '{}' must be an object",
                    index, category
                ))
            })?;

            let entry = parse_entry(category, index, fields, require_ids)?;

            if !seen_ids.insert(entry.id.clone()) {
                return Err(AppError::Schema(format!(
                    "Duplicate entry id '{}' in category '{}'",
                    entry.id, category
                )));
            }

            entries.push(entry);
        }
    }

    Ok(entries)
}

fn category_mapping(root: &Value) -> AppResult<&Map<String, Value>> {
    let top = root.as_object().ok_or_else(|| {
        AppError::Format("Knowledge base must be a JSON object of categories".to_string())
    })?;

    match top.get(WRAPPER_KEY) {
        Some(inner) => inner.as_object().ok_or_else(|| {
            AppError::Format(format!(
                "'{}' must be a JSON object of categories",
                WRAPPER_KEY
            ))
        }),
        None => Ok(top),
    }
}

fn parse_entry(
    category: &str,
    index: usize,
    fields: &Map<String, Value>,
    require_ids: bool,
) -> AppResult<KnowledgeEntry> {
    let id = match fields.get(FIELD_ID) {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::String(_)) => {
            return Err(AppError::Schema(format!(
                "Entry {} in category '{}' has a blank id",
                index, category
            )))
        }
        None | Some(Value::Null) if !require_ids => format!("{}_{}", category, index),
        None | Some(Value::Null) => {
            return Err(AppError::Schema(format!(
                "Entry {} in category '{}' is missing an id",
                index, category
            )))
        }
        Some(other) => {
            return Err(AppError::Schema(format!(
                "Entry {} in category '{}' has a non-scalar id: {}",
                index, category, other
            )))
        }
    };

    // Metadata keys are owned by the document; an entry must not shadow them
    let attributes = fields
        .iter()
        .filter(|(key, _)| {
            key.as_str() != FIELD_CONTENT && !RESERVED_METADATA_KEYS.contains(&key.as_str())
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(KnowledgeEntry {
        id,
        title: text_field(fields, FIELD_TITLE).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        category: category.to_string(),
        subcategory: text_field(fields, FIELD_CATEGORY)
            .or_else(|| text_field(fields, FIELD_SUBCATEGORY))
            .unwrap_or_default(),
        content: text_field(fields, FIELD_CONTENT).unwrap_or_default(),
        attributes,
    })
}

/// Strings are taken as-is, other scalars are rendered, null counts as absent.
fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
