//! Composition of indexed documents from knowledge entries.

use crate::types::{DocumentMetadata, IndexedDocument, KnowledgeEntry};

/// Text body embedded for an entry.
pub fn compose_body(title: &str, category: &str, content: &str) -> String {
    format!("Title: {}\nCategory: {}\n{}", title, category, content)
}

/// Build the retrievable document for an entry.
pub fn compose_document(entry: &KnowledgeEntry) -> IndexedDocument {
    IndexedDocument {
        id: entry.id.clone(),
        body: compose_body(&entry.title, &entry.category, &entry.content),
        metadata: DocumentMetadata {
            id: entry.id.clone(),
            title: entry.title.clone(),
            category: entry.category.clone(),
            subcategory: entry.subcategory.clone(),
            attributes: entry.attributes.clone(),
        },
    }
}
