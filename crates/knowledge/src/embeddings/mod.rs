//! Embedding providers for knowledge stores.
//!
//! The same provider (name, model, dimensions) must be used to build a store
//! and to query it; the store records the triple at build time.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
