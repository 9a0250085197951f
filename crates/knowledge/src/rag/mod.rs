//! Retrieval-augmented answering over the knowledge store.

pub mod compose;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use compose::{AnswerComposer, NO_CONTEXT_SENTINEL};
pub use service::{
    QueryOptions, QueryResponse, QueryService, MAX_SOURCES_RETURNED, NO_INFORMATION_ANSWER,
};
