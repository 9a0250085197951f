//! Shared application state.

use civic_knowledge::QueryService;
use std::sync::Arc;

/// State shared by every request handler.
///
/// `service` is absent when startup could not construct the answer chain;
/// the process still serves `/health` so operators can see why.
#[derive(Clone)]
pub struct AppState {
    pub service: Option<Arc<QueryService>>,
    pub llm_initialized: bool,
}

impl AppState {
    pub fn ready(service: QueryService) -> Self {
        Self {
            service: Some(Arc::new(service)),
            llm_initialized: true,
        }
    }

    pub fn degraded(llm_initialized: bool) -> Self {
        Self {
            service: None,
            llm_initialized,
        }
    }

    pub fn chain_initialized(&self) -> bool {
        self.service.is_some()
    }
}
