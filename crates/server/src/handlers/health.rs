use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("Health check endpoint called");
    Json(json!({
        "status": "healthy",
        "llm_initialized": state.llm_initialized,
        "chain_initialized": state.chain_initialized(),
    }))
}
