use axum::extract::State;
use axum::Json;
use civic_knowledge::QueryResponse;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub text: String,
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    tracing::info!("Received query: {}", request.text);

    let Some(service) = state.service.as_ref() else {
        tracing::error!("Answer chain not initialized, cannot process query");
        return Err(ApiError::not_initialized());
    };

    match service.handle_query(&request.text).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            tracing::error!("Error processing query '{}': {}", request.text, err);
            Err(err.into())
        }
    }
}
