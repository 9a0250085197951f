use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{health, query};
use crate::state::AppState;

/// Creates the application router.
///
/// Any origin may call the API: the chat UI is served separately.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/query", post(query::query))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}
