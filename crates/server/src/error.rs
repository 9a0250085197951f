use axum::{http::StatusCode, response::IntoResponse, Json};
use civic_core::AppError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_initialized() -> Self {
        ApiError::Internal("RAG chain is not initialized. Please check server logs.".to_string())
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        if err.is_client_error() {
            return ApiError::BadRequest(err.to_string());
        }
        ApiError::Internal(format!("An unexpected error occurred: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
