//! Error types for the Smart City Assistant.
//!
//! This module defines a unified error enum covering knowledge-base loading,
//! embedding, storage, generation, configuration and I/O failures.

use thiserror::Error;

/// Unified error type for the Smart City Assistant.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Knowledge-base file is missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Knowledge-base file is not valid JSON or lacks the category mapping
    #[error("Format error: {0}")]
    Format(String),

    /// Knowledge-base structure is recognised but incomplete or inconsistent
    #[error("Schema error: {0}")]
    Schema(String),

    /// Completion provider unreachable or errored
    #[error("Generation error: {0}")]
    Generation(String),

    /// Embedding provider unreachable, errored or returned a bad vector
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Caller supplied an unusable argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl AppError {
    /// Whether the error was caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::InvalidInput(_))
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_category() {
        let err = AppError::NotFound("knowledge.json".to_string());
        assert_eq!(err.to_string(), "Not found: knowledge.json");

        let err = AppError::Generation("connection refused".to_string());
        assert!(err.to_string().starts_with("Generation error"));
    }

    #[test]
    fn test_json_error_converts_to_serialization() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AppError = parse_err.into();
        assert!(matches!(err, AppError::Serialization(_)));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(AppError::InvalidInput("blank".to_string()).is_client_error());
        assert!(!AppError::Generation("down".to_string()).is_client_error());
    }
}
