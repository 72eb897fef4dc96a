//! Error types for `LangServe`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for `LangServe` operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LangServeError {
    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Runnable execution failed
    #[error("Runnable execution failed: {0}")]
    ExecutionError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Schema generation error
    #[error("Schema generation error: {0}")]
    SchemaError(String),

    /// Streaming error
    #[error("Streaming error: {0}")]
    StreamingError(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Error response structure for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

impl IntoResponse for LangServeError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            LangServeError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            LangServeError::ExecutionError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            LangServeError::SerializationError(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            LangServeError::SchemaError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            LangServeError::StreamingError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            LangServeError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            LangServeError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            status: status.as_u16(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for `LangServe` operations
pub type Result<T> = std::result::Result<T, LangServeError>;
