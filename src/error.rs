//! Structured error types for the HTTP API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors surfaced to HTTP clients.
///
/// Every variant maps to a `{ "error": <message> }` JSON body. Internal
/// failures are collapsed to a generic message so server-side detail never
/// reaches the wire.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("field 'task' is required")]
    MissingTask,

    #[error("working_directory must be a non-empty string")]
    EmptyWorkingDirectory,

    #[error("working_directory does not exist")]
    WorkingDirectoryMissing,

    #[error("invalid json")]
    InvalidJson,

    #[error("task not found")]
    TaskNotFound,

    #[error("not found")]
    NotFound,

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingTask
            | ApiError::EmptyWorkingDirectory
            | ApiError::WorkingDirectoryMissing
            | ApiError::InvalidJson => StatusCode::BAD_REQUEST,
            ApiError::TaskNotFound | ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. For internal errors this is the generic
    /// variant text, not the underlying cause.
    pub fn message(&self) -> String {
        match self {
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "Internal error on request path");
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.message() }));
        (status, body).into_response()
    }
}
