//! Error types for aptdm-ds
//!
//! Every handler returns [`ApiResult`]; errors render as
//! `{"error": {"code": ..., "message": ..., "errors": [...]}}`.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Name already taken in its parent directory (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Dataset is published and can no longer change (409)
    #[error("{0}")]
    Published(String),

    /// Metadata failed validation (422). `errors` lists every violation.
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<String>,
    },

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<aptdm_common::Error> for ApiError {
    fn from(err: aptdm_common::Error) -> Self {
        use aptdm_common::Error;

        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::AlreadyExists(msg) => ApiError::Conflict(msg),
            err @ Error::Published(_) => ApiError::Published(err.to_string()),
            Error::Metadata { path, errors } => ApiError::Validation {
                message: format!("Invalid metadata in {}", file_label(&path)),
                errors,
            },
            other => {
                error!(error = %other, "Data store failure");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(format!("Malformed upload: {}", err.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(format!("Malformed upload: {}", rejection.body_text()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(format!("Invalid path: {}", rejection.body_text()))
    }
}

/// File name only; server paths are not echoed to clients
fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "request".to_string())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, errors) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            ApiError::Published(msg) => (StatusCode::CONFLICT, "PUBLISHED", msg, None),
            ApiError::Validation { message, errors } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_METADATA",
                message,
                Some(errors),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
                None,
            ),
        };

        let mut body = json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });
        if let Some(errors) = errors {
            body["error"]["errors"] = json!(errors);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
