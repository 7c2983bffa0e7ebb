//! API error mapping
//!
//! Validation and not-found problems surface verbatim; filesystem
//! detail is logged server-side and clients get a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_store::StoreError;
use serde_json::json;
use tracing::error;

/// Errors produced by the HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bearer token missing or wrong
    #[error("unauthorized")]
    Unauthorized,

    /// Malformed request shape
    #[error("{0}")]
    BadRequest(String),

    /// Document failed structural validation
    #[error("invalid content structure")]
    Validation(Vec<String>),

    /// Unknown access code or missing resource
    #[error("{0}")]
    NotFound(String),

    /// Store or filesystem failure; detail stays server-side
    #[error("internal error")]
    Internal(#[source] StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation { errors } => Self::Validation(errors),
            StoreError::BadRequest(message) => Self::BadRequest(message),
            StoreError::VersionNotFound { .. } => Self::NotFound(err.to_string()),
            other => Self::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Unauthorized" }),
            ),
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid request", "details": message }),
            ),
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid content structure", "details": errors }),
            ),
            Self::NotFound(message) => {
                (StatusCode::NOT_FOUND, json!({ "error": message }))
            }
            Self::Internal(err) => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal error, try again later" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
