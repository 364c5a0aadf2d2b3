//! Error types for the report listener

use std::path::PathBuf;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use urlblock_core::{LogError, ValidationError};

/// Errors that can occur while configuring, running, or calling the listener
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Configuration value rejected
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML
    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The listen socket could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an error
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    /// A call to a remote listener failed
    #[error("Reporter error: {0}")]
    Reporter(String),

    /// The remote listener answered with an unexpected status
    #[error("Listener responded with {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The remote listener's reply did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ListenerError {
    fn from(e: reqwest::Error) -> Self {
        ListenerError::Reporter(e.to_string())
    }
}

/// Result type alias for listener operations
pub type ListenerResult<T> = Result<T, ListenerError>;

/// Errors surfaced to HTTP callers.
///
/// Rejected input becomes `400 {error}` (or `413` past the body limit);
/// anything else is reported as a generic `500` and only the detail is
/// logged locally.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(e.body_text())
        } else {
            ApiError::BadRequest(e.body_text())
        }
    }
}

impl From<LogError> for ApiError {
    fn from(e: LogError) -> Self {
        match e {
            LogError::Validation(v) => v.into(),
            LogError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

/// Body sent for every unhandled fault
pub(crate) fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                warn!(error = %message, "rejected blocked URL report");
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::PayloadTooLarge(message) => {
                warn!(error = %message, "rejected oversized report");
                (StatusCode::PAYLOAD_TOO_LARGE, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(detail) => {
                error!(error = %detail, "request failed");
                internal_error_response()
            }
        }
    }
}
