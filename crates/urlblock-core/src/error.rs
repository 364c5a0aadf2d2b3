//! Error types for the blocked-URL event log

use thiserror::Error;

/// Errors that can occur while operating on the event log
#[derive(Debug, Error)]
pub enum LogError {
    /// The submission was rejected before touching the log
    #[error("invalid submission: {0}")]
    Validation(#[from] ValidationError),

    /// The log storage could not be accessed
    #[error("storage error: {0}")]
    Storage(String),
}

/// Reasons a reported event is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required fields: blockedUrl and reportedAt")]
    MissingFields,

    #[error("blockedUrl must be a JSON object")]
    InvalidBlockedUrl,

    #[error("blockedUrl.url must be a non-empty string")]
    EmptyUrl,

    #[error("reportedAt must be a non-empty string")]
    InvalidReportedAt,
}

/// Result type for event log operations
pub type LogResult<T> = Result<T, LogError>;
