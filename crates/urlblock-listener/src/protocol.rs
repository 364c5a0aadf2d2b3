//! JSON bodies exchanged between reporters and the listener
//!
//! `GET /` bodies are [`urlblock_core::LogSnapshot`] and
//! [`urlblock_core::LatestSnapshot`]; the rest are defined here.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const SUBMIT_MESSAGE: &str = "Blocked URL recorded successfully";
pub const PING_MESSAGE: &str = "Server is running";
pub const CLEANUP_MESSAGE: &str = "All blocked URL requests cleared";

/// Reply to `POST /`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub message: String,
    pub total_requests: usize,
}

/// Reply to `GET /ping`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PingResponse {
    pub status: String,
    pub message: String,
    pub timestamp: String,
}

impl PingResponse {
    /// A healthy reply stamped with the current time
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: PING_MESSAGE.to_string(),
            timestamp: iso8601(Utc::now()),
        }
    }

    /// Whether the reply has the shape reporters require before enabling
    /// live reporting
    pub fn is_valid(&self) -> bool {
        self.status == "ok" && !self.message.is_empty() && !self.timestamp.is_empty()
    }
}

/// Reply to `DELETE /cleanup`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub message: String,
    pub cleared_count: usize,
}

/// Format a time the way browsers' `Date.toISOString()` does
pub fn iso8601(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
