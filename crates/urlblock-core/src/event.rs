//! Blocked-URL events and the submissions they are built from

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// A blocking occurrence reported by a browser extension instance.
///
/// Everything the reporter sent besides `url` and `reportedAt` (`timestamp`,
/// `tabId`, `frameId`, ...) is carried verbatim in `fields` and serialized
/// back at the top level, so a stored event reads as
/// `{ ...blockedUrl, reportedAt }` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedEvent {
    url: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
    reported_at: String,
}

impl BlockedEvent {
    /// Create an event with no pass-through fields
    pub fn new(url: impl Into<String>, reported_at: impl Into<String>) -> Result<Self, ValidationError> {
        let url = url.into();
        if url.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        let reported_at = reported_at.into();
        if reported_at.is_empty() {
            return Err(ValidationError::InvalidReportedAt);
        }
        Ok(Self {
            url,
            fields: Map::new(),
            reported_at,
        })
    }

    /// Attach an opaque reporter-supplied field
    ///
    /// `url` and `reportedAt` are owned by the event and cannot be shadowed.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if key != "url" && key != "reportedAt" {
            self.fields.insert(key, value);
        }
        self
    }

    /// The navigation target that was blocked
    pub fn url(&self) -> &str {
        &self.url
    }

    /// When the browser observed the block (reporter clock), if sent as a string
    pub fn timestamp(&self) -> Option<&str> {
        self.fields.get("timestamp").and_then(Value::as_str)
    }

    /// When the report was sent, stored verbatim
    pub fn reported_at(&self) -> &str {
        &self.reported_at
    }

    /// Look up a pass-through field such as `tabId`
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// All pass-through fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// An unvalidated report as received from a reporter.
///
/// Both members are optional here so that a missing field is reported as a
/// [`ValidationError`] rather than a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_url: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<Value>,
}

impl Submission {
    /// Create a submission from a `blockedUrl` object and a send time
    pub fn new(blocked_url: Value, reported_at: impl Into<String>) -> Self {
        Self {
            blocked_url: Some(blocked_url),
            reported_at: Some(Value::String(reported_at.into())),
        }
    }

    /// Validate the submission and turn it into a storable event
    pub fn into_event(self) -> Result<BlockedEvent, ValidationError> {
        let (blocked_url, reported_at) = match (self.blocked_url, self.reported_at) {
            (Some(b), Some(r)) if !b.is_null() && !r.is_null() => (b, r),
            _ => return Err(ValidationError::MissingFields),
        };

        let Value::Object(mut fields) = blocked_url else {
            return Err(ValidationError::InvalidBlockedUrl);
        };

        let reported_at = match reported_at {
            Value::String(s) if !s.is_empty() => s,
            _ => return Err(ValidationError::InvalidReportedAt),
        };

        let url = match fields.remove("url") {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => return Err(ValidationError::EmptyUrl),
        };

        // The top-level send time replaces any copy inside blockedUrl
        fields.remove("reportedAt");

        Ok(BlockedEvent {
            url,
            fields,
            reported_at,
        })
    }
}

impl TryFrom<Submission> for BlockedEvent {
    type Error = ValidationError;

    fn try_from(submission: Submission) -> Result<Self, Self::Error> {
        submission.into_event()
    }
}
