//! Client side of the report protocol
//!
//! Talks to a listener the way the browser extension does: validate the
//! endpoint with `/ping`, then post one fire-and-forget report per block.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use urlblock_core::{LatestSnapshot, LogSnapshot, Submission};

use crate::error::{ListenerError, ListenerResult};
use crate::protocol::{CleanupResponse, PingResponse, SubmitResponse, iso8601};

/// Per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A blocked navigation as observed by a reporter
#[derive(Debug, Clone)]
pub struct BlockedUrlReport {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub tab_id: Option<i64>,
    pub frame_id: Option<i64>,
}

impl BlockedUrlReport {
    /// A report observed now
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timestamp: Utc::now(),
            tab_id: None,
            frame_id: None,
        }
    }

    /// Browser tab the navigation happened in
    pub fn with_tab_id(mut self, tab_id: i64) -> Self {
        self.tab_id = Some(tab_id);
        self
    }

    /// Frame within the tab (0 is the top-level frame)
    pub fn with_frame_id(mut self, frame_id: i64) -> Self {
        self.frame_id = Some(frame_id);
        self
    }

    /// Wire submission, sent at `reported_at`
    pub fn to_submission(&self, reported_at: DateTime<Utc>) -> Submission {
        let mut blocked_url = Map::new();
        blocked_url.insert("url".to_string(), json!(self.url));
        blocked_url.insert("timestamp".to_string(), json!(iso8601(self.timestamp)));
        if let Some(tab_id) = self.tab_id {
            blocked_url.insert("tabId".to_string(), json!(tab_id));
        }
        if let Some(frame_id) = self.frame_id {
            blocked_url.insert("frameId".to_string(), json!(frame_id));
        }
        Submission::new(Value::Object(blocked_url), iso8601(reported_at))
    }
}

/// HTTP client for a report listener
pub struct ReporterClient {
    endpoint: Url,
    client: Client,
}

impl ReporterClient {
    /// Create a client for the listener at `endpoint` (e.g. `http://localhost:3000/`)
    pub fn new(endpoint: &str) -> ListenerResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ListenerError::Config(format!("invalid endpoint {}: {}", endpoint, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ListenerError::Config(format!(
                "unsupported endpoint scheme: {}",
                endpoint.scheme()
            )));
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { endpoint, client })
    }

    /// The report endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// `/ping` on the endpoint's origin; any path or query is dropped
    pub fn ping_url(&self) -> Url {
        self.origin_path("/ping")
    }

    fn origin_path(&self, path: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path(path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    /// Check that the endpoint answers like a listener
    pub async fn ping(&self) -> ListenerResult<PingResponse> {
        let response = self.client.get(self.ping_url()).send().await?;
        let ping: PingResponse = decode(response).await?;
        if !ping.is_valid() {
            return Err(ListenerError::InvalidResponse(format!(
                "unexpected ping reply: status={:?} message={:?} timestamp={:?}",
                ping.status, ping.message, ping.timestamp
            )));
        }
        Ok(ping)
    }

    /// Post one report, stamped with the current time
    pub async fn report(&self, report: &BlockedUrlReport) -> ListenerResult<SubmitResponse> {
        self.submit(&report.to_submission(Utc::now())).await
    }

    /// Post a raw submission
    pub async fn submit(&self, submission: &Submission) -> ListenerResult<SubmitResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(submission)
            .send()
            .await?;
        decode(response).await
    }

    /// Every stored event, newest first
    pub async fn list(&self) -> ListenerResult<LogSnapshot> {
        let response = self.client.get(self.origin_path("/")).send().await?;
        decode(response).await
    }

    /// The newest stored event
    pub async fn latest(&self) -> ListenerResult<LatestSnapshot> {
        let mut url = self.origin_path("/");
        url.set_query(Some("latest=true"));
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    /// Empty the remote log
    pub async fn cleanup(&self) -> ListenerResult<CleanupResponse> {
        let response = self.client.delete(self.origin_path("/cleanup")).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ListenerResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ListenerError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .await
        .map_err(|e| ListenerError::InvalidResponse(e.to_string()))
}
