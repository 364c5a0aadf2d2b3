//! HTTP surface of the report listener
//!
//! | Method | Path | Reply |
//! |---|---|---|
//! | POST | `/` | `{message, totalRequests}` |
//! | GET | `/` | `{requests, totalRequests}` |
//! | GET | `/?latest=true` | `{latest, totalRequests}` |
//! | GET | `/ping` | `{status, message, timestamp}` |
//! | DELETE | `/cleanup` | `{message, clearedCount}` |

use std::any::Any;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use urlblock_core::{EventLog, Submission};

use crate::error::{ApiError, internal_error_response};
use crate::protocol::{CLEANUP_MESSAGE, CleanupResponse, PingResponse, SUBMIT_MESSAGE, SubmitResponse};

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 100 * 1024;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    log: Arc<EventLog>,
}

impl AppState {
    pub fn new(log: Arc<EventLog>) -> Self {
        Self { log }
    }
}

/// Build the router over the given log
pub fn router(log: Arc<EventLog>) -> Router {
    Router::new()
        .route("/", get(list).post(submit))
        .route("/ping", get(ping))
        .route("/cleanup", delete(cleanup))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(log))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "handler panicked");
    internal_error_response()
}

async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<Submission>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(submission) = payload?;
    let total_requests = state.log.submit(submission)?;

    Ok(Json(SubmitResponse {
        message: SUBMIT_MESSAGE.to_string(),
        total_requests,
    }))
}

/// Query string of `GET /`
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    latest: Option<String>,
}

/// Any query string that does not decode to a single `latest=true` selects
/// the full list
async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            debug!(error = %rejection, "ignoring undecodable list query");
            ListQuery::default()
        }
    };

    if query.latest.as_deref() == Some("true") {
        return Ok(Json(state.log.latest()?).into_response());
    }
    Ok(Json(state.log.list_all()?).into_response())
}

async fn ping() -> Json<PingResponse> {
    Json(PingResponse::ok())
}

async fn cleanup(State(state): State<AppState>) -> Result<Json<CleanupResponse>, ApiError> {
    let cleared_count = state.log.clear()?;
    info!(cleared_count, "cleared blocked URL log");

    Ok(Json(CleanupResponse {
        message: CLEANUP_MESSAGE.to_string(),
        cleared_count,
    }))
}
