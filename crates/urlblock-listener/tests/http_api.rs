//! HTTP contract tests for the report listener
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`.

use std::num::NonZeroUsize;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use urlblock_core::EventLog;
use urlblock_listener::{MAX_BODY_BYTES, router};

fn create_test_app(capacity: usize) -> (Router, Arc<EventLog>) {
    let log = Arc::new(EventLog::new(NonZeroUsize::new(capacity).unwrap()));
    (router(Arc::clone(&log)), log)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

fn post_json(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn cleanup() -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri("/cleanup")
        .body(Body::empty())
        .unwrap()
}

fn report(url: &str) -> Value {
    json!({
        "blockedUrl": {
            "url": url,
            "timestamp": "2024-01-01T00:00:00.000Z",
            "tabId": 7,
            "frameId": 0
        },
        "reportedAt": "2024-01-01T00:00:00Z"
    })
}

fn request_urls(body: &Value) -> Vec<&str> {
    body["requests"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["url"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_submit_on_empty_log() {
    let (app, _log) = create_test_app(10);

    let (status, body) = send(&app, post_json(report("https://x"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Blocked URL recorded successfully");
    assert_eq!(body["totalRequests"], 1);
}

#[tokio::test]
async fn test_stored_event_is_flattened() {
    let (app, _log) = create_test_app(10);
    send(&app, post_json(report("https://ads.example/"))).await;

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "requests": [{
                "url": "https://ads.example/",
                "timestamp": "2024-01-01T00:00:00.000Z",
                "tabId": 7,
                "frameId": 0,
                "reportedAt": "2024-01-01T00:00:00Z"
            }],
            "totalRequests": 1
        })
    );
}

#[tokio::test]
async fn test_capacity_and_order() {
    let (app, _log) = create_test_app(3);

    for url in ["A", "B", "C", "D"] {
        let (status, _) = send(&app, post_json(report(url))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, get("/")).await;
    assert_eq!(request_urls(&body), vec!["D", "C", "B"]);
    assert_eq!(body["totalRequests"], 3);

    let (_, latest) = send(&app, get("/?latest=true")).await;
    assert_eq!(latest["latest"]["url"], "D");
    assert_eq!(latest["totalRequests"], 3);

    let (_, submitted) = send(&app, post_json(report("E"))).await;
    assert_eq!(submitted["totalRequests"], 3);

    let (_, body) = send(&app, get("/")).await;
    assert_eq!(request_urls(&body), vec!["E", "D", "C"]);
}

#[tokio::test]
async fn test_latest_on_empty_log_is_null() {
    let (app, _log) = create_test_app(10);

    let (status, body) = send(&app, get("/?latest=true")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"latest": null, "totalRequests": 0}));
}

#[tokio::test]
async fn test_latest_requires_exact_true() {
    let (app, _log) = create_test_app(10);
    send(&app, post_json(report("https://x"))).await;

    let (_, body) = send(&app, get("/?latest=false")).await;
    assert!(body.get("requests").is_some());
    assert!(body.get("latest").is_none());
}

#[tokio::test]
async fn test_repeated_latest_key_lists_everything() {
    let (app, _log) = create_test_app(10);
    send(&app, post_json(report("https://a"))).await;
    send(&app, post_json(report("https://b"))).await;

    for uri in ["/?latest=true&latest=true", "/?latest=1&latest=2"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(request_urls(&body), vec!["https://b", "https://a"]);
        assert_eq!(body["totalRequests"], 2);
        assert!(body.get("latest").is_none());
    }
}

#[tokio::test]
async fn test_missing_fields_rejected() {
    let (app, log) = create_test_app(10);
    send(&app, post_json(report("https://kept"))).await;

    for bad in [
        json!({}),
        json!({"reportedAt": "2024-01-01T00:00:00Z"}),
        json!({"blockedUrl": {"url": "https://x"}}),
        json!({"blockedUrl": {"tabId": 1}, "reportedAt": "2024-01-01T00:00:00Z"}),
    ] {
        let (status, body) = send(&app, post_json(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some());
    }

    let (_, body) = send(&app, post_json(json!({}))).await;
    assert_eq!(body["error"], "Missing required fields: blockedUrl and reportedAt");

    assert_eq!(log.len().unwrap(), 1);
    let (_, body) = send(&app, get("/")).await;
    assert_eq!(request_urls(&body), vec!["https://kept"]);
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let (app, log) = create_test_app(10);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
    assert!(log.is_empty().unwrap());
}

#[tokio::test]
async fn test_missing_content_type_rejected() {
    let (app, log) = create_test_app(10);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .body(Body::from(report("https://x").to_string()))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
    assert!(log.is_empty().unwrap());
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let (app, log) = create_test_app(10);
    let padding = "a".repeat(MAX_BODY_BYTES + 1);

    let (status, _) = send(&app, post_json(json!({
        "blockedUrl": {"url": "https://x", "padding": padding},
        "reportedAt": "2024-01-01T00:00:00Z"
    })))
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(log.is_empty().unwrap());
}

#[tokio::test]
async fn test_cleanup() {
    let (app, _log) = create_test_app(10);
    for i in 0..5 {
        send(&app, post_json(report(&format!("https://site/{}", i)))).await;
    }

    let (status, body) = send(&app, cleanup()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All blocked URL requests cleared");
    assert_eq!(body["clearedCount"], 5);

    let (_, body) = send(&app, get("/")).await;
    assert_eq!(body, json!({"requests": [], "totalRequests": 0}));

    let (_, body) = send(&app, cleanup()).await;
    assert_eq!(body["clearedCount"], 0);
}

#[tokio::test]
async fn test_ping() {
    let (app, log) = create_test_app(10);

    let (status, body) = send(&app, get("/ping")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Server is running");
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    assert!(log.is_empty().unwrap());
}

#[tokio::test]
async fn test_cors_preflight_allowed() {
    let (app, _log) = create_test_app(10);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/")
        .header(header::ORIGIN, "chrome-extension://abcdefghijklmnop")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_concurrent_submissions() {
    let (app, log) = create_test_app(10);

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move { send(&app, post_json(report(&format!("https://site/{}", i)))).await })
        })
        .collect();

    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(body["totalRequests"].as_u64().unwrap() <= 10);
    }

    assert_eq!(log.len().unwrap(), 10);
}
