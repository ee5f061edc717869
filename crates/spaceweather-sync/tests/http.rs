// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP fetcher and pusher against a local axum server.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use spaceweather_sync::push::MAX_ERROR_BODY;
use spaceweather_sync::{Batch, FetchError, Fetcher, HttpFetcher, HttpPusher, PushError, Pusher};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(Option<String>, Option<String>, String)>>>,
}

async fn feed() -> Json<Value> {
    Json(json!([{"time_tag": "2024-03-01 00:00:00.000", "kp_index": 3}]))
}

async fn unavailable() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn garbage() -> &'static str {
    "<html>maintenance</html>"
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!([]))
}

async fn write(State(captured): State<Captured>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    captured.requests.lock().unwrap().push((
        auth,
        content_type,
        String::from_utf8_lossy(&body).into_owned(),
    ));
    StatusCode::NO_CONTENT
}

async fn reject() -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, "e".repeat(800))
}

async fn spawn_server() -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/feed", get(feed))
        .route("/down", get(unavailable))
        .route("/garbage", get(garbage))
        .route("/slow", get(slow))
        .route("/write", post(write))
        .route("/reject", post(reject))
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), captured)
}

fn batch() -> Batch {
    let mut batch = Batch::new();
    batch.push("spaceweather_kp,source=noaa kp=3 1709251200000000000".to_string());
    batch.push("spaceweather_kp,source=noaa kp=4 1709251260000000000".to_string());
    batch
}

// ============================================================================
// Fetcher
// ============================================================================

#[tokio::test]
async fn test_fetch_json_array() {
    let (base, _) = spawn_server().await;
    let fetcher = HttpFetcher::new().unwrap();

    let body = fetcher.fetch_json(&format!("{}/feed", base)).await.unwrap();
    assert_eq!(body[0]["kp_index"], 3);
}

#[tokio::test]
async fn test_fetch_non_success_status() {
    let (base, _) = spawn_server().await;
    let fetcher = HttpFetcher::new().unwrap();

    let err = fetcher.fetch_json(&format!("{}/down", base)).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_fetch_invalid_json() {
    let (base, _) = spawn_server().await;
    let fetcher = HttpFetcher::new().unwrap();

    let err = fetcher
        .fetch_json(&format!("{}/garbage", base))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Json { .. }));
}

#[tokio::test]
async fn test_fetch_timeout() {
    let (base, _) = spawn_server().await;
    let fetcher = HttpFetcher::with_timeout(Duration::from_millis(200)).unwrap();

    let err = fetcher.fetch_json(&format!("{}/slow", base)).await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout { .. }));
}

#[tokio::test]
async fn test_fetch_unreachable_host() {
    let fetcher = HttpFetcher::with_timeout(Duration::from_secs(2)).unwrap();

    let err = fetcher.fetch_json("http://127.0.0.1:9/feed").await.unwrap_err();
    assert!(matches!(err, FetchError::Http { .. } | FetchError::Timeout { .. }));
}

// ============================================================================
// Pusher
// ============================================================================

#[tokio::test]
async fn test_push_sends_single_authenticated_request() {
    let (base, captured) = spawn_server().await;
    let pusher = HttpPusher::new(format!("{}/write", base), "user", "key");

    pusher.push(&batch()).await.unwrap();

    let requests = captured.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (auth, content_type, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Basic dXNlcjprZXk="));
    assert!(content_type.as_deref().unwrap().starts_with("text/plain"));
    assert_eq!(
        body,
        "spaceweather_kp,source=noaa kp=3 1709251200000000000\n\
         spaceweather_kp,source=noaa kp=4 1709251260000000000\n"
    );
}

#[tokio::test]
async fn test_push_rejection_truncates_body() {
    let (base, _) = spawn_server().await;
    let pusher = HttpPusher::new(format!("{}/reject", base), "user", "key");

    match pusher.push(&batch()).await.unwrap_err() {
        PushError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body.len(), MAX_ERROR_BODY);
        }
        other => panic!("expected Rejected, got {}", other),
    }
}

#[tokio::test]
async fn test_push_transport_error() {
    let pusher = HttpPusher::new("http://127.0.0.1:9/write", "user", "key");
    assert!(matches!(
        pusher.push(&batch()).await,
        Err(PushError::Http(_))
    ));
}
