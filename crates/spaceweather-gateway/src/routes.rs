// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Route definitions.

use crate::handlers;
use crate::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// API v1 routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/run", get(handlers::run).post(handlers::run))
        // Short aliases
        .route("/health", get(handlers::health))
        .route("/run", get(handlers::run).post(handlers::run))
}

/// Full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    api_routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use spaceweather_sync::{HttpFetcher, HttpPusher, SqliteStore, SyncConfig, Syncer};
    use tower::ServiceExt;

    fn app(token: Option<&str>) -> Router {
        // nothing listens on port 9
        let config = SyncConfig::builder()
            .sink("http://127.0.0.1:9/write", "user", "key")
            .kp_url("http://127.0.0.1:9/kp")
            .wind_url("http://127.0.0.1:9/wind")
            .mag_url("http://127.0.0.1:9/mag")
            .build();
        let syncer = Syncer::new(
            config,
            HttpFetcher::new().unwrap(),
            HttpPusher::new("http://127.0.0.1:9/write", "user", "key"),
            SqliteStore::new_in_memory().unwrap(),
        );
        build_router(Arc::new(AppState {
            syncer: Arc::new(syncer),
            trigger_token: token.map(str::to_string),
        }))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        for uri in ["/health", "/api/v1/health"] {
            let (status, body) = send(app(None), get(uri)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["ok"], true);
        }
    }

    #[tokio::test]
    async fn test_run_without_configured_token_forbidden() {
        let (status, body) = send(app(None), get("/run?token=anything")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_run_missing_token_unauthorized() {
        let (status, body) = send(app(Some("s3cret")), get("/api/v1/run")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_run_wrong_token_unauthorized() {
        let (status, _) = send(app(Some("s3cret")), get("/run?token=guess")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = Request::post("/run")
            .header(header::AUTHORIZATION, "Bearer guess")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app(Some("s3cret")), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_run_failure_reported_as_500() {
        let request = Request::post("/api/v1/run")
            .header(header::AUTHORIZATION, "Bearer s3cret")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(Some("s3cret")), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("feed"));
    }

    #[tokio::test]
    async fn test_run_query_token_accepted() {
        // reaches the syncer, which then fails on the unreachable feeds
        let (status, _) = send(app(Some("s3cret")), get("/run?token=s3cret")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
