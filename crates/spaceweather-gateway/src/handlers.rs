// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP request handlers.

use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use spaceweather_sync::SyncError;
use std::sync::Arc;
use tracing::{info, warn};

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip)]
    pub code: u16,
}

impl ApiError {
    fn new(code: u16, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        let code = match err {
            SyncError::Busy => 409,
            _ => 500,
        };
        Self::new(code, err.to_string())
    }
}

/// Query string of the trigger endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RunParams {
    pub token: Option<String>,
}

/// GET /api/v1/health
pub async fn health() -> Response {
    let body = serde_json::json!({
        "ok": true,
        "service": "spaceweather-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body)).into_response()
}

/// GET|POST /api/v1/run - Manual trigger
pub async fn run(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RunParams>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Some(expected) = state.trigger_token.as_deref() else {
        return Err(ApiError::new(403, "manual trigger is not configured"));
    };

    let supplied = params.token.or_else(|| bearer_token(&headers));
    if supplied.as_deref() != Some(expected) {
        warn!("Rejected manual trigger: bad or missing token");
        return Err(ApiError::new(401, "unauthorized"));
    }

    info!("Manual sync triggered");
    let outcome = state.syncer.run().await?;
    Ok((StatusCode::OK, Json(outcome)).into_response())
}

/// Token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim().to_string())
}
