// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batch delivery to the metrics sink.
//!
//! The sink accepts Line Protocol over HTTP POST with basic auth. Any
//! non-2xx answer is a failure; the first 500 bytes of the response body are
//! kept for diagnostics.

use crate::batch::Batch;
use crate::config::{ConfigError, SinkConfig};
use reqwest::Client;
use std::future::Future;
use thiserror::Error;

/// Maximum response body bytes kept in a [`PushError::Rejected`].
pub const MAX_ERROR_BODY: usize = 500;

/// Delivery errors. Any of these leaves progress state untouched.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("sink rejected batch: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("sink request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Delivers one encoded batch.
pub trait Pusher: Send + Sync {
    /// Send the whole batch as a single request.
    fn push(&self, batch: &Batch) -> impl Future<Output = Result<(), PushError>> + Send;
}

/// `reqwest`-backed [`Pusher`].
///
/// Credentials are checked on each push, so a pusher built from an
/// incomplete [`SinkConfig`] only fails once something is delivered.
#[derive(Debug, Clone)]
pub struct HttpPusher {
    client: Client,
    sink: SinkConfig,
}

impl HttpPusher {
    /// Create a pusher for `url` with basic-auth credentials.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self::from_config(SinkConfig {
            url: Some(url.into()),
            username: Some(username.into()),
            api_key: Some(api_key.into()),
        })
    }

    /// Create a pusher from sink configuration.
    pub fn from_config(sink: SinkConfig) -> Self {
        Self {
            client: Client::new(),
            sink,
        }
    }

    /// Target URL, if configured.
    pub fn url(&self) -> Option<&str> {
        self.sink.url.as_deref()
    }
}

impl Pusher for HttpPusher {
    async fn push(&self, batch: &Batch) -> Result<(), PushError> {
        let (url, username, api_key) = self.sink.credentials()?;
        let response = self
            .client
            .post(url)
            .basic_auth(username, Some(api_key))
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(batch.to_body())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(PushError::Rejected {
            status: status.as_u16(),
            body: truncate_utf8(&body, MAX_ERROR_BODY).to_string(),
        })
    }
}

/// Longest prefix of `s` that is at most `max` bytes and ends on a char
/// boundary.
pub fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
