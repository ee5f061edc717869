// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Upstream feed retrieval.

use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Per-request timeout for feed fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Feed fetch errors. Any of these fails the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("fetch {url} failed: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("fetch {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetch {url} returned invalid JSON: {source}")]
    Json {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Performs a bounded-time GET returning parsed JSON.
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and decode the body as JSON.
    fn fetch_json(&self, url: &str) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// `reqwest`-backed [`Fetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with the standard 15 second timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    /// Create a fetcher with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spaceweather-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, url: &str, source: reqwest::Error) -> FetchError {
        if source.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                secs: self.timeout.as_secs(),
            }
        } else {
            FetchError::Http {
                url: url.to_string(),
                source,
            }
        }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                FetchError::Json {
                    url: url.to_string(),
                    source: e,
                }
            } else {
                self.classify(url, e)
            }
        })
    }
}
