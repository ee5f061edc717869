// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Progress state and the store abstraction.
//!
//! The only persisted artifact is [`SyncState`]: one watermark per series,
//! stored as a single JSON record under [`STATE_KEY`].

use crate::series::Series;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Mutex;
use thiserror::Error;

/// Key under which the state record is stored.
pub const STATE_KEY: &str = "sync_state";

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("state record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("state store lock poisoned")]
    Poisoned,
}

/// Per-series watermarks: the last delivered observation time (Unix ms).
///
/// Serialized as `{"k": .., "wind": .., "mag": ..}` with `null` for a
/// series that has never been delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(rename = "k")]
    pub kp: Option<i64>,
    pub wind: Option<i64>,
    pub mag: Option<i64>,
}

impl SyncState {
    /// Watermark for a series.
    pub fn get(&self, series: Series) -> Option<i64> {
        match series {
            Series::Kp => self.kp,
            Series::Wind => self.wind,
            Series::Mag => self.mag,
        }
    }

    /// Set the watermark for a series.
    pub fn set(&mut self, series: Series, watermark_ms: Option<i64>) {
        match series {
            Series::Kp => self.kp = watermark_ms,
            Series::Wind => self.wind = watermark_ms,
            Series::Mag => self.mag = watermark_ms,
        }
    }

    /// True when no series has ever been delivered.
    pub fn is_cold(&self) -> bool {
        Series::ALL.iter().all(|s| self.get(*s).is_none())
    }

    /// Move a series forward to `latest_ms`; never moves it backwards.
    pub fn advance(&mut self, series: Series, latest_ms: Option<i64>) {
        let next = match (self.get(series), latest_ms) {
            (Some(prev), Some(latest)) => Some(prev.max(latest)),
            (prev, None) => prev,
            (None, latest) => latest,
        };
        self.set(series, next);
    }
}

/// Durable home of the [`SyncState`] record.
///
/// Read once at the start of a run, written once at the end of a
/// successful one.
pub trait StateStore: Send + Sync {
    /// Load the state record; `None` if it was never written.
    fn get(&self) -> impl Future<Output = Result<Option<SyncState>, StoreError>> + Send;

    /// Replace the state record.
    fn put(&self, state: &SyncState) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// In-memory store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    state: Option<SyncState>,
    writes: usize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `state`.
    pub fn with_state(state: SyncState) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                state: Some(state),
                writes: 0,
            }),
        }
    }

    /// Number of successful `put` calls.
    pub fn writes(&self) -> usize {
        self.inner.lock().map(|g| g.writes).unwrap_or_default()
    }

    /// Current record without going through the async API.
    pub fn snapshot(&self) -> Option<SyncState> {
        self.inner.lock().ok().and_then(|g| g.state)
    }
}

impl StateStore for MemoryStore {
    async fn get(&self) -> Result<Option<SyncState>, StoreError> {
        let guard = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.state)
    }

    async fn put(&self, state: &SyncState) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        guard.state = Some(*state);
        guard.writes += 1;
        Ok(())
    }
}
