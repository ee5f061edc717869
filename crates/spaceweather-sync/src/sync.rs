// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Main sync orchestrator.
//!
//! One run: load state, fetch the three feeds concurrently, slice each
//! against its watermark, normalize, encode into one batch, push, and only
//! then commit the advanced watermarks.
//!
//! A failure anywhere before the commit leaves the stored state exactly as
//! it was, so the next run re-reads the same window (plus overlap) and
//! nothing is skipped.

use crate::batch::Batch;
use crate::config::{ConfigError, SyncConfig};
use crate::fetch::{FetchError, Fetcher};
use crate::influx::encode_point;
use crate::observation::rows_from_json;
use crate::push::{PushError, Pusher};
use crate::series::Series;
use crate::store::{StateStore, StoreError, SyncState};
use crate::window::{latest_timestamp, slice_new};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Run errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{series} feed: {source}")]
    Fetch {
        series: Series,
        #[source]
        source: FetchError,
    },

    #[error("Delivery failed: {0}")]
    Push(#[from] PushError),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    #[error("another sync run is in progress")]
    Busy,
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Batch pushed and state committed.
    Delivered,
    /// Nothing new; sink not contacted, state not written.
    NoChange,
}

/// Per-series counters for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesReport {
    pub series: Series,
    /// Rows in the feed body.
    pub fetched: usize,
    /// Rows inside the window after dedup.
    pub sliced: usize,
    /// Lines encoded from those rows.
    pub lines: usize,
}

/// Result of a run, returned to the trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Lines in the delivered batch.
    pub lines: usize,
    /// Shared cold-start bound, when one applied.
    pub bootstrap_since_ms: Option<i64>,
    /// State loaded at the start of the run.
    pub previous: SyncState,
    /// State after the run (equal to `previous` unless delivered).
    pub state: SyncState,
    pub series: Vec<SeriesReport>,
}

/// Encoded batch and the state it would commit.
struct Prepared {
    batch: Batch,
    proposed: SyncState,
    reports: Vec<SeriesReport>,
}

/// Incremental sync pipeline.
///
/// The run lock keeps two runs in this process from interleaving their
/// read-modify-write of the state record. Separate processes sharing one
/// store are not coordinated.
pub struct Syncer<F, P, S> {
    config: SyncConfig,
    fetcher: F,
    pusher: P,
    store: S,
    run_lock: Mutex<()>,
}

impl<F: Fetcher, P: Pusher, S: StateStore> Syncer<F, P, S> {
    /// Create a syncer from its collaborators.
    pub fn new(config: SyncConfig, fetcher: F, pusher: P, store: S) -> Self {
        Self {
            config,
            fetcher,
            pusher,
            store,
            run_lock: Mutex::new(()),
        }
    }

    /// The state store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run once against the current wall clock.
    pub async fn run(&self) -> Result<RunOutcome, SyncError> {
        self.run_at(chrono::Utc::now().timestamp_millis()).await
    }

    /// Run once with `now_ms` as the current time.
    pub async fn run_at(&self, now_ms: i64) -> Result<RunOutcome, SyncError> {
        let _guard = self.run_lock.try_lock().map_err(|_| SyncError::Busy)?;

        let previous = self.store.get().await?.unwrap_or_default();
        let bootstrap_since_ms = if previous.is_cold() {
            self.config
                .bootstrap_lookback_ms()
                .map(|lookback| now_ms.saturating_sub(lookback))
        } else {
            None
        };

        let (kp, wind, mag) = tokio::try_join!(
            self.fetch(Series::Kp),
            self.fetch(Series::Wind),
            self.fetch(Series::Mag),
        )?;

        let Prepared {
            batch,
            proposed,
            reports,
        } = prepare(
            &previous,
            bootstrap_since_ms,
            [(Series::Kp, kp), (Series::Wind, wind), (Series::Mag, mag)],
        );

        if batch.is_empty() {
            info!("No new observations; sink not contacted");
            return Ok(RunOutcome {
                status: RunStatus::NoChange,
                lines: 0,
                bootstrap_since_ms,
                previous,
                state: previous,
                series: reports,
            });
        }

        if let Err(e) = self.pusher.push(&batch).await {
            warn!("Delivery of {} lines failed, state unchanged: {}", batch.len(), e);
            return Err(e.into());
        }

        // a batch made only of overlap rows leaves every watermark where it was
        if proposed != previous {
            self.store.put(&proposed).await?;
        }
        info!(
            "Delivered {} lines (kp={:?} wind={:?} mag={:?})",
            batch.len(),
            proposed.kp,
            proposed.wind,
            proposed.mag
        );

        Ok(RunOutcome {
            status: RunStatus::Delivered,
            lines: batch.len(),
            bootstrap_since_ms,
            previous,
            state: proposed,
            series: reports,
        })
    }

    async fn fetch(&self, series: Series) -> Result<Value, SyncError> {
        let url = match series {
            Series::Kp => &self.config.feeds.kp,
            Series::Wind => &self.config.feeds.wind,
            Series::Mag => &self.config.feeds.mag,
        };
        self.fetcher
            .fetch_json(url)
            .await
            .map_err(|source| SyncError::Fetch { series, source })
    }
}

/// Slice, normalize and encode every series in batch order.
fn prepare(
    previous: &SyncState,
    bootstrap_since_ms: Option<i64>,
    bodies: [(Series, Value); 3],
) -> Prepared {
    let mut batch = Batch::new();
    let mut proposed = *previous;
    let mut reports = Vec::with_capacity(bodies.len());

    for (series, body) in bodies {
        let rows = rows_from_json(&body);
        let sliced = slice_new(&rows, previous.get(series), bootstrap_since_ms);
        let points = series.normalize(&sliced);

        let before = batch.len();
        batch.extend(
            points
                .iter()
                .map(|p| encode_point(series.measurement(), series.fixed_tags(), p)),
        );

        proposed.advance(series, latest_timestamp(&sliced));

        debug!(
            "{}: {} fetched, {} in window, {} points",
            series,
            rows.len(),
            sliced.len(),
            points.len()
        );
        reports.push(SeriesReport {
            series,
            fetched: rows.len(),
            sliced: sliced.len(),
            lines: batch.len() - before,
        });
    }

    Prepared {
        batch,
        proposed,
        reports,
    }
}
