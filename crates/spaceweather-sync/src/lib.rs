// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Space-weather incremental sync
//!
//! Pulls the NOAA SWPC planetary K index, solar wind plasma and solar wind
//! magnetic field feeds, and delivers new observations to an InfluxDB Line
//! Protocol sink.
//!
//! This crate provides:
//! - Watermark windowing with a 10 minute overlap and raw-timestamp dedup
//! - Field normalization from loosely typed feed rows
//! - Line Protocol encoding and single-request batch delivery
//! - Commit-after-delivery progress state (SQLite or in-memory)
//!
//! # Overview
//!
//! ```text
//! Fetcher x3 --> slice_new --> Series::normalize --> encode_point --> Batch
//!     --> Pusher --> StateStore::put (only after the push succeeded)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use spaceweather_sync::{HttpFetcher, HttpPusher, SqliteStore, SyncConfig, Syncer};
//!
//! let config = SyncConfig::from_file("sync.toml")?;
//! let pusher = HttpPusher::from_config(config.sink.clone());
//! let syncer = Syncer::new(config, HttpFetcher::new()?, pusher, SqliteStore::new("state.db")?);
//! let outcome = syncer.run().await?;
//! ```

pub mod batch;
pub mod coerce;
pub mod config;
pub mod fetch;
pub mod influx;
pub mod mapping;
pub mod observation;
pub mod push;
pub mod series;
pub mod sqlite;
pub mod store;
pub mod sync;
pub mod window;

pub use batch::Batch;
pub use config::{ConfigError, FeedConfig, SinkConfig, SyncConfig};
pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use mapping::CanonicalPoint;
pub use observation::RawObservation;
pub use push::{HttpPusher, PushError, Pusher};
pub use series::Series;
pub use sqlite::SqliteStore;
pub use store::{MemoryStore, StateStore, StoreError, SyncState};
pub use sync::{RunOutcome, RunStatus, SeriesReport, SyncError, Syncer};
pub use window::OVERLAP_MS;
