// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SQLite state backend
//!
//! A one-table key-value store holding the JSON-encoded [`SyncState`].
//!
//! Thread-safe via internal Mutex (SQLite Connection is not Sync).
//!
//! The `StateStore` methods run the SQLite calls inline on the calling task.
//! A run does one read and at most one write of a single small row, so
//! nothing is moved to a blocking thread.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE kv (
//!     key TEXT PRIMARY KEY,
//!     value TEXT NOT NULL,
//!     updated_at INTEGER NOT NULL
//! );
//! ```

use crate::store::{StateStore, StoreError, SyncState, STATE_KEY};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed [`StateStore`].
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a file-based store.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Create an in-memory store (for testing)
    pub fn new_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Read a raw value.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Insert or replace a raw value.
    pub fn put_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }
}

impl StateStore for SqliteStore {
    async fn get(&self) -> Result<Option<SyncState>, StoreError> {
        match self.get_raw(STATE_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, state: &SyncState) -> Result<(), StoreError> {
        let json = serde_json::to_string(state)?;
        self.put_raw(STATE_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_store_empty() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_store_put_and_overwrite() {
        let store = SqliteStore::new_in_memory().unwrap();

        let first = SyncState {
            kp: Some(10),
            wind: None,
            mag: Some(30),
        };
        store.put(&first).await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some(first));

        let second = SyncState {
            kp: Some(11),
            wind: Some(21),
            mag: Some(31),
        };
        store.put(&second).await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_sqlite_store_record_is_json() {
        let store = SqliteStore::new_in_memory().unwrap();
        store
            .put(&SyncState {
                kp: Some(1),
                wind: None,
                mag: None,
            })
            .await
            .unwrap();

        assert_eq!(
            store.get_raw(STATE_KEY).unwrap().as_deref(),
            Some(r#"{"k":1,"wind":null,"mag":null}"#)
        );
    }

    #[tokio::test]
    async fn test_sqlite_store_corrupt_record() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.put_raw(STATE_KEY, "not json").unwrap();

        assert!(matches!(store.get().await, Err(StoreError::Json(_))));
    }

    #[tokio::test]
    async fn test_sqlite_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");
        let state = SyncState {
            kp: Some(1),
            wind: Some(2),
            mag: Some(3),
        };

        {
            let store = SqliteStore::new(&path).unwrap();
            store.put(&state).await.unwrap();
        }

        let reopened = SqliteStore::new(&path).unwrap();
        assert_eq!(reopened.get().await.unwrap(), Some(state));
    }
}
