//! Persistent cache store backed by SQLite.
//! One row per cache key holding the exported JSON payload.
//! Complements the in-memory store with cross-process persistence.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::CacheStore;
use crate::error::Error;

/// SQLite-backed translation cache store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store database at the given path.
    pub fn open(db_path: &Path) -> Result<Self, Error> {
        let conn = Connection::open(db_path)?;

        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS translation_store (
                cache_key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_store_updated
                ON translation_store(updated_at);",
        )?;

        info!(path = %db_path.display(), "sqlite store opened");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Remove entries not written for the given number of days.
    pub fn cleanup_older_than_days(&self, days: u32) -> usize {
        let conn = self.conn.lock();
        let cutoff = now_unix() - (days as i64 * 86400);
        match conn.execute(
            "DELETE FROM translation_store WHERE updated_at <= ?1",
            params![cutoff],
        ) {
            Ok(count) => {
                if count > 0 {
                    info!(removed = count, days, "store cleanup");
                }
                count
            }
            Err(e) => {
                warn!(error = %e, "store cleanup failed");
                0
            }
        }
    }
}

impl CacheStore for SqliteStore {
    fn read(&self, key: &str) -> Option<Value> {
        let conn = self.conn.lock();
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM translation_store WHERE cache_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .ok()
            .flatten();

        let payload = payload?;
        match serde_json::from_str(&payload) {
            Ok(value) => {
                debug!(key, "store hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "store payload unreadable, ignoring");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &Value) {
        let conn = self.conn.lock();
        if let Err(e) = conn.execute(
            "INSERT OR REPLACE INTO translation_store
             (cache_key, payload, updated_at)
             VALUES (?1, ?2, ?3)",
            params![key, value.to_string(), now_unix()],
        ) {
            warn!(key, error = %e, "store write failed");
        }
    }
}

/// Current time as Unix timestamp (seconds).
fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
