// 💾 Key-Value Store - Persisted string keys / string values
// SQLite-backed, write-through on every set, tolerant of corrupt values

use anyhow::{Context, Result};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

// ============================================================================
// WELL-KNOWN KEYS
// ============================================================================

/// Keys the engine persists under. Values are strings; structured values are
/// JSON-encoded.
pub mod keys {
    /// Active theme: `"light"` or `"dark"` (raw string, not JSON)
    pub const THEME: &str = "app-theme";

    /// Active station binding: JSON `Profile`
    pub const PROFILE: &str = "app-profile";

    /// Committed session history: JSON `ScannedData`
    pub const SCANNED_DATA: &str = "scanned-data";
}

// ============================================================================
// KV STORE
// ============================================================================

/// Single-device persisted key-value store.
///
/// Every `set` is one upsert statement, so a commit is durable the moment the
/// call returns; there is no buffering or delayed flush.
pub struct KvStore {
    conn: Connection,
}

impl KvStore {
    /// Open (or create) the store at the given path
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open store at {}", path.display()))?;
        Self::init(&conn)?;
        Ok(KvStore { conn })
    }

    /// Open an in-memory store (tests, throwaway state)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory store")?;
        Self::init(&conn)?;
        Ok(KvStore { conn })
    }

    fn init(conn: &Connection) -> Result<()> {
        // Enable WAL mode for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Read the raw string value for a key, if present
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("failed to read key '{}'", key))?;

        Ok(value)
    }

    /// Write a raw string value, replacing any previous value
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .with_context(|| format!("failed to write key '{}'", key))?;

        Ok(())
    }

    /// Delete a key (no-op if absent)
    pub fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .with_context(|| format!("failed to remove key '{}'", key))?;

        Ok(())
    }

    /// Read a JSON-encoded value.
    ///
    /// A malformed stored blob is not an error: the corrupt entry is dropped
    /// from the store and `None` is returned, so callers fall back to their
    /// empty/default state.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = match self.get(key)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!("discarding corrupt value for key '{}': {}", key, err);
                self.remove(key)?;
                Ok(None)
            }
        }
    }

    /// Write a value as JSON
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .with_context(|| format!("failed to encode value for key '{}'", key))?;
        self.set(key, &raw)
    }
}

// ============================================================================
// TESTS
// ============================================================================
