//! Key-value storage seam for the draft store.
//!
//! The draft store only needs a string→string map with get/set/remove and
//! key enumeration, so any durable or in-memory backend can be swapped in.
//! Two implementations ship here: `MemoryKv` (tests, in-process use) and
//! `SqliteKv` (bundled SQLite, the portal's embedded database).

use std::collections::HashMap;

use rusqlite::{params, Connection};
use tracing::warn;

/// Minimal string key-value store.
///
/// `set` surfaces backend failures (quota, I/O) as `Err`; the draft store
/// converts them to boolean returns at its own boundary. Everything else
/// degrades to empty/`None` rather than failing.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), String>;
    fn remove(&mut self, key: &str);
    fn keys(&self) -> Vec<String>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys starting with `prefix`. The default enumerates and filters;
    /// backends with sorted keys should override with a real range scan so
    /// draft sweeps don't go O(total-keys) as the store grows.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// HashMap-backed store. Each test injects its own instance, so there is no
/// process-global state to serialize around.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: HashMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> MemoryKv {
        MemoryKv::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// ---------------------------------------------------------------------------
// SQLite backend
// ---------------------------------------------------------------------------

/// Durable store over a single SQLite table. The primary-key index makes the
/// prefix scan an ordered range read instead of a full enumeration.
pub struct SqliteKv {
    conn: Connection,
}

impl SqliteKv {
    /// Open (or create) the store at `path`.
    pub fn open(path: &str) -> Result<SqliteKv, String> {
        let conn = Connection::open(path).map_err(|e| format!("open kv db: {e}"))?;
        Self::init(conn)
    }

    /// In-memory store, used by tests and throwaway sessions.
    pub fn open_in_memory() -> Result<SqliteKv, String> {
        let conn = Connection::open_in_memory().map_err(|e| format!("open in-memory kv db: {e}"))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<SqliteKv, String> {
        conn.execute_batch(
            "PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;
             CREATE TABLE IF NOT EXISTS kv_entries (
                 key   TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             );",
        )
        .map_err(|e| format!("init kv schema: {e}"))?;
        Ok(SqliteKv { conn })
    }
}

impl KvStore for SqliteKv {
    fn get(&self, key: &str) -> Option<String> {
        match self.conn.query_row(
            "SELECT value FROM kv_entries WHERE key = ?1",
            params![key],
            |row| row.get(0),
        ) {
            Ok(value) => Some(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                warn!(key, error = %e, "kv: read failed");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        self.conn
            .execute(
                "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map(|_| ())
            .map_err(|e| format!("kv write {key}: {e}"))
    }

    fn remove(&mut self, key: &str) {
        if let Err(e) = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1", params![key])
        {
            warn!(key, error = %e, "kv: delete failed");
        }
    }

    fn keys(&self) -> Vec<String> {
        self.select_keys("SELECT key FROM kv_entries ORDER BY key", params![])
    }

    fn len(&self) -> usize {
        self.conn
            .query_row("SELECT COUNT(*) FROM kv_entries", [], |row| {
                row.get::<_, i64>(0)
            })
            .unwrap_or(0) as usize
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        // Ordered range read off the primary key; stop at the first
        // non-matching key instead of scanning the whole table.
        let rows = self.select_keys(
            "SELECT key FROM kv_entries WHERE key >= ?1 ORDER BY key",
            params![prefix],
        );
        rows.into_iter()
            .take_while(|k| k.starts_with(prefix))
            .collect()
    }
}

impl SqliteKv {
    fn select_keys(&self, sql: &str, params: impl rusqlite::Params) -> Vec<String> {
        let mut stmt = match self.conn.prepare(sql) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "kv: prepare key scan failed");
                return Vec::new();
            }
        };
        let keys = match stmt.query_map(params, |row| row.get::<_, String>(0)) {
            Ok(rows) => rows.filter_map(|r| r.ok()).collect(),
            Err(e) => {
                warn!(error = %e, "kv: key scan failed");
                Vec::new()
            }
        };
        keys
    }
}

// ===========================================================================
// Tests
// ===========================================================================
