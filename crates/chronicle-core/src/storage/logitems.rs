//! In-memory logitem store with append-or-rotate semantics.
//!
//! Backed by an in-memory SQLite database with a single four-column table,
//! serialized wholesale to a byte blob for persistence. Rows are addressed
//! by rowid; the continue-append path updates the most-recent row in place
//! without handing out references to it.

use std::ptr::NonNull;
use std::sync::Mutex;

use rusqlite::serialize::OwnedData;
use rusqlite::{Connection, DatabaseName, OptionalExtension};
use serde::Serialize;

use crate::error::{ChronicleError, Result};

/// Default bound on the gap between keystrokes merged into one logitem.
pub const DEFAULT_ROTATION_GAP_MS: i64 = 60_000;

/// One contiguous keystroke run for a single application/window.
///
/// `timestamp` is the arrival time of the record's first keystroke and
/// never changes afterwards; continuation appends only extend `keylogs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Logitem {
    /// Epoch milliseconds of the first keystroke in this run.
    pub timestamp: i64,
    pub app_name: String,
    pub window_title: String,
    pub keylogs: String,
}

/// Ordered collection of logitems plus the rotation policy.
pub struct LogitemStore {
    conn: Mutex<Connection>,
    rotation_gap_ms: i64,
}

impl LogitemStore {
    /// Create an empty store with the default rotation gap.
    pub fn new() -> Result<Self> {
        Self::with_rotation_gap(DEFAULT_ROTATION_GAP_MS)
    }

    /// Create an empty store with a custom rotation gap.
    pub fn with_rotation_gap(rotation_gap_ms: i64) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            rotation_gap_ms,
        })
    }

    /// Rehydrate a store from a blob produced by [`Self::export_bytes`].
    pub fn import(bytes: &[u8]) -> Result<Self> {
        Self::import_with_rotation_gap(bytes, DEFAULT_ROTATION_GAP_MS)
    }

    /// Rehydrate with a custom rotation gap.
    pub fn import_with_rotation_gap(bytes: &[u8], rotation_gap_ms: i64) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        let owned = Self::owned_data_from_bytes(bytes)?;
        conn.deserialize(DatabaseName::Main, owned, false)?;
        Self::ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            rotation_gap_ms,
        })
    }

    /// Fold one keystroke into the store.
    ///
    /// The single most-recent record is continued in place iff it has the
    /// same application name, the same window title, and its timestamp is
    /// within the rotation gap of `timestamp_ms`. Anything else starts a
    /// new record. Older records are never revisited, so a fast
    /// app/window oscillation produces one record per transition.
    pub fn append_keystroke(
        &self,
        timestamp_ms: i64,
        app_name: &str,
        window_title: &str,
        keystroke: &str,
    ) -> Result<()> {
        let conn = self.lock_conn()?;

        let newest: Option<(i64, i64, String, String)> = conn
            .query_row(
                "SELECT rowid, timestamp, app_name, window_title
                 FROM logitems
                 ORDER BY timestamp DESC, rowid DESC
                 LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        if let Some((rowid, newest_ts, newest_app, newest_title)) = newest {
            if timestamp_ms - newest_ts <= self.rotation_gap_ms
                && newest_app == app_name
                && newest_title == window_title
            {
                conn.execute(
                    "UPDATE logitems SET keylogs = keylogs || ?1 WHERE rowid = ?2",
                    (keystroke, rowid),
                )?;
                return Ok(());
            }
        }

        conn.execute(
            "INSERT INTO logitems (timestamp, app_name, window_title, keylogs)
             VALUES (?1, ?2, ?3, ?4)",
            (timestamp_ms, app_name, window_title, keystroke),
        )?;
        Ok(())
    }

    /// All logitems with `timestamp >= threshold_ms`, newest first.
    pub fn get_since(&self, threshold_ms: i64) -> Result<Vec<Logitem>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT timestamp, app_name, window_title, keylogs
             FROM logitems
             WHERE timestamp >= ?1
             ORDER BY timestamp DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([threshold_ms], Self::logitem_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    /// All logitems, newest first.
    pub fn get_all(&self) -> Result<Vec<Logitem>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT timestamp, app_name, window_title, keylogs
             FROM logitems
             ORDER BY timestamp DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], Self::logitem_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    /// Number of records in the store.
    pub fn len(&self) -> Result<usize> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM logitems", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Serialize the entire store to one opaque byte blob.
    pub fn export_bytes(&self) -> Result<Vec<u8>> {
        let conn = self.lock_conn()?;
        let data = conn.serialize(DatabaseName::Main)?;
        Ok(data.as_ref().to_vec())
    }

    fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS logitems (
                timestamp    INTEGER NOT NULL,
                app_name     TEXT NOT NULL,
                window_title TEXT NOT NULL,
                keylogs      TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_logitems_timestamp
                ON logitems(timestamp);
            "#,
        )?;
        Ok(())
    }

    fn logitem_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Logitem> {
        Ok(Logitem {
            timestamp: row.get(0)?,
            app_name: row.get(1)?,
            window_title: row.get(2)?,
            keylogs: row.get(3)?,
        })
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ChronicleError::Storage("SQLite connection poisoned".to_string()))
    }

    fn owned_data_from_bytes(bytes: &[u8]) -> Result<OwnedData> {
        if bytes.is_empty() {
            return Err(ChronicleError::Storage(
                "SQLite payload is empty".to_string(),
            ));
        }

        let size: i32 = bytes
            .len()
            .try_into()
            .map_err(|_| ChronicleError::Storage("SQLite payload too large".to_string()))?;
        let raw = unsafe { rusqlite::ffi::sqlite3_malloc(size) as *mut u8 };
        if raw.is_null() {
            return Err(ChronicleError::Storage(
                "SQLite allocation failed".to_string(),
            ));
        }

        // Allocate with sqlite3_malloc so SQLite can own the buffer on deserialize.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), raw, bytes.len());
            let ptr = NonNull::new(raw).ok_or_else(|| {
                ChronicleError::Storage("SQLite allocation returned null".to_string())
            })?;
            Ok(OwnedData::from_raw_nonnull(ptr, bytes.len()))
        }
    }
}
