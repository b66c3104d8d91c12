//! SQLite persistence layer.
//!
//! RULE: Only the store modules talk to the database. The monitor and
//! scoring service call store methods — they never execute SQL directly.
//!
//! Alerts and assessments are append-only audit records: rows are
//! inserted and (for alerts) updated by the resolution workflow, never
//! deleted. Model snapshots are keyed by (name, version) so every
//! retrain leaves a durable trail.

use crate::error::AmlResult;
use rusqlite::Connection;

mod alerts;
mod assessments;
mod models;
mod reports;

/// Parse a stored RFC 3339 timestamp column.
pub(crate) fn parse_utc(raw: &str) -> crate::error::AmlResult<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| crate::error::AmlError::MalformedInput {
            reason: format!("stored timestamp '{raw}': {e}"),
        })
}

pub struct MonitorStore {
    conn: Connection,
}

impl MonitorStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> AmlResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only applies to real files; ignore failures elsewhere.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> AmlResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> AmlResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }
}
