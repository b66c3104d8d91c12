//! Model snapshot persistence.
//!
//! Snapshots are keyed by (name, version); retrains bump the version so
//! the history stays auditable. Re-saving an existing (name, version)
//! replaces the stored state, which is how a corrupt snapshot gets
//! repaired after a bootstrap retrain.

use super::MonitorStore;
use crate::error::AmlResult;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

impl MonitorStore {
    pub fn save_model_snapshot(
        &self,
        name: &str,
        version: u32,
        state_json: &str,
        created_at: DateTime<Utc>,
    ) -> AmlResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO model_snapshot (name, version, created_at, state_json) \
             VALUES (?1, ?2, ?3, ?4)",
            params![name, version as i64, created_at.to_rfc3339(), state_json],
        )?;
        Ok(())
    }

    /// Highest-version snapshot for a model name, as (version, state_json).
    pub fn load_latest_snapshot(&self, name: &str) -> AmlResult<Option<(u32, String)>> {
        let row = self
            .conn
            .query_row(
                "SELECT version, state_json FROM model_snapshot \
                 WHERE name = ?1 ORDER BY version DESC LIMIT 1",
                params![name],
                |row| Ok((row.get::<_, i64>(0)? as u32, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    pub fn snapshot_count(&self, name: &str) -> AmlResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM model_snapshot WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
