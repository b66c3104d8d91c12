//! Compliance report persistence.

use super::MonitorStore;
use crate::{alerts::ComplianceReport, error::AmlResult};
use rusqlite::params;

impl MonitorStore {
    pub fn insert_compliance_report(&self, report: &ComplianceReport) -> AmlResult<()> {
        self.conn.execute(
            "INSERT INTO compliance_report (report_id, alert_id, payload_json, submitted_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                report.report_id,
                report.alert_id,
                serde_json::to_string(report)?,
                report.submitted_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn report_count(&self) -> AmlResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM compliance_report", [], |row| row.get(0))?;
        Ok(count)
    }
}
