//! Alert persistence and case-management queries.

use super::{parse_utc, MonitorStore};
use crate::{
    alerts::AmlAlert,
    error::AmlResult,
    types::{AlertStatus, AmlFlag, RiskLevel},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use std::collections::BTreeSet;

/// Raw row image; converted to the domain struct outside the query
/// closure so enum parsing can use the crate error type.
struct AlertRow {
    alert_id: String,
    transaction_id: String,
    user_id: String,
    alert_type: String,
    flags: String,
    risk_level: String,
    score: f64,
    description: String,
    features_json: String,
    created_at: String,
    status: String,
    assigned_to: Option<String>,
    resolution: Option<String>,
    false_positive: bool,
    resolved_at: Option<String>,
    regulatory_reference: Option<String>,
    cbj_reported: bool,
    case_number: Option<String>,
}

const ALERT_COLUMNS: &str = "alert_id, transaction_id, user_id, alert_type, flags, risk_level, \
     score, description, features_json, created_at, status, assigned_to, \
     resolution, false_positive, resolved_at, regulatory_reference, \
     cbj_reported, case_number";

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AlertRow> {
    Ok(AlertRow {
        alert_id: row.get(0)?,
        transaction_id: row.get(1)?,
        user_id: row.get(2)?,
        alert_type: row.get(3)?,
        flags: row.get(4)?,
        risk_level: row.get(5)?,
        score: row.get(6)?,
        description: row.get(7)?,
        features_json: row.get(8)?,
        created_at: row.get(9)?,
        status: row.get(10)?,
        assigned_to: row.get(11)?,
        resolution: row.get(12)?,
        false_positive: row.get::<_, i64>(13)? != 0,
        resolved_at: row.get(14)?,
        regulatory_reference: row.get(15)?,
        cbj_reported: row.get::<_, i64>(16)? != 0,
        case_number: row.get(17)?,
    })
}

fn into_alert(raw: AlertRow) -> AmlResult<(AmlAlert, String)> {
    let flag_names: Vec<String> = serde_json::from_str(&raw.flags)?;
    let mut flags = BTreeSet::new();
    for name in &flag_names {
        flags.insert(AmlFlag::parse(name)?);
    }
    let resolved_at = match &raw.resolved_at {
        Some(s) => Some(parse_utc(s)?),
        None => None,
    };

    let alert = AmlAlert {
        alert_id: raw.alert_id,
        transaction_id: raw.transaction_id,
        user_id: raw.user_id,
        alert_type: AmlFlag::parse(&raw.alert_type)?,
        flags,
        risk_level: RiskLevel::parse(&raw.risk_level)?,
        score: raw.score,
        description: raw.description,
        timestamp: parse_utc(&raw.created_at)?,
        status: AlertStatus::parse(&raw.status)?,
        assigned_to: raw.assigned_to,
        resolution: raw.resolution,
        false_positive: raw.false_positive,
        resolved_at,
        regulatory_reference: raw.regulatory_reference,
        cbj_reported: raw.cbj_reported,
        case_number: raw.case_number,
    };
    Ok((alert, raw.features_json))
}

impl MonitorStore {
    /// Append a new alert together with the feature snapshot it was
    /// scored on (used later for feedback relabeling).
    pub fn insert_alert(&self, alert: &AmlAlert, features_json: &str) -> AmlResult<()> {
        let flag_names: Vec<&str> = alert.flags.iter().map(AmlFlag::as_str).collect();
        self.conn.execute(
            "INSERT INTO aml_alert (alert_id, transaction_id, user_id, alert_type, flags, \
             risk_level, score, description, features_json, created_at, status, \
             regulatory_reference, cbj_reported, false_positive) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                alert.alert_id,
                alert.transaction_id,
                alert.user_id,
                alert.alert_type.as_str(),
                serde_json::to_string(&flag_names)?,
                alert.risk_level.as_str(),
                alert.score,
                alert.description,
                features_json,
                alert.timestamp.to_rfc3339(),
                alert.status.as_str(),
                alert.regulatory_reference,
                alert.cbj_reported as i64,
                alert.false_positive as i64,
            ],
        )?;
        Ok(())
    }

    /// Fetch one alert with its stored feature snapshot.
    pub fn get_alert(&self, alert_id: &str) -> AmlResult<Option<(AmlAlert, String)>> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {ALERT_COLUMNS} FROM aml_alert WHERE alert_id = ?1"),
                params![alert_id],
                read_row,
            )
            .optional()?;
        raw.map(into_alert).transpose()
    }

    /// Resolution workflow: mark resolved with the analyst's verdict.
    pub fn resolve_alert(
        &self,
        alert_id: &str,
        false_positive: bool,
        resolution: &str,
        analyst_id: &str,
        resolved_at: DateTime<Utc>,
    ) -> AmlResult<()> {
        self.conn.execute(
            "UPDATE aml_alert SET status = 'resolved', false_positive = ?2, \
             resolution = ?3, assigned_to = ?4, resolved_at = ?5 \
             WHERE alert_id = ?1",
            params![
                alert_id,
                false_positive as i64,
                resolution,
                analyst_id,
                resolved_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Record that the central bank accepted the report for this alert.
    pub fn mark_alert_reported(&self, alert_id: &str, case_number: &str) -> AmlResult<()> {
        self.conn.execute(
            "UPDATE aml_alert SET cbj_reported = 1, case_number = ?2 WHERE alert_id = ?1",
            params![alert_id, case_number],
        )?;
        Ok(())
    }

    pub fn alerts_for_user(&self, user_id: &str) -> AmlResult<Vec<AmlAlert>> {
        self.query_alerts(
            &format!(
                "SELECT {ALERT_COLUMNS} FROM aml_alert WHERE user_id = ?1 \
                 ORDER BY created_at DESC"
            ),
            params![user_id],
        )
    }

    pub fn alerts_with_status(&self, status: AlertStatus) -> AmlResult<Vec<AmlAlert>> {
        self.query_alerts(
            &format!(
                "SELECT {ALERT_COLUMNS} FROM aml_alert WHERE status = ?1 \
                 ORDER BY created_at DESC"
            ),
            params![status.as_str()],
        )
    }

    pub fn alerts_with_level(&self, level: RiskLevel) -> AmlResult<Vec<AmlAlert>> {
        self.query_alerts(
            &format!(
                "SELECT {ALERT_COLUMNS} FROM aml_alert WHERE risk_level = ?1 \
                 ORDER BY created_at DESC"
            ),
            params![level.as_str()],
        )
    }

    pub fn alerts_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AmlResult<Vec<AmlAlert>> {
        self.query_alerts(
            &format!(
                "SELECT {ALERT_COLUMNS} FROM aml_alert \
                 WHERE created_at >= ?1 AND created_at < ?2 ORDER BY created_at ASC"
            ),
            params![start.to_rfc3339(), end.to_rfc3339()],
        )
    }

    pub fn recent_alerts(&self, limit: usize) -> AmlResult<Vec<AmlAlert>> {
        self.query_alerts(
            &format!(
                "SELECT {ALERT_COLUMNS} FROM aml_alert ORDER BY created_at DESC LIMIT ?1"
            ),
            params![limit as i64],
        )
    }

    /// Alert counts per risk level since the given instant (dashboard).
    pub fn alert_counts_by_level(
        &self,
        since: DateTime<Utc>,
    ) -> AmlResult<Vec<(RiskLevel, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT risk_level, COUNT(*) FROM aml_alert WHERE created_at >= ?1 \
             GROUP BY risk_level",
        )?;
        let raw: Vec<(String, i64)> = stmt
            .query_map(params![since.to_rfc3339()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts = Vec::with_capacity(raw.len());
        for (level, count) in raw {
            counts.push((RiskLevel::parse(&level)?, count));
        }
        Ok(counts)
    }

    pub fn alert_count(&self) -> AmlResult<i64> {
        let count =
            self.conn
                .query_row("SELECT COUNT(*) FROM aml_alert", [], |row| row.get(0))?;
        Ok(count)
    }

    fn query_alerts(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> AmlResult<Vec<AmlAlert>> {
        let mut stmt = self.conn.prepare(sql)?;
        let raw: Vec<AlertRow> = stmt
            .query_map(params, read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter()
            .map(|r| into_alert(r).map(|(alert, _)| alert))
            .collect()
    }
}
