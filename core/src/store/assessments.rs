//! Risk-assessment persistence.

use super::{parse_utc, MonitorStore};
use crate::{
    error::AmlResult,
    scoring::{AssessmentDetails, RiskAssessment},
    types::{RiskCategory, UserRiskLevel},
};
use rusqlite::{params, OptionalExtension};

struct AssessmentRow {
    assessment_id: String,
    user_id: String,
    risk_category: String,
    risk_level: String,
    risk_score: f64,
    confidence_score: f64,
    model_version: String,
    created_at: String,
    credit_score: f64,
    fraud_score: f64,
    behavioral_score: f64,
    details_json: String,
}

const ASSESSMENT_COLUMNS: &str = "assessment_id, user_id, risk_category, risk_level, risk_score, \
     confidence_score, model_version, created_at, credit_score, fraud_score, \
     behavioral_score, details_json";

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AssessmentRow> {
    Ok(AssessmentRow {
        assessment_id: row.get(0)?,
        user_id: row.get(1)?,
        risk_category: row.get(2)?,
        risk_level: row.get(3)?,
        risk_score: row.get(4)?,
        confidence_score: row.get(5)?,
        model_version: row.get(6)?,
        created_at: row.get(7)?,
        credit_score: row.get(8)?,
        fraud_score: row.get(9)?,
        behavioral_score: row.get(10)?,
        details_json: row.get(11)?,
    })
}

fn into_assessment(raw: AssessmentRow) -> AmlResult<RiskAssessment> {
    let details: AssessmentDetails = serde_json::from_str(&raw.details_json)?;
    Ok(RiskAssessment {
        assessment_id: raw.assessment_id,
        user_id: raw.user_id,
        risk_category: RiskCategory::parse(&raw.risk_category)?,
        risk_level: UserRiskLevel::parse(&raw.risk_level)?,
        risk_score: raw.risk_score,
        confidence_score: raw.confidence_score,
        model_version: raw.model_version,
        created_at: parse_utc(&raw.created_at)?,
        credit_score: raw.credit_score,
        fraud_score: raw.fraud_score,
        behavioral_score: raw.behavioral_score,
        details,
    })
}

impl MonitorStore {
    pub fn insert_assessment(&self, assessment: &RiskAssessment) -> AmlResult<()> {
        self.conn.execute(
            "INSERT INTO risk_assessment (assessment_id, user_id, risk_category, risk_level, \
             risk_score, confidence_score, model_version, created_at, credit_score, \
             fraud_score, behavioral_score, details_json) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                assessment.assessment_id,
                assessment.user_id,
                assessment.risk_category.as_str(),
                assessment.risk_level.as_str(),
                assessment.risk_score,
                assessment.confidence_score,
                assessment.model_version,
                assessment.created_at.to_rfc3339(),
                assessment.credit_score,
                assessment.fraud_score,
                assessment.behavioral_score,
                serde_json::to_string(&assessment.details)?,
            ],
        )?;
        Ok(())
    }

    /// Most recent assessment on file for a user.
    pub fn latest_assessment(&self, user_id: &str) -> AmlResult<Option<RiskAssessment>> {
        let raw = self
            .conn
            .query_row(
                &format!(
                    "SELECT {ASSESSMENT_COLUMNS} FROM risk_assessment \
                     WHERE user_id = ?1 ORDER BY created_at DESC LIMIT 1"
                ),
                params![user_id],
                read_row,
            )
            .optional()?;
        raw.map(into_assessment).transpose()
    }

    /// Full assessment history for a user, newest first.
    pub fn assessment_history(&self, user_id: &str) -> AmlResult<Vec<RiskAssessment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ASSESSMENT_COLUMNS} FROM risk_assessment \
             WHERE user_id = ?1 ORDER BY created_at DESC"
        ))?;
        let raw: Vec<AssessmentRow> = stmt
            .query_map(params![user_id], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(into_assessment).collect()
    }

    pub fn assessment_count(&self) -> AmlResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM risk_assessment", [], |row| row.get(0))?;
        Ok(count)
    }
}
