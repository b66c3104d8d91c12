//! Alert construction and the compliance-report side channel payload.
//!
//! Alert ids are `AML-YYYYMMDD-<uuid8>`: globally unique, and the date
//! prefix keeps a lexicographic sort in creation-date order for case
//! management. Descriptions embed every number they mention from fields
//! that are persisted alongside them, so the text can be reconstructed
//! for audit.

use crate::{
    features::TransactionFeatures,
    scorer::ScoreExplanation,
    types::{AlertId, AlertStatus, AmlFlag, RiskLevel, TransactionId, UserId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Persisted AML alert. Append-only: rows are created by the generator
/// and mutated only by the resolution workflow, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmlAlert {
    pub alert_id: AlertId,
    pub transaction_id: TransactionId,
    pub user_id: UserId,
    /// Primary flag for triage; the full set is in `flags`.
    pub alert_type: AmlFlag,
    pub flags: BTreeSet<AmlFlag>,
    pub risk_level: RiskLevel,
    pub score: f64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub status: AlertStatus,

    // Resolution workflow fields.
    pub assigned_to: Option<String>,
    pub resolution: Option<String>,
    pub false_positive: bool,
    pub resolved_at: Option<DateTime<Utc>>,

    // Regulatory fields (Jordan Central Bank reporting).
    pub regulatory_reference: Option<String>,
    pub cbj_reported: bool,
    pub case_number: Option<String>,
}

/// Amount-redacted critical-alert summary for the compliance channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub report_id: String,
    pub alert_id: AlertId,
    pub institution_id: String,
    pub report_type: String,
    pub transaction_id: TransactionId,
    /// Redacted: the actual amount stays in the secure alert record.
    pub amount: String,
    pub currency: String,
    pub alert_type: AmlFlag,
    pub risk_level: RiskLevel,
    pub submitted_at: DateTime<Utc>,
}

/// Build a creation-date-sortable alert id.
pub fn new_alert_id(now: DateTime<Utc>) -> AlertId {
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    format!("AML-{}-{}", now.format("%Y%m%d"), suffix)
}

fn describe(
    features: &TransactionFeatures,
    score: f64,
    flags: &BTreeSet<AmlFlag>,
) -> String {
    let mut description = format!(
        "Transaction {} flagged for AML review. Risk score: {:.3}. ",
        features.transaction_id, score
    );
    if !flags.is_empty() {
        let names: Vec<&str> = flags.iter().map(AmlFlag::as_str).collect();
        description.push_str(&format!("Violations: {}. ", names.join(", ")));
    }
    description.push_str(&format!(
        "Amount: {} {}. User velocity: {:.2} tx/hour.",
        features.amount, features.currency, features.user_velocity_score
    ));
    description
}

/// Build the alert record for a flagged transaction.
pub fn generate_alert(
    features: &TransactionFeatures,
    risk_level: RiskLevel,
    score: f64,
    flags: &BTreeSet<AmlFlag>,
    _explanation: &ScoreExplanation,
    now: DateTime<Utc>,
) -> AmlAlert {
    let alert_id = new_alert_id(now);
    // Primary type: the first violated rule, or PATTERN when only the
    // model score pushed the level up.
    let alert_type = flags.iter().next().copied().unwrap_or(AmlFlag::Pattern);

    AmlAlert {
        regulatory_reference: Some(format!("CBJ_AML_{alert_id}")),
        alert_id,
        transaction_id: features.transaction_id.clone(),
        user_id: features.user_id.clone(),
        alert_type,
        flags: flags.clone(),
        risk_level,
        score,
        description: describe(features, score, flags),
        timestamp: now,
        status: AlertStatus::Pending,
        assigned_to: None,
        resolution: None,
        false_positive: false,
        resolved_at: None,
        cbj_reported: false,
        case_number: None,
    }
}

/// Build the amount-redacted compliance report for a critical alert.
pub fn build_report(alert: &AmlAlert, currency: &str, now: DateTime<Utc>) -> ComplianceReport {
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    ComplianceReport {
        report_id: format!("CBJ-RPT-{}-{}", now.format("%Y%m%d"), suffix),
        alert_id: alert.alert_id.clone(),
        institution_id: "STABLECOIN_FINTECH_001".to_string(),
        report_type: "SUSPICIOUS_TRANSACTION".to_string(),
        transaction_id: alert.transaction_id.clone(),
        amount: "CONFIDENTIAL".to_string(),
        currency: currency.to_string(),
        alert_type: alert.alert_type,
        risk_level: alert.risk_level,
        submitted_at: now,
    }
}
