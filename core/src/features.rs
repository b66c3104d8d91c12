//! Feature extraction for AML analysis.
//!
//! `extract_features` is a pure function of the transaction, the user's
//! prior history, and counterparty metadata. Behavioral aggregates are
//! computed strictly from transactions timestamped before the evaluated
//! transaction — no lookahead, so re-evaluating against the same history
//! snapshot always yields the same features.

use crate::{
    error::{AmlError, AmlResult},
    types::{TransactionId, TransactionType, UserId},
};
use chrono::{DateTime, Datelike, Duration, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Number of entries produced by [`TransactionFeatures::to_vector`]:
/// 12 raw numerics followed by 5 one-hot transaction-type slots.
pub const FEATURE_DIM: usize = 17;

/// Raw transaction record as delivered by the transaction source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: TransactionId,
    pub user_id: UserId,
    pub amount: f64,
    pub transaction_type: String,
    pub currency: String,
    /// ISO-8601 timestamp. Parse failure is a `MalformedInput` error.
    pub timestamp: String,
    pub account_id: String,
    pub account_age_days: i64,
    pub counterparty_id: Option<String>,
}

/// One prior transaction from the user history provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub transaction_id: TransactionId,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub timestamp: DateTime<Utc>,
}

/// Counterparty risk data from the counterparty data provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterpartyProfile {
    pub risk_score: f64,
    pub is_sanctioned: bool,
    pub is_pep: bool,
    pub interaction_count: u64,
    pub first_interaction: bool,
}

/// Fixed-shape feature record for one evaluation. Ephemeral: computed per
/// evaluation and persisted only as the feature snapshot on an alert row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFeatures {
    pub transaction_id: TransactionId,
    pub user_id: UserId,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub timestamp: DateTime<Utc>,
    pub account_id: String,
    pub counterparty_id: Option<String>,
    pub currency: String,

    // Time-derived fields.
    pub hour_of_day: u32,
    /// Monday = 0 .. Sunday = 6.
    pub day_of_week: u32,
    pub is_weekend: bool,
    pub is_business_hours: bool,

    // User behavioral aggregates (history strictly before `timestamp`).
    pub user_avg_amount: f64,
    pub user_transaction_count_24h: usize,
    pub user_transaction_count_7d: usize,
    /// Transactions per hour over the preceding 24h window.
    pub user_velocity_score: f64,
    pub account_age_days: i64,

    // Counterparty features.
    pub counterparty_risk_score: f64,
    pub is_new_counterparty: bool,
}

/// Parse an ISO-8601 timestamp, with or without an offset.
pub fn parse_timestamp(raw: &str) -> AmlResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Python isoformat() emits offset-less timestamps; treat those as UTC.
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(AmlError::MalformedInput {
        reason: format!("unparseable timestamp '{raw}'"),
    })
}

/// Extract the full feature record for one transaction.
pub fn extract_features(
    transaction: &TransactionRecord,
    user_history: &[HistoryEntry],
    counterparty: Option<&CounterpartyProfile>,
) -> AmlResult<TransactionFeatures> {
    if transaction.transaction_id.is_empty() {
        return Err(AmlError::MalformedInput {
            reason: "missing transaction_id".into(),
        });
    }
    if transaction.user_id.is_empty() {
        return Err(AmlError::MalformedInput {
            reason: "missing user_id".into(),
        });
    }
    if !transaction.amount.is_finite() || transaction.amount < 0.0 {
        return Err(AmlError::MalformedInput {
            reason: format!("invalid amount {}", transaction.amount),
        });
    }

    let timestamp = parse_timestamp(&transaction.timestamp)?;
    let transaction_type = TransactionType::parse(&transaction.transaction_type)?;

    let window_24h = timestamp - Duration::hours(24);
    let window_7d = timestamp - Duration::days(7);

    // Strictly-before filter: entries at or after the evaluated timestamp
    // never contribute to behavioral aggregates.
    let prior: Vec<&HistoryEntry> = user_history
        .iter()
        .filter(|e| e.timestamp < timestamp)
        .collect();

    let count_24h = prior.iter().filter(|e| e.timestamp > window_24h).count();
    let count_7d = prior.iter().filter(|e| e.timestamp > window_7d).count();

    let user_avg_amount = if prior.is_empty() {
        0.0
    } else {
        prior.iter().map(|e| e.amount).sum::<f64>() / prior.len() as f64
    };

    let (counterparty_risk_score, is_new_counterparty) = match counterparty {
        Some(profile) => (profile.risk_score, profile.first_interaction),
        // Unknown counterparty: neutral midpoint risk, treated as novel.
        None => (0.5, true),
    };

    Ok(TransactionFeatures {
        transaction_id: transaction.transaction_id.clone(),
        user_id: transaction.user_id.clone(),
        amount: transaction.amount,
        transaction_type,
        timestamp,
        account_id: transaction.account_id.clone(),
        counterparty_id: transaction.counterparty_id.clone(),
        currency: transaction.currency.clone(),
        hour_of_day: timestamp.hour(),
        day_of_week: timestamp.weekday().num_days_from_monday(),
        is_weekend: timestamp.weekday().num_days_from_monday() >= 5,
        is_business_hours: (9..=17).contains(&timestamp.hour()),
        user_avg_amount,
        user_transaction_count_24h: count_24h,
        user_transaction_count_7d: count_7d,
        user_velocity_score: count_24h as f64 / 24.0,
        account_age_days: transaction.account_age_days,
        counterparty_risk_score,
        is_new_counterparty,
    })
}

impl TransactionFeatures {
    /// Convert to the fixed-order numeric vector fed to the models.
    ///
    /// Ordering is a compile-time contract shared with `feature_names`:
    /// raw numerics first, then the one-hot transaction-type encoding in
    /// `TransactionType::ALL` order.
    pub fn to_vector(&self) -> Vec<f64> {
        let mut v = Vec::with_capacity(FEATURE_DIM);
        v.push(self.amount);
        v.push(f64::from(self.hour_of_day));
        v.push(f64::from(self.day_of_week));
        v.push(if self.is_weekend { 1.0 } else { 0.0 });
        v.push(if self.is_business_hours { 1.0 } else { 0.0 });
        v.push(self.user_avg_amount);
        v.push(self.user_transaction_count_24h as f64);
        v.push(self.user_transaction_count_7d as f64);
        v.push(self.user_velocity_score);
        v.push(self.account_age_days as f64);
        v.push(self.counterparty_risk_score);
        v.push(if self.is_new_counterparty { 1.0 } else { 0.0 });
        for tx_type in TransactionType::ALL {
            v.push(if self.transaction_type == tx_type { 1.0 } else { 0.0 });
        }
        debug_assert_eq!(v.len(), FEATURE_DIM);
        v
    }

    /// Column names aligned with `to_vector`, used for importance maps.
    pub fn feature_names() -> Vec<String> {
        let mut names = vec![
            "amount".to_string(),
            "hour_of_day".to_string(),
            "day_of_week".to_string(),
            "is_weekend".to_string(),
            "is_business_hours".to_string(),
            "user_avg_amount".to_string(),
            "user_transaction_count_24h".to_string(),
            "user_transaction_count_7d".to_string(),
            "user_velocity_score".to_string(),
            "account_age_days".to_string(),
            "counterparty_risk_score".to_string(),
            "is_new_counterparty".to_string(),
        ];
        for tx_type in TransactionType::ALL {
            names.push(format!("type_{}", tx_type.as_str()));
        }
        names
    }
}
