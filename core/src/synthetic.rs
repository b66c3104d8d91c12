//! Synthetic bootstrap training data.
//!
//! PLACEHOLDER: these generators exist so the scorers are never asked to
//! predict on an unfit model. They are not a substitute for a real labeled
//! corpus — production deployments should call `train` with historical
//! data, and every bootstrap train logs a warning saying so.
//!
//! Draws are fully deterministic per master seed, anchored to a fixed
//! base timestamp, so two engines built from the same config fit
//! identical models.

use crate::{
    features::TransactionFeatures,
    rng::ModelRng,
    types::{TransactionType, UserId},
};
use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// One labeled training example for the fraud scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledExample {
    pub features: TransactionFeatures,
    pub is_fraud: bool,
}

/// Fixed anchor so generated timestamps (and the hour/weekday features
/// derived from them) do not depend on wall-clock time.
fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).single().expect("valid anchor")
}

fn features_at(
    transaction_id: String,
    user_id: UserId,
    amount: f64,
    tx_type: TransactionType,
    timestamp: DateTime<Utc>,
    account_age_days: i64,
    count_24h: usize,
    avg_amount: f64,
    counterparty_risk: f64,
) -> TransactionFeatures {
    TransactionFeatures {
        transaction_id,
        user_id,
        amount,
        transaction_type: tx_type,
        timestamp,
        account_id: String::new(),
        counterparty_id: None,
        currency: "JOD".to_string(),
        hour_of_day: timestamp.hour(),
        day_of_week: timestamp.weekday().num_days_from_monday(),
        is_weekend: timestamp.weekday().num_days_from_monday() >= 5,
        is_business_hours: (9..=17).contains(&timestamp.hour()),
        user_avg_amount: avg_amount,
        user_transaction_count_24h: count_24h,
        user_transaction_count_7d: count_24h,
        user_velocity_score: count_24h as f64 / 24.0,
        account_age_days,
        counterparty_risk_score: counterparty_risk,
        is_new_counterparty: true,
    }
}

/// Generate the bootstrap corpus: ~80% benign, ~20% clearly fraudulent.
///
/// Benign: lognormal amounts around e^3 ≈ 20, seasoned accounts, no
/// recent activity. Fraudulent: amounts pinned just under reporting
/// thresholds, day-old accounts, high 24h velocity, risky counterparty.
pub fn bootstrap_transactions(rng: &mut ModelRng) -> Vec<LabeledExample> {
    let mut examples = Vec::with_capacity(1_000);
    let base = base_time();

    let benign_types = [
        TransactionType::Deposit,
        TransactionType::Withdrawal,
        TransactionType::Transfer,
    ];
    for i in 0..800 {
        let ts = base - Duration::days(rng.next_below(30) as i64)
            - Duration::hours(rng.next_below(24) as i64);
        let amount = rng.lognormal(3.0, 1.0);
        examples.push(LabeledExample {
            features: features_at(
                format!("boot-tx-{i}"),
                format!("boot-user-{}", i % 100),
                amount,
                *rng.choose(&benign_types),
                ts,
                30 + rng.next_below(970) as i64,
                0,
                0.0,
                0.5,
            ),
            is_fraud: false,
        });
    }

    let fraud_amounts = [9_999.0, 49_999.0, 99_999.0];
    let fraud_types = [TransactionType::Transfer, TransactionType::Withdrawal];
    for i in 0..200 {
        let ts = base - Duration::hours(rng.next_below(24) as i64);
        let burst = 5 + rng.next_below(15);
        examples.push(LabeledExample {
            features: features_at(
                format!("boot-fraud-{i}"),
                format!("boot-mule-{}", i % 20),
                *rng.choose(&fraud_amounts),
                *rng.choose(&fraud_types),
                ts,
                1 + rng.next_below(29) as i64,
                burst,
                rng.uniform(9_000.0, 10_000.0),
                0.8,
            ),
            is_fraud: true,
        });
    }

    examples
}
