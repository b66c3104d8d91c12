//! Feature extraction: window semantics, input validation, vector shape.

use amlguard_core::{
    error::AmlError,
    features::{extract_features, HistoryEntry, TransactionRecord, FEATURE_DIM},
    types::TransactionType,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 10, 30, 0).unwrap()
}

fn record() -> TransactionRecord {
    TransactionRecord {
        transaction_id: "txn-1".to_string(),
        user_id: "user-1".to_string(),
        amount: 250.0,
        transaction_type: "payment".to_string(),
        currency: "JOD".to_string(),
        timestamp: base_time().to_rfc3339(),
        account_id: "acct-1".to_string(),
        account_age_days: 400,
        counterparty_id: None,
    }
}

fn entry(amount: f64, when: DateTime<Utc>) -> HistoryEntry {
    HistoryEntry {
        transaction_id: format!("hist-{amount}"),
        amount,
        transaction_type: TransactionType::Payment,
        timestamp: when,
    }
}

/// History at or after the evaluated timestamp never contributes: no
/// lookahead into the behavioral aggregates.
#[test]
fn aggregates_use_strictly_prior_history() {
    let history = vec![
        entry(100.0, base_time() - Duration::hours(1)),
        entry(900.0, base_time()),                      // same instant: excluded
        entry(500.0, base_time() + Duration::hours(1)), // future: excluded
    ];
    let features = extract_features(&record(), &history, None).unwrap();

    assert_eq!(features.user_transaction_count_24h, 1);
    assert!((features.user_avg_amount - 100.0).abs() < 1e-9);
}

/// The 24h window is open at the far edge: an entry exactly 24h old is
/// out, one second newer is in.
#[test]
fn window_edges() {
    let history = vec![
        entry(10.0, base_time() - Duration::hours(24)),
        entry(20.0, base_time() - Duration::hours(24) + Duration::seconds(1)),
    ];
    let features = extract_features(&record(), &history, None).unwrap();

    assert_eq!(features.user_transaction_count_24h, 1);
    // Both are within 7 days.
    assert_eq!(features.user_transaction_count_7d, 2);
    assert!((features.user_velocity_score - 1.0 / 24.0).abs() < 1e-12);
}

/// Offset-less ISO timestamps are accepted and read as UTC.
#[test]
fn naive_timestamps_parse_as_utc() {
    let mut rec = record();
    rec.timestamp = "2025-06-02T10:30:00".to_string();
    let features = extract_features(&rec, &[], None).unwrap();
    assert_eq!(features.timestamp, base_time());
    assert_eq!(features.hour_of_day, 10);
    assert!(features.is_business_hours);
    assert!(!features.is_weekend); // 2025-06-02 is a Monday
    assert_eq!(features.day_of_week, 0);
}

/// Malformed transactions are rejected up front, not scored.
#[test]
fn malformed_inputs_are_rejected() {
    let mut rec = record();
    rec.user_id = String::new();
    assert!(matches!(
        extract_features(&rec, &[], None),
        Err(AmlError::MalformedInput { .. })
    ));

    let mut rec = record();
    rec.amount = f64::NAN;
    assert!(matches!(
        extract_features(&rec, &[], None),
        Err(AmlError::MalformedInput { .. })
    ));

    let mut rec = record();
    rec.amount = -5.0;
    assert!(matches!(
        extract_features(&rec, &[], None),
        Err(AmlError::MalformedInput { .. })
    ));

    let mut rec = record();
    rec.timestamp = "not-a-timestamp".to_string();
    assert!(matches!(
        extract_features(&rec, &[], None),
        Err(AmlError::MalformedInput { .. })
    ));

    let mut rec = record();
    rec.transaction_type = "wire".to_string();
    assert!(matches!(
        extract_features(&rec, &[], None),
        Err(AmlError::MalformedInput { .. })
    ));
}

/// Unknown counterparty defaults to the neutral midpoint and is treated
/// as novel.
#[test]
fn missing_counterparty_defaults() {
    let features = extract_features(&record(), &[], None).unwrap();
    assert!((features.counterparty_risk_score - 0.5).abs() < 1e-12);
    assert!(features.is_new_counterparty);
}

/// The model vector has a fixed shape with exactly one hot type slot.
#[test]
fn vector_shape_and_one_hot() {
    let features = extract_features(&record(), &[], None).unwrap();
    let v = features.to_vector();
    assert_eq!(v.len(), FEATURE_DIM);

    let one_hot = &v[FEATURE_DIM - 5..];
    assert_eq!(one_hot.iter().filter(|&&x| x == 1.0).count(), 1);
    // "payment" is the last slot in declaration order.
    assert_eq!(one_hot[4], 1.0);
}
