//! Rule-engine boundary tests. The comparison operators in these checks
//! are regulatory commitments; every boundary is pinned here.

use amlguard_core::{
    config::MonitorConfig,
    features::{extract_features, HistoryEntry, TransactionRecord},
    rules::RuleEngine,
    types::{AmlFlag, TransactionType},
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
}

fn record(amount: f64, tx_type: &str) -> TransactionRecord {
    TransactionRecord {
        transaction_id: "txn-1".to_string(),
        user_id: "user-1".to_string(),
        amount,
        transaction_type: tx_type.to_string(),
        currency: "JOD".to_string(),
        timestamp: base_time().to_rfc3339(),
        account_id: "acct-1".to_string(),
        account_age_days: 500,
        counterparty_id: None,
    }
}

fn prior(amount: f64, hours_before: i64) -> HistoryEntry {
    HistoryEntry {
        transaction_id: format!("hist-{hours_before}-{amount}"),
        amount,
        transaction_type: TransactionType::Deposit,
        timestamp: base_time() - Duration::hours(hours_before),
    }
}

fn evaluate(record: &TransactionRecord, history: &[HistoryEntry]) -> std::collections::BTreeSet<AmlFlag> {
    let engine = RuleEngine::new(MonitorConfig::default());
    let features = extract_features(record, history, None).unwrap();
    engine.evaluate(&features, history)
}

/// AMOUNT fires at exactly 10,000 and not a fils below.
#[test]
fn amount_threshold_is_inclusive() {
    let flags = evaluate(&record(10_000.0, "transfer"), &[]);
    assert!(flags.contains(&AmlFlag::Amount));

    let flags = evaluate(&record(9_999.99, "transfer"), &[]);
    assert!(!flags.contains(&AmlFlag::Amount));
}

/// STRUCTURING needs three in-band transactions in the prior 24h; two
/// are not enough.
#[test]
fn structuring_needs_three_in_band() {
    let three = vec![prior(9_500.0, 2), prior(9_000.0, 5), prior(9_999.0, 20)];
    let flags = evaluate(&record(9_400.0, "deposit"), &three);
    assert!(flags.contains(&AmlFlag::Structuring));

    let two = vec![prior(9_500.0, 2), prior(9_000.0, 5)];
    let flags = evaluate(&record(9_400.0, "deposit"), &two);
    assert!(!flags.contains(&AmlFlag::Structuring));
}

/// Transactions outside the 9,000–9,999 band never count toward
/// structuring, and neither do transactions older than 24h.
#[test]
fn structuring_band_and_window_are_strict() {
    let off_band = vec![prior(8_999.0, 2), prior(10_000.0, 3), prior(9_500.0, 4)];
    let flags = evaluate(&record(9_400.0, "deposit"), &off_band);
    assert!(!flags.contains(&AmlFlag::Structuring));

    let stale = vec![prior(9_500.0, 2), prior(9_500.0, 5), prior(9_500.0, 25)];
    let flags = evaluate(&record(9_400.0, "deposit"), &stale);
    assert!(!flags.contains(&AmlFlag::Structuring));
}

/// VELOCITY fires strictly above 5 tx/hour: 120 prior transactions in
/// 24h is exactly 5.0 and stays quiet, 121 fires.
#[test]
fn velocity_threshold_is_strict() {
    let mut history: Vec<HistoryEntry> = (1..=120)
        .map(|i| HistoryEntry {
            transaction_id: format!("hist-{i}"),
            amount: 50.0,
            transaction_type: TransactionType::Payment,
            timestamp: base_time() - Duration::minutes(i),
        })
        .collect();
    let flags = evaluate(&record(50.0, "payment"), &history);
    assert!(!flags.contains(&AmlFlag::Velocity));

    history.push(HistoryEntry {
        transaction_id: "hist-121".to_string(),
        amount: 50.0,
        transaction_type: TransactionType::Payment,
        timestamp: base_time() - Duration::minutes(121),
    });
    let flags = evaluate(&record(50.0, "payment"), &history);
    assert!(flags.contains(&AmlFlag::Velocity));
}

/// PATTERN (a): round multiples of 1,000 flag only from 10,000 upward.
#[test]
fn round_amount_pattern_has_a_floor() {
    let flags = evaluate(&record(12_000.0, "transfer"), &[]);
    assert!(flags.contains(&AmlFlag::Pattern));

    // Round but below the floor.
    let flags = evaluate(&record(9_000.0, "transfer"), &[]);
    assert!(!flags.contains(&AmlFlag::Pattern));

    // Above the floor but not round.
    let flags = evaluate(&record(12_345.0, "transfer"), &[]);
    assert!(!flags.contains(&AmlFlag::Pattern));
}

/// PATTERN (b): more than five night-time transactions in history.
#[test]
fn night_activity_pattern() {
    let night = |i: u32| HistoryEntry {
        transaction_id: format!("night-{i}"),
        amount: 100.0,
        transaction_type: TransactionType::Payment,
        timestamp: Utc.with_ymd_and_hms(2025, 3, 1 + i, 3, 0, 0).unwrap(),
    };

    let five: Vec<HistoryEntry> = (0..5).map(night).collect();
    let flags = evaluate(&record(100.0, "payment"), &five);
    assert!(!flags.contains(&AmlFlag::Pattern));

    let six: Vec<HistoryEntry> = (0..6).map(night).collect();
    let flags = evaluate(&record(100.0, "payment"), &six);
    assert!(flags.contains(&AmlFlag::Pattern));
}

/// BEHAVIOR (a): amount over ten times the user's historical average.
#[test]
fn behavior_deviation_from_average() {
    let history = vec![prior(100.0, 30), prior(100.0, 40), prior(100.0, 50)];

    let flags = evaluate(&record(1_001.0, "payment"), &history);
    assert!(flags.contains(&AmlFlag::Behavior));

    // Exactly 10x is allowed.
    let flags = evaluate(&record(1_000.0, "payment"), &history);
    assert!(!flags.contains(&AmlFlag::Behavior));

    // No history, no average baseline to deviate from.
    let flags = evaluate(&record(1_001.0, "payment"), &[]);
    assert!(!flags.contains(&AmlFlag::Behavior));
}

/// BEHAVIOR (b): young accounts moving large amounts.
#[test]
fn behavior_new_account_large_amount() {
    let mut young = record(6_000.0, "transfer");
    young.account_age_days = 10;
    let flags = evaluate(&young, &[]);
    assert!(flags.contains(&AmlFlag::Behavior));

    // 30 days is no longer "new".
    let mut seasoned = record(6_000.0, "transfer");
    seasoned.account_age_days = 30;
    let flags = evaluate(&seasoned, &[]);
    assert!(!flags.contains(&AmlFlag::Behavior));
}

/// Sanctions and PEP list hits flag by counterparty id, independently.
#[test]
fn sanctions_and_pep_list_matches() {
    let engine = RuleEngine::new(MonitorConfig::default())
        .with_sanctions(["CP-BAD".to_string()])
        .with_peps(["CP-PEP".to_string()]);

    let mut rec = record(100.0, "transfer");
    rec.counterparty_id = Some("CP-BAD".to_string());
    let features = extract_features(&rec, &[], None).unwrap();
    let flags = engine.evaluate(&features, &[]);
    assert!(flags.contains(&AmlFlag::Sanctioned));
    assert!(!flags.contains(&AmlFlag::Pep));

    rec.counterparty_id = Some("CP-PEP".to_string());
    let features = extract_features(&rec, &[], None).unwrap();
    let flags = engine.evaluate(&features, &[]);
    assert!(flags.contains(&AmlFlag::Pep));
    assert!(!flags.contains(&AmlFlag::Sanctioned));
}

/// Independent rules union: a large round transfer from a young account
/// collects all three flags at once.
#[test]
fn rules_do_not_mask_each_other() {
    let mut rec = record(11_000.0, "transfer");
    rec.account_age_days = 5;
    let flags = evaluate(&rec, &[]);
    assert!(flags.contains(&AmlFlag::Amount));
    assert!(flags.contains(&AmlFlag::Pattern));
    assert!(flags.contains(&AmlFlag::Behavior));
}
