//! Risk aggregation: flag penalties, clipping, critical overrides, and
//! the five-way user risk banding.

use amlguard_core::{
    aggregate::{adjusted_score, overall_user_risk, risk_level, user_risk_level},
    config::{RiskThresholds, ScoringConfig},
    types::{AmlFlag, RiskLevel, UserRiskLevel},
};
use std::collections::BTreeSet;

fn flags(items: &[AmlFlag]) -> BTreeSet<AmlFlag> {
    items.iter().copied().collect()
}

/// Each flag adds 0.2; the sum is clipped to 1.0.
#[test]
fn flag_penalty_and_clipping() {
    let none = flags(&[]);
    assert!((adjusted_score(0.3, &none) - 0.3).abs() < 1e-12);

    let one = flags(&[AmlFlag::Amount]);
    assert!((adjusted_score(0.3, &one) - 0.5).abs() < 1e-12);

    let two = flags(&[AmlFlag::Amount, AmlFlag::Velocity]);
    assert!((adjusted_score(0.9, &two) - 1.0).abs() < 1e-12, "must clip at 1.0");
}

/// A sanctions or structuring hit forces Critical no matter how benign
/// the model score is.
#[test]
fn critical_violations_override_score() {
    let thresholds = RiskThresholds::default();

    let sanctioned = flags(&[AmlFlag::Sanctioned]);
    assert_eq!(risk_level(0.01, &sanctioned, &thresholds), RiskLevel::Critical);

    let structuring = flags(&[AmlFlag::Structuring]);
    assert_eq!(risk_level(0.0, &structuring, &thresholds), RiskLevel::Critical);
}

/// Band thresholds are inclusive at the lower edge.
#[test]
fn risk_bands_are_inclusive() {
    let thresholds = RiskThresholds::default();
    let none = flags(&[]);

    assert_eq!(risk_level(0.49, &none, &thresholds), RiskLevel::Low);
    assert_eq!(risk_level(0.5, &none, &thresholds), RiskLevel::Medium);
    assert_eq!(risk_level(0.7, &none, &thresholds), RiskLevel::High);
    assert_eq!(risk_level(0.89, &none, &thresholds), RiskLevel::High);
    assert_eq!(risk_level(0.9, &none, &thresholds), RiskLevel::Critical);
}

/// A non-critical flag raises the band through the 0.2 penalty rather
/// than through an override.
#[test]
fn flag_penalty_moves_the_band() {
    let thresholds = RiskThresholds::default();
    let velocity = flags(&[AmlFlag::Velocity]);

    // 0.55 + 0.2 = 0.75 lands in High, not Medium.
    assert_eq!(risk_level(0.55, &velocity, &thresholds), RiskLevel::High);
}

/// Weighted overall user risk: 50% inverse credit, 30% fraud, 20%
/// behavioral, clamped to [0, 1].
#[test]
fn overall_risk_weighting() {
    let config = ScoringConfig::default();

    let overall = overall_user_risk(0.4, 0.6, 0.5, &config);
    assert!((overall - (0.4 * 0.5 + 0.6 * 0.3 + 0.5 * 0.2)).abs() < 1e-12);

    assert!((overall_user_risk(1.0, 1.0, 1.0, &config) - 1.0).abs() < 1e-12);
    assert!(overall_user_risk(0.0, 0.0, 0.0, &config).abs() < 1e-12);
}

/// User risk levels band with inclusive upper edges.
#[test]
fn user_risk_level_edges() {
    let config = ScoringConfig::default();

    assert_eq!(user_risk_level(0.0, &config), UserRiskLevel::VeryLow);
    assert_eq!(user_risk_level(0.2, &config), UserRiskLevel::VeryLow);
    assert_eq!(user_risk_level(0.21, &config), UserRiskLevel::Low);
    assert_eq!(user_risk_level(0.4, &config), UserRiskLevel::Low);
    assert_eq!(user_risk_level(0.6, &config), UserRiskLevel::Medium);
    assert_eq!(user_risk_level(0.8, &config), UserRiskLevel::High);
    assert_eq!(user_risk_level(0.81, &config), UserRiskLevel::VeryHigh);
    assert_eq!(user_risk_level(1.0, &config), UserRiskLevel::VeryHigh);
}
