//! Risk aggregation: model score + rule flags → discrete risk level.

use crate::{
    config::{RiskThresholds, ScoringConfig},
    types::{AmlFlag, RiskLevel, UserRiskLevel},
};
use std::collections::BTreeSet;

/// Model score adjusted for rule violations, clipped to [0, 1].
/// Each flag adds a fixed 0.2 penalty.
pub fn adjusted_score(model_score: f64, flags: &BTreeSet<AmlFlag>) -> f64 {
    (model_score + 0.2 * flags.len() as f64).clamp(0.0, 1.0)
}

/// Combine the model score and rule flags into an AML risk level.
///
/// SANCTIONED and STRUCTURING are critical violations: either forces
/// Critical regardless of the score. Otherwise the adjusted score is
/// banded against ascending thresholds, taking the highest band cleared.
pub fn risk_level(
    model_score: f64,
    flags: &BTreeSet<AmlFlag>,
    thresholds: &RiskThresholds,
) -> RiskLevel {
    if flags.contains(&AmlFlag::Sanctioned) || flags.contains(&AmlFlag::Structuring) {
        return RiskLevel::Critical;
    }

    let score = adjusted_score(model_score, flags);
    if score >= thresholds.critical {
        RiskLevel::Critical
    } else if score >= thresholds.high {
        RiskLevel::High
    } else if score >= thresholds.medium {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Weighted overall risk for the user risk-scoring subsystem.
///
/// `normalized_credit` must already be inverted (1.0 = worst credit) and
/// all components normalized to [0, 1].
pub fn overall_user_risk(
    normalized_credit: f64,
    fraud_score: f64,
    behavioral_score: f64,
    config: &ScoringConfig,
) -> f64 {
    (normalized_credit * config.credit_weight
        + fraud_score * config.fraud_weight
        + behavioral_score * config.behavioral_weight)
        .clamp(0.0, 1.0)
}

/// Band an overall risk score into the five-way user risk level.
pub fn user_risk_level(score: f64, config: &ScoringConfig) -> UserRiskLevel {
    if score <= config.band_very_low {
        UserRiskLevel::VeryLow
    } else if score <= config.band_low {
        UserRiskLevel::Low
    } else if score <= config.band_medium {
        UserRiskLevel::Medium
    } else if score <= config.band_high {
        UserRiskLevel::High
    } else {
        UserRiskLevel::VeryHigh
    }
}
