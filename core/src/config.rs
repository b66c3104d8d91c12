//! Engine configuration.
//!
//! Thresholds follow the Jordan Central Bank monitoring parameters the
//! system ships with; everything is overridable through a deserialized
//! config file so compliance can retune without a rebuild.

use serde::{Deserialize, Serialize};

/// Risk-level band thresholds for the AML aggregator. A score clears a
/// band when it is greater than or equal to the band's threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low: 0.3,
            medium: 0.5,
            high: 0.7,
            critical: 0.9,
        }
    }
}

/// Full configuration for the AML transaction monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Master seed. All model randomness (tree sampling, bootstrap data)
    /// derives from this, so a run is reproducible end to end.
    pub seed: u64,

    pub risk_thresholds: RiskThresholds,

    /// Amount at or above which the AMOUNT flag fires (base currency).
    pub large_transaction_threshold: f64,
    /// Inclusive band of amounts counted toward structuring.
    pub structuring_band_low: f64,
    pub structuring_band_high: f64,
    /// Transactions inside the band within 24h needed to flag STRUCTURING.
    pub structuring_count: usize,
    /// VELOCITY fires strictly above this many transactions per hour.
    pub velocity_threshold: f64,
    /// PATTERN (a): amount is a multiple of this and at least the floor.
    pub round_amount_multiple: f64,
    pub round_amount_floor: f64,
    /// PATTERN (b): more than this many transactions outside 06:00–23:00.
    pub night_transaction_count: usize,
    /// BEHAVIOR (a): amount exceeds this multiple of the user average.
    pub behavior_avg_multiplier: f64,
    /// BEHAVIOR (b): account younger than this with amount above the cap.
    pub new_account_age_days: i64,
    pub new_account_amount: f64,

    /// Feedback buffer capacity; oldest entries are evicted past this.
    pub feedback_capacity: usize,
    /// Buffered labeled examples that trigger a retrain.
    pub retrain_threshold: usize,
    /// Retrain is skipped (buffer kept) below this many usable examples.
    pub min_retrain_samples: usize,

    /// Expected share of outliers in bootstrap training data.
    pub contamination: f64,
    /// Trees per forest for both the outlier model and the classifier.
    pub n_estimators: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            risk_thresholds: RiskThresholds::default(),
            large_transaction_threshold: 10_000.0,
            structuring_band_low: 9_000.0,
            structuring_band_high: 9_999.0,
            structuring_count: 3,
            velocity_threshold: 5.0,
            round_amount_multiple: 1_000.0,
            round_amount_floor: 10_000.0,
            night_transaction_count: 5,
            behavior_avg_multiplier: 10.0,
            new_account_age_days: 30,
            new_account_amount: 5_000.0,
            feedback_capacity: 1_000,
            retrain_threshold: 100,
            min_retrain_samples: 10,
            contamination: 0.1,
            n_estimators: 100,
        }
    }
}

/// Configuration for the user risk-scoring subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub seed: u64,

    /// Weights for overall risk: inverse credit, fraud, behavioral.
    pub credit_weight: f64,
    pub fraud_weight: f64,
    pub behavioral_weight: f64,

    /// Ascending band edges for the five-way user risk level.
    pub band_very_low: f64,
    pub band_low: f64,
    pub band_medium: f64,
    pub band_high: f64,

    /// Credit score range (Jordan Central Bank guideline scale).
    pub credit_score_min: f64,
    pub credit_score_max: f64,

    pub n_estimators: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            credit_weight: 0.5,
            fraud_weight: 0.3,
            behavioral_weight: 0.2,
            band_very_low: 0.2,
            band_low: 0.4,
            band_medium: 0.6,
            band_high: 0.8,
            credit_score_min: 300.0,
            credit_score_max: 850.0,
            n_estimators: 100,
        }
    }
}
