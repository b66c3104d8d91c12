//! Rule-based compliance checks.
//!
//! Seven deterministic checks, each a pure function of the feature record
//! and history. All checks run independently — no short-circuiting — and
//! the resulting flags are unioned, so one firing rule never masks
//! another. Boundary semantics here are load-bearing for the regulatory
//! tests: read the comparison operators carefully before changing them.

use crate::{
    config::MonitorConfig,
    features::{HistoryEntry, TransactionFeatures},
    types::AmlFlag,
};
use chrono::{Duration, Timelike};
use std::collections::{BTreeSet, HashSet};

pub struct RuleEngine {
    config: MonitorConfig,
    sanctions: HashSet<String>,
    peps: HashSet<String>,
}

impl RuleEngine {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            sanctions: HashSet::new(),
            peps: HashSet::new(),
        }
    }

    /// Replace the static sanctions list.
    pub fn with_sanctions<I: IntoIterator<Item = String>>(mut self, ids: I) -> Self {
        self.sanctions = ids.into_iter().collect();
        self
    }

    /// Replace the static PEP list.
    pub fn with_peps<I: IntoIterator<Item = String>>(mut self, ids: I) -> Self {
        self.peps = ids.into_iter().collect();
        self
    }

    /// Run every check and union the flags. Deterministic for fixed
    /// inputs; the returned set is ordered by flag declaration order.
    pub fn evaluate(
        &self,
        features: &TransactionFeatures,
        history: &[HistoryEntry],
    ) -> BTreeSet<AmlFlag> {
        let mut flags = BTreeSet::new();

        if self.check_amount(features) {
            flags.insert(AmlFlag::Amount);
        }
        if self.check_structuring(features, history) {
            flags.insert(AmlFlag::Structuring);
        }
        if self.check_velocity(features) {
            flags.insert(AmlFlag::Velocity);
        }
        if self.check_pattern(features, history) {
            flags.insert(AmlFlag::Pattern);
        }
        if self.check_behavior(features) {
            flags.insert(AmlFlag::Behavior);
        }
        if let Some(cp) = &features.counterparty_id {
            if self.sanctions.contains(cp) {
                flags.insert(AmlFlag::Sanctioned);
            }
            if self.peps.contains(cp) {
                flags.insert(AmlFlag::Pep);
            }
        }

        flags
    }

    /// AMOUNT: at or above the large-transaction threshold.
    fn check_amount(&self, features: &TransactionFeatures) -> bool {
        features.amount >= self.config.large_transaction_threshold
    }

    /// STRUCTURING: three or more prior transactions in the preceding 24h
    /// with amounts inside the just-under-threshold band (smurfing).
    fn check_structuring(
        &self,
        features: &TransactionFeatures,
        history: &[HistoryEntry],
    ) -> bool {
        let window_start = features.timestamp - Duration::hours(24);
        let in_band = history
            .iter()
            .filter(|e| e.timestamp < features.timestamp && e.timestamp > window_start)
            .filter(|e| {
                e.amount >= self.config.structuring_band_low
                    && e.amount <= self.config.structuring_band_high
            })
            .count();
        in_band >= self.config.structuring_count
    }

    /// VELOCITY: strictly more than the threshold transactions per hour.
    /// Exactly 5.0 does not fire.
    fn check_velocity(&self, features: &TransactionFeatures) -> bool {
        features.user_velocity_score > self.config.velocity_threshold
    }

    /// PATTERN: (a) round multiple of 1000 at or above the floor, or
    /// (b) more than the configured count of night-time transactions
    /// (outside 06:00–23:00) anywhere in history.
    fn check_pattern(&self, features: &TransactionFeatures, history: &[HistoryEntry]) -> bool {
        let round_amount = features.amount >= self.config.round_amount_floor
            && (features.amount % self.config.round_amount_multiple).abs() < f64::EPSILON;
        if round_amount {
            return true;
        }

        let night_count = history
            .iter()
            .filter(|e| {
                let hour = e.timestamp.hour();
                hour < 6 || hour > 23
            })
            .count();
        night_count > self.config.night_transaction_count
    }

    /// BEHAVIOR: (a) amount exceeds the configured multiple of the user's
    /// historical average (only when an average exists), or (b) a young
    /// account moving more than the new-account cap.
    fn check_behavior(&self, features: &TransactionFeatures) -> bool {
        if features.user_avg_amount > 0.0
            && features.amount
                > self.config.behavior_avg_multiplier * features.user_avg_amount
        {
            return true;
        }
        features.account_age_days < self.config.new_account_age_days
            && features.amount > self.config.new_account_amount
    }
}
