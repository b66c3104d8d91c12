//! Transaction monitoring orchestrator.
//!
//! [`AmlMonitor`] wires the feature extractor, the rule engine, the fraud
//! scorer, and the store into the evaluation pipeline:
//!
//!   history + counterparty lookup → features → rules ∪ model score →
//!   aggregated risk level → alert (persisted) → compliance report for
//!   critical alerts.
//!
//! RULE: the alert row is inserted before the compliance channel is
//! called. A channel outage can delay the regulatory report but never
//! lose the alert.

use crate::{
    aggregate,
    alerts::{self, AmlAlert, ComplianceReport},
    config::MonitorConfig,
    error::{AmlError, AmlResult},
    features::{self, CounterpartyProfile, HistoryEntry, TransactionFeatures, TransactionRecord},
    rules::RuleEngine,
    scorer::{FittedModel, FraudScorer, MODEL_SNAPSHOT_NAME},
    store::MonitorStore,
    types::{AmlFlag, RiskLevel, UserId},
};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Source of a user's prior transactions.
pub trait HistoryProvider {
    fn history_for(&self, user_id: &str) -> AmlResult<Vec<HistoryEntry>>;
}

/// Source of counterparty risk metadata.
pub trait CounterpartyProvider {
    fn lookup(&self, counterparty_id: &str) -> AmlResult<Option<CounterpartyProfile>>;
}

/// Outbound channel for regulatory reports on critical alerts.
pub trait ComplianceChannel {
    /// Submit a report; returns the regulator's case number.
    fn submit(&self, report: &ComplianceReport) -> AmlResult<String>;
}

/// In-memory history source (tests and the demo runner).
#[derive(Default)]
pub struct InMemoryHistory {
    entries: HashMap<UserId, Vec<HistoryEntry>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, user_id: &str, entry: HistoryEntry) {
        self.entries.entry(user_id.to_string()).or_default().push(entry);
    }
}

impl HistoryProvider for InMemoryHistory {
    fn history_for(&self, user_id: &str) -> AmlResult<Vec<HistoryEntry>> {
        Ok(self.entries.get(user_id).cloned().unwrap_or_default())
    }
}

/// Fixed counterparty table (tests and the demo runner).
#[derive(Default)]
pub struct StaticCounterparties {
    profiles: HashMap<String, CounterpartyProfile>,
}

impl StaticCounterparties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, counterparty_id: &str, profile: CounterpartyProfile) {
        self.profiles.insert(counterparty_id.to_string(), profile);
    }
}

impl CounterpartyProvider for StaticCounterparties {
    fn lookup(&self, counterparty_id: &str) -> AmlResult<Option<CounterpartyProfile>> {
        Ok(self.profiles.get(counterparty_id).cloned())
    }
}

/// Channel that acknowledges every report with a synthetic case number.
/// Stands in for the real regulator integration in tests and demos.
pub struct AcceptingChannel;

impl ComplianceChannel for AcceptingChannel {
    fn submit(&self, report: &ComplianceReport) -> AmlResult<String> {
        let case_number = format!("CASE-{}", &report.report_id);
        log::info!(
            "compliance report {} submitted for alert {} (case {case_number})",
            report.report_id,
            report.alert_id
        );
        Ok(case_number)
    }
}

/// Operational summary for the monitoring dashboard.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MonitorDashboard {
    pub total_alerts: i64,
    /// Alert counts per risk level over the trailing 7 days.
    pub alerts_7d_by_level: Vec<(RiskLevel, i64)>,
    pub recent_alerts: Vec<AmlAlert>,
    pub reports_submitted: i64,
    pub model_version: u32,
    pub feedback_buffered: usize,
}

pub struct AmlMonitor {
    config: MonitorConfig,
    store: MonitorStore,
    scorer: FraudScorer,
    rules: RuleEngine,
    history: Box<dyn HistoryProvider>,
    counterparties: Box<dyn CounterpartyProvider>,
    compliance: Box<dyn ComplianceChannel>,
}

impl AmlMonitor {
    /// Build the monitor: migrates the store, then restores the latest
    /// persisted model snapshot or bootstrap-trains and persists one.
    pub fn new(
        store: MonitorStore,
        config: MonitorConfig,
        rules: RuleEngine,
        history: Box<dyn HistoryProvider>,
        counterparties: Box<dyn CounterpartyProvider>,
        compliance: Box<dyn ComplianceChannel>,
    ) -> AmlResult<Self> {
        store.migrate()?;

        let scorer = match store.load_latest_snapshot(MODEL_SNAPSHOT_NAME)? {
            Some((version, state_json)) => {
                match serde_json::from_str::<FittedModel>(&state_json) {
                    Ok(snapshot) => {
                        log::info!("restored fraud scorer snapshot version {version}");
                        FraudScorer::from_snapshot(config.clone(), snapshot)
                    }
                    Err(err) => {
                        // A corrupt snapshot must not take the monitor down;
                        // fall through to a fresh bootstrap instead.
                        let err = AmlError::ModelUnavailable {
                            reason: format!("snapshot version {version}: {err}"),
                        };
                        log::warn!("{err}; bootstrap-training a replacement");
                        FraudScorer::new(config.clone())
                    }
                }
            }
            None => FraudScorer::new(config.clone()),
        };

        let monitor = Self {
            config,
            store,
            scorer,
            rules,
            history,
            counterparties,
            compliance,
        };

        if let Some(snapshot) = monitor.scorer.ensure_trained()? {
            monitor.persist_snapshot(&snapshot)?;
        }
        Ok(monitor)
    }

    pub fn model_version(&self) -> u32 {
        self.scorer.model_version()
    }

    pub fn store(&self) -> &MonitorStore {
        &self.store
    }

    /// Evaluate one transaction end to end. Returns the generated alert,
    /// or `None` when the transaction is clean (Low risk, no flags).
    ///
    /// Idempotent against a fixed history snapshot: the rules and the
    /// model are deterministic for a given seed, so re-evaluating the
    /// same transaction yields the same level and flags.
    pub fn evaluate_transaction(
        &self,
        transaction: &TransactionRecord,
    ) -> AmlResult<Option<AmlAlert>> {
        let history = self.history.history_for(&transaction.user_id)?;
        let counterparty = match &transaction.counterparty_id {
            Some(id) => self.counterparties.lookup(id)?,
            None => None,
        };

        let features =
            features::extract_features(transaction, &history, counterparty.as_ref())?;

        let mut flags = self.rules.evaluate(&features, &history);
        // The counterparty provider is authoritative alongside the static
        // lists: a profile marked sanctioned/PEP flags even when the id is
        // missing from the configured lists.
        if let Some(profile) = &counterparty {
            if profile.is_sanctioned {
                flags.insert(AmlFlag::Sanctioned);
            }
            if profile.is_pep {
                flags.insert(AmlFlag::Pep);
            }
        }

        let (model_score, explanation) = self.scorer.predict(&features);
        let level = aggregate::risk_level(model_score, &flags, &self.config.risk_thresholds);
        let score = aggregate::adjusted_score(model_score, &flags);

        log::debug!(
            "evaluated {}: score {score:.3}, level {}, flags {:?}",
            transaction.transaction_id,
            level.as_str(),
            flags
        );

        if level == RiskLevel::Low && flags.is_empty() {
            return Ok(None);
        }

        let now = Utc::now();
        let alert = alerts::generate_alert(&features, level, score, &flags, &explanation, now);
        let features_json = serde_json::to_string(&features)?;
        self.store.insert_alert(&alert, &features_json)?;
        log::info!(
            "alert {} raised for transaction {} ({})",
            alert.alert_id,
            alert.transaction_id,
            alert.risk_level.as_str()
        );

        if level == RiskLevel::Critical {
            self.report_critical(&alert, &features.currency, now);
        }

        Ok(Some(alert))
    }

    /// File the regulatory report for a critical alert. Channel failures
    /// are logged, not propagated: the alert row already exists and the
    /// report can be refiled by the escalation workflow.
    fn report_critical(&self, alert: &AmlAlert, currency: &str, now: chrono::DateTime<Utc>) {
        let report = alerts::build_report(alert, currency, now);
        match self.compliance.submit(&report) {
            Ok(case_number) => {
                if let Err(err) = self
                    .store
                    .insert_compliance_report(&report)
                    .and_then(|()| self.store.mark_alert_reported(&alert.alert_id, &case_number))
                {
                    log::error!(
                        "report {} submitted but not recorded for alert {}: {err}",
                        report.report_id,
                        alert.alert_id
                    );
                }
            }
            Err(err) => {
                log::error!(
                    "compliance submission failed for alert {}: {err}",
                    alert.alert_id
                );
            }
        }
    }

    /// Close out an alert with the analyst's verdict and feed the label
    /// back to the scorer. A confirmed alert (not a false positive) is a
    /// fraud label; the features scored at alert time are replayed from
    /// the stored snapshot, so the label matches what the model saw.
    pub fn submit_feedback(
        &self,
        alert_id: &str,
        false_positive: bool,
        resolution: &str,
        analyst_id: &str,
    ) -> AmlResult<()> {
        let (alert, features_json) =
            self.store
                .get_alert(alert_id)?
                .ok_or_else(|| AmlError::MalformedInput {
                    reason: format!("unknown alert '{alert_id}'"),
                })?;

        self.store
            .resolve_alert(alert_id, false_positive, resolution, analyst_id, Utc::now())?;

        let features: TransactionFeatures = serde_json::from_str(&features_json)?;
        let retrained = self.scorer.add_feedback(
            alert.transaction_id.clone(),
            features,
            !false_positive,
            alert.score,
        )?;

        if let Some(snapshot) = retrained {
            self.persist_snapshot(&snapshot)?;
        }
        Ok(())
    }

    fn persist_snapshot(&self, snapshot: &Arc<FittedModel>) -> AmlResult<()> {
        self.store.save_model_snapshot(
            MODEL_SNAPSHOT_NAME,
            snapshot.version,
            &serde_json::to_string(snapshot.as_ref())?,
            snapshot.trained_at,
        )
    }

    /// Operational counters for the monitoring dashboard.
    pub fn dashboard(&self) -> AmlResult<MonitorDashboard> {
        let since = Utc::now() - Duration::days(7);
        Ok(MonitorDashboard {
            total_alerts: self.store.alert_count()?,
            alerts_7d_by_level: self.store.alert_counts_by_level(since)?,
            recent_alerts: self.store.recent_alerts(10)?,
            reports_submitted: self.store.report_count()?,
            model_version: self.scorer.model_version(),
            feedback_buffered: self.scorer.feedback_len(),
        })
    }
}
