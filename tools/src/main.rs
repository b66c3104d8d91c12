//! aml-runner: headless demo runner for the AML monitoring engine.
//!
//! Usage:
//!   aml-runner --seed 42 --count 200 --db run.db

use amlguard_core::{
    config::{MonitorConfig, ScoringConfig},
    features::{CounterpartyProfile, HistoryEntry, TransactionRecord},
    monitor::{AcceptingChannel, AmlMonitor, InMemoryHistory, StaticCounterparties},
    rng::{ComponentSlot, ModelRng},
    rules::RuleEngine,
    scoring::{self, RiskScoringService},
    store::MonitorStore,
    types::{RiskLevel, TransactionType},
};
use anyhow::Result;
use chrono::{Duration, Utc};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let count = parse_arg(&args, "--count", 200usize);
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");

    println!("AMLGuard — aml-runner");
    println!("  seed:  {seed}");
    println!("  count: {count}");
    println!("  db:    {db}");
    println!();

    let config = MonitorConfig {
        seed,
        ..MonitorConfig::default()
    };

    let mut rng = ModelRng::for_component(seed, ComponentSlot::Runner);
    let (history, counterparties, transactions) = build_scenario(&mut rng, count);

    let rules = RuleEngine::new(config.clone())
        .with_sanctions(["CP-SANCTIONED-001".to_string()])
        .with_peps(["CP-PEP-001".to_string()]);

    let store = MonitorStore::open(db)?;
    let monitor = AmlMonitor::new(
        store,
        config,
        rules,
        Box::new(history),
        Box::new(counterparties),
        Box::new(AcceptingChannel),
    )?;

    let mut alerts = 0usize;
    let mut critical = 0usize;
    for transaction in &transactions {
        match monitor.evaluate_transaction(transaction) {
            Ok(Some(alert)) => {
                alerts += 1;
                if alert.risk_level == RiskLevel::Critical {
                    critical += 1;
                }
                println!(
                    "  [{}] {} {}",
                    alert.risk_level.as_str(),
                    alert.alert_id,
                    alert.description
                );
            }
            Ok(None) => {}
            Err(err) => {
                log::warn!("evaluation failed for {}: {err}", transaction.transaction_id)
            }
        }
    }

    let dashboard = monitor.dashboard()?;
    println!();
    println!("=== RUN SUMMARY ===");
    println!("  transactions:   {}", transactions.len());
    println!("  alerts:         {alerts}");
    println!("  critical:       {critical}");
    println!("  reports filed:  {}", dashboard.reports_submitted);
    println!("  model version:  {}", dashboard.model_version);
    println!();
    println!("=== DASHBOARD (JSON) ===");
    println!("{}", serde_json::to_string_pretty(&dashboard)?);

    run_scoring_demo(seed, monitor.store())?;

    Ok(())
}

/// Build a demo population: a steady user with everyday spend, a burst
/// user, a structuring user, and a sanctioned-counterparty transfer.
fn build_scenario(
    rng: &mut ModelRng,
    count: usize,
) -> (InMemoryHistory, StaticCounterparties, Vec<TransactionRecord>) {
    let now = Utc::now();
    let mut history = InMemoryHistory::new();
    let mut counterparties = StaticCounterparties::new();

    counterparties.insert(
        "CP-SANCTIONED-001",
        CounterpartyProfile {
            risk_score: 0.95,
            is_sanctioned: true,
            is_pep: false,
            interaction_count: 0,
            first_interaction: true,
        },
    );
    counterparties.insert(
        "CP-RETAIL-001",
        CounterpartyProfile {
            risk_score: 0.1,
            is_sanctioned: false,
            is_pep: false,
            interaction_count: 40,
            first_interaction: false,
        },
    );

    // Steady user's everyday history.
    for i in 0..30 {
        history.record(
            "user-steady",
            HistoryEntry {
                transaction_id: format!("hist-steady-{i}"),
                amount: rng.uniform(20.0, 200.0),
                transaction_type: TransactionType::Payment,
                timestamp: now - Duration::days(i + 1),
            },
        );
    }

    // Structuring user: repeated just-under-threshold deposits today.
    for i in 0..4 {
        history.record(
            "user-structurer",
            HistoryEntry {
                transaction_id: format!("hist-struct-{i}"),
                amount: 9_500.0,
                transaction_type: TransactionType::Deposit,
                timestamp: now - Duration::hours(2 * (i + 1)),
            },
        );
    }

    let mut transactions = Vec::with_capacity(count + 3);
    for i in 0..count {
        transactions.push(TransactionRecord {
            transaction_id: format!("txn-{i}"),
            user_id: "user-steady".to_string(),
            amount: rng.uniform(20.0, 300.0),
            transaction_type: "payment".to_string(),
            currency: "JOD".to_string(),
            timestamp: (now - Duration::minutes(rng.next_below(1_000) as i64)).to_rfc3339(),
            account_id: "acct-steady".to_string(),
            account_age_days: 700,
            counterparty_id: Some("CP-RETAIL-001".to_string()),
        });
    }

    transactions.push(TransactionRecord {
        transaction_id: "txn-large".to_string(),
        user_id: "user-steady".to_string(),
        amount: 12_000.0,
        transaction_type: "transfer".to_string(),
        currency: "JOD".to_string(),
        timestamp: now.to_rfc3339(),
        account_id: "acct-steady".to_string(),
        account_age_days: 700,
        counterparty_id: None,
    });
    transactions.push(TransactionRecord {
        transaction_id: "txn-structured".to_string(),
        user_id: "user-structurer".to_string(),
        amount: 9_400.0,
        transaction_type: "deposit".to_string(),
        currency: "JOD".to_string(),
        timestamp: now.to_rfc3339(),
        account_id: "acct-structurer".to_string(),
        account_age_days: 15,
        counterparty_id: None,
    });
    transactions.push(TransactionRecord {
        transaction_id: "txn-sanctioned".to_string(),
        user_id: "user-steady".to_string(),
        amount: 500.0,
        transaction_type: "transfer".to_string(),
        currency: "JOD".to_string(),
        timestamp: now.to_rfc3339(),
        account_id: "acct-steady".to_string(),
        account_age_days: 700,
        counterparty_id: Some("CP-SANCTIONED-001".to_string()),
    });

    (history, counterparties, transactions)
}

fn run_scoring_demo(seed: u64, store: &MonitorStore) -> Result<()> {
    let mut rng = ModelRng::for_component(seed, ComponentSlot::Runner);
    let mut pool = scoring::synthetic_fraud_examples(&mut rng);
    // One legitimate and one fraudulent profile from the synthetic pool.
    let legit = pool.swap_remove(0).0;
    let fraudulent = pool.pop().map(|(f, _)| f);

    let mut profiles = scoring::StaticProfiles::new();
    let mut user_ids = Vec::new();
    for features in [Some(legit), fraudulent].into_iter().flatten() {
        user_ids.push(features.user_id.clone());
        profiles.insert(features);
    }

    let service = RiskScoringService::new(
        ScoringConfig {
            seed,
            ..ScoringConfig::default()
        },
        Box::new(profiles),
    )?;

    println!();
    println!("=== RISK SCORING DEMO ===");
    for user_id in &user_ids {
        let assessment = service.assess_user_risk(user_id, None, store)?;
        println!(
            "  {} | level: {} | risk: {:.2} | credit: {:.2} | fraud: {:.2}",
            assessment.user_id,
            assessment.risk_level.as_str(),
            assessment.risk_score,
            assessment.credit_score,
            assessment.fraud_score
        );
        for rec in &assessment.details.recommendations {
            println!("      - {rec}");
        }
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
