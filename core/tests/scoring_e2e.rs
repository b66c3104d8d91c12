//! Risk-scoring service: assessment persistence, score ordering between
//! profiles, and the neutral fallback.

use amlguard_core::{
    config::ScoringConfig,
    scoring::{
        EducationLevel, EmploymentStatus, IncomeLevel, MaritalStatus, RiskFeatures,
        RiskScoringService, StaticProfiles, TransactionContext,
    },
    store::MonitorStore,
    types::UserRiskLevel,
};
use chrono::{TimeZone, Utc};

fn quick_service(seed: u64, profiles: StaticProfiles) -> RiskScoringService {
    RiskScoringService::new(
        ScoringConfig {
            seed,
            n_estimators: 10,
            ..ScoringConfig::default()
        },
        Box::new(profiles),
    )
    .unwrap()
}

/// Profile table with the two reference users registered.
fn reference_profiles() -> StaticProfiles {
    let mut profiles = StaticProfiles::new();
    profiles.insert(steady_profile("user-steady"));
    profiles.insert(risky_profile("user-risky"));
    profiles
}

fn scoring_store() -> MonitorStore {
    let store = MonitorStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
}

fn steady_profile(user_id: &str) -> RiskFeatures {
    RiskFeatures {
        user_id: user_id.to_string(),
        timestamp: Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap(),
        age: 42,
        income_level: IncomeLevel::High,
        employment_status: EmploymentStatus::Employed,
        education_level: EducationLevel::Master,
        marital_status: MaritalStatus::Married,
        total_assets: 150_000.0,
        total_liabilities: 25_000.0,
        monthly_income: 4_500.0,
        monthly_expenses: 2_500.0,
        credit_utilization: 0.2,
        debt_to_income: 0.15,
        avg_transaction_amount: 250.0,
        transaction_frequency: 35.0,
        transaction_velocity: 2.0,
        unusual_transaction_count: 0,
        foreign_transaction_count: 0,
        night_transaction_count: 1,
        weekend_transaction_count: 8,
        login_frequency: 3.0,
        device_count: 1,
        location_count: 1,
        failed_login_attempts: 0,
        time_between_actions: 25.0,
        account_count: 2,
        account_age_avg: 900.0,
        balance_volatility: 0.15,
        overdraft_frequency: 0,
        returned_payment_count: 0,
        income_stability: 0.95,
        savings_rate: 0.3,
        investment_activity: 0.15,
        credit_bureau_score: Some(790),
        sanctions_check: false,
        pep_check: false,
        adverse_media_check: false,
    }
}

fn risky_profile(user_id: &str) -> RiskFeatures {
    RiskFeatures {
        user_id: user_id.to_string(),
        income_level: IncomeLevel::Low,
        employment_status: EmploymentStatus::Unemployed,
        marital_status: MaritalStatus::Single,
        total_assets: 8_000.0,
        total_liabilities: 30_000.0,
        monthly_income: 900.0,
        monthly_expenses: 1_100.0,
        credit_utilization: 0.9,
        debt_to_income: 0.65,
        avg_transaction_amount: 3_000.0,
        transaction_frequency: 120.0,
        transaction_velocity: 30.0,
        unusual_transaction_count: 12,
        foreign_transaction_count: 6,
        night_transaction_count: 20,
        weekend_transaction_count: 35,
        login_frequency: 25.0,
        device_count: 6,
        location_count: 5,
        failed_login_attempts: 9,
        time_between_actions: 0.8,
        account_age_avg: 20.0,
        balance_volatility: 0.8,
        overdraft_frequency: 4,
        returned_payment_count: 2,
        income_stability: 0.3,
        savings_rate: 0.02,
        investment_activity: 0.0,
        credit_bureau_score: Some(410),
        sanctions_check: true,
        pep_check: false,
        adverse_media_check: true,
        ..steady_profile(user_id)
    }
}

/// Every assessment is persisted and retrievable as the user's latest.
#[test]
fn assessment_is_persisted() {
    let service = quick_service(42, reference_profiles());
    let store = scoring_store();

    let assessment = service
        .assess_user_risk("user-steady", None, &store)
        .unwrap();

    assert!((0.0..=1.0).contains(&assessment.risk_score));
    assert!((0.0..=1.0).contains(&assessment.credit_score));
    assert!(!assessment.details.recommendations.is_empty());
    assert!(assessment.details.decision_reasoning.contains("Credit score"));

    let latest = store.latest_assessment("user-steady").unwrap().unwrap();
    assert_eq!(latest.assessment_id, assessment.assessment_id);
    assert_eq!(latest.risk_level, assessment.risk_level);
    assert_eq!(store.assessment_count().unwrap(), 1);
}

/// A burst-pattern profile with watchlist hits scores strictly above a
/// steady one on every component.
#[test]
fn risky_profile_outscores_steady_profile() {
    let service = quick_service(42, reference_profiles());
    let store = scoring_store();

    let steady = service
        .assess_user_risk("user-steady", None, &store)
        .unwrap();
    let risky = service
        .assess_user_risk("user-risky", None, &store)
        .unwrap();

    assert!(
        risky.risk_score > steady.risk_score,
        "risky {} must beat steady {}",
        risky.risk_score,
        steady.risk_score
    );
    assert!(risky.fraud_score > steady.fraud_score);
    assert!(risky.behavioral_score > steady.behavioral_score);
    assert!(risky
        .details
        .fraud_indicators
        .iter()
        .any(|i| i == "Sanctions list match"));
}

/// Behavioral tripwires: the steady profile sits at the 0.5 baseline,
/// the risky one trips all five.
#[test]
fn behavioral_component_bounds() {
    let service = quick_service(42, reference_profiles());
    let store = scoring_store();

    let steady = service
        .assess_user_risk("user-steady", None, &store)
        .unwrap();
    assert!((steady.behavioral_score - 0.5).abs() < 1e-9);

    let risky = service
        .assess_user_risk("user-risky", None, &store)
        .unwrap();
    assert!((risky.behavioral_score - 1.0).abs() < 1e-9);
}

/// Non-finite inputs degrade to the neutral Medium assessment flagged
/// for manual review, and the fallback is still persisted.
#[test]
fn neutral_fallback_on_malformed_profile() {
    let mut broken = steady_profile("user-broken");
    broken.monthly_income = f64::NAN;
    let mut profiles = StaticProfiles::new();
    profiles.insert(broken);

    let service = quick_service(42, profiles);
    let store = scoring_store();

    let assessment = service.assess_user_risk("user-broken", None, &store).unwrap();
    assert_eq!(assessment.risk_level, UserRiskLevel::Medium);
    assert!((assessment.risk_score - 0.5).abs() < 1e-12);
    assert!(assessment
        .details
        .recommendations
        .iter()
        .any(|r| r == "Manual review required"));
    assert_eq!(store.assessment_count().unwrap(), 1);
}

/// Repeated assessments accumulate as history, newest first.
#[test]
fn assessment_history_orders_newest_first() {
    let mut profiles = StaticProfiles::new();
    profiles.insert(steady_profile("user-hist"));
    let service = quick_service(42, profiles);
    let store = scoring_store();

    service.assess_user_risk("user-hist", None, &store).unwrap();
    service.assess_user_risk("user-hist", None, &store).unwrap();

    let history = store.assessment_history("user-hist").unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].created_at >= history[1].created_at);
}

/// Same seed, same profile, same banded outcome: the scoring models are
/// deterministic per seed.
#[test]
fn scoring_is_deterministic_per_seed() {
    let mut profiles_a = StaticProfiles::new();
    profiles_a.insert(steady_profile("user-det"));
    let mut profiles_b = StaticProfiles::new();
    profiles_b.insert(steady_profile("user-det"));

    let service_a = quick_service(7, profiles_a);
    let service_b = quick_service(7, profiles_b);
    let store = scoring_store();

    let a = service_a.assess_user_risk("user-det", None, &store).unwrap();
    let b = service_b.assess_user_risk("user-det", None, &store).unwrap();

    assert_eq!(a.risk_level, b.risk_level);
    assert_eq!(a.credit_score, b.credit_score);
    assert_eq!(a.fraud_score, b.fraud_score);
}

/// The service resolves users through its feature source: a registered
/// user assesses under its own id, an unknown one degrades to the
/// neutral Medium assessment and is still persisted.
#[test]
fn profiles_resolve_through_the_feature_source() {
    let service = quick_service(42, reference_profiles());
    let store = scoring_store();

    let known = service.assess_user_risk("user-risky", None, &store).unwrap();
    assert_eq!(known.user_id, "user-risky");
    assert!(known.details.predicted_band.is_some());

    let unknown = service.assess_user_risk("user-ghost", None, &store).unwrap();
    assert_eq!(unknown.user_id, "user-ghost");
    assert_eq!(unknown.risk_level, UserRiskLevel::Medium);
    assert!(unknown.details.predicted_band.is_none());
    assert!(unknown
        .details
        .recommendations
        .iter()
        .any(|r| r == "Manual review required"));
    assert_eq!(store.assessment_count().unwrap(), 2);
}

/// An in-flight transaction overlays the sourced profile without touching
/// the stored one: the context-free assessment afterwards matches the
/// context-free one before.
#[test]
fn transaction_context_overlay_is_per_call() {
    let service = quick_service(42, reference_profiles());
    let store = scoring_store();

    let before = service.assess_user_risk("user-steady", None, &store).unwrap();
    let context = TransactionContext {
        amount: 10_000.0,
        is_foreign: true,
        is_night: true,
    };
    let with_context = service
        .assess_user_risk("user-steady", Some(&context), &store)
        .unwrap();
    let after = service.assess_user_risk("user-steady", None, &store).unwrap();

    assert_eq!(with_context.user_id, "user-steady");
    assert!((0.0..=1.0).contains(&with_context.fraud_score));
    assert_eq!(after.fraud_score, before.fraud_score);
    assert_eq!(after.risk_level, before.risk_level);
}
