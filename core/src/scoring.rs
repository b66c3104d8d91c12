//! User-level risk scoring: credit banding, account-fraud risk, and
//! behavioral scoring combined into a persisted risk assessment.
//!
//! Separate from transaction monitoring: the monitor judges a single
//! transaction, this subsystem judges the user. Both models train at
//! construction on deterministic synthetic profiles (per-seed
//! reproducible) until a labeled historical corpus is wired in.

use crate::{
    aggregate,
    classifier::{ForestParams, RandomForest},
    config::ScoringConfig,
    error::{AmlError, AmlResult},
    rng::{ComponentSlot, ModelRng},
    scaler::StandardScaler,
    store::MonitorStore,
    types::{RiskCategory, UserId, UserRiskLevel},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeLevel {
    Low,
    Medium,
    High,
}

impl IncomeLevel {
    pub const ALL: [IncomeLevel; 3] = [IncomeLevel::Low, IncomeLevel::Medium, IncomeLevel::High];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Employed,
    SelfEmployed,
    Unemployed,
}

impl EmploymentStatus {
    pub const ALL: [EmploymentStatus; 3] = [
        EmploymentStatus::Employed,
        EmploymentStatus::SelfEmployed,
        EmploymentStatus::Unemployed,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    HighSchool,
    Bachelor,
    Master,
}

impl EducationLevel {
    pub const ALL: [EducationLevel; 3] = [
        EducationLevel::HighSchool,
        EducationLevel::Bachelor,
        EducationLevel::Master,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    Single,
    Married,
    Divorced,
}

impl MaritalStatus {
    pub const ALL: [MaritalStatus; 3] = [
        MaritalStatus::Single,
        MaritalStatus::Married,
        MaritalStatus::Divorced,
    ];
}

/// Full feature profile for one user, gathered from the banking,
/// transaction, and external data sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFeatures {
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,

    // Demographics.
    pub age: u32,
    pub income_level: IncomeLevel,
    pub employment_status: EmploymentStatus,
    pub education_level: EducationLevel,
    pub marital_status: MaritalStatus,

    // Financial position.
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub credit_utilization: f64,
    pub debt_to_income: f64,

    // Transaction activity.
    pub avg_transaction_amount: f64,
    pub transaction_frequency: f64,
    pub transaction_velocity: f64,
    pub unusual_transaction_count: u32,
    pub foreign_transaction_count: u32,
    pub night_transaction_count: u32,
    pub weekend_transaction_count: u32,

    // Session behavior.
    pub login_frequency: f64,
    pub device_count: u32,
    pub location_count: u32,
    pub failed_login_attempts: u32,
    /// Seconds between consecutive user actions (median).
    pub time_between_actions: f64,

    // Banking relationship.
    pub account_count: u32,
    pub account_age_avg: f64,
    pub balance_volatility: f64,
    pub overdraft_frequency: u32,
    pub returned_payment_count: u32,

    // Open-banking aggregates.
    pub income_stability: f64,
    pub savings_rate: f64,
    pub investment_activity: f64,

    // External checks.
    pub credit_bureau_score: Option<u32>,
    pub sanctions_check: bool,
    pub pep_check: bool,
    pub adverse_media_check: bool,
}

/// Source of a user's feature profile. The production implementation
/// aggregates banking, session, and bureau data.
pub trait RiskFeatureSource {
    fn features_for(&self, user_id: &str) -> AmlResult<RiskFeatures>;
}

/// Fixed profile table (tests and the demo runner).
#[derive(Default)]
pub struct StaticProfiles {
    profiles: HashMap<UserId, RiskFeatures>,
}

impl StaticProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile under its own `user_id`.
    pub fn insert(&mut self, features: RiskFeatures) {
        self.profiles.insert(features.user_id.clone(), features);
    }
}

impl RiskFeatureSource for StaticProfiles {
    fn features_for(&self, user_id: &str) -> AmlResult<RiskFeatures> {
        self.profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| AmlError::MalformedInput {
                reason: format!("no feature profile for user '{user_id}'"),
            })
    }
}

/// An in-flight transaction overlaid on the sourced profile before
/// scoring, so the payment that triggered the assessment counts toward
/// the transaction feature group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionContext {
    pub amount: f64,
    pub is_foreign: bool,
    pub is_night: bool,
}

fn apply_context(features: &mut RiskFeatures, context: &TransactionContext) {
    if features.avg_transaction_amount > 0.0
        && context.amount > 3.0 * features.avg_transaction_amount
    {
        features.unusual_transaction_count += 1;
    }
    if context.is_foreign {
        features.foreign_transaction_count += 1;
    }
    if context.is_night {
        features.night_transaction_count += 1;
    }
}

/// Explanatory payload stored with each assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentDetails {
    pub predicted_band: Option<CreditBand>,
    pub risk_factors: Vec<String>,
    pub protective_factors: Vec<String>,
    pub fraud_indicators: Vec<String>,
    pub recommendations: Vec<String>,
    pub feature_importance: BTreeMap<String, f64>,
    pub decision_reasoning: String,
}

/// Persisted result of one comprehensive user risk assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub assessment_id: String,
    pub user_id: UserId,
    pub risk_category: RiskCategory,
    pub risk_level: UserRiskLevel,
    /// Overall weighted risk in [0, 1].
    pub risk_score: f64,
    pub confidence_score: f64,
    pub model_version: String,
    pub created_at: DateTime<Utc>,
    /// Credit score normalized to [0, 1] against the 850 ceiling.
    pub credit_score: f64,
    pub fraud_score: f64,
    pub behavioral_score: f64,
    pub details: AssessmentDetails,
}

/// Credit band, ordered best to worst. Each band maps to the midpoint
/// score its population centers on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditBand {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl CreditBand {
    pub const ALL: [CreditBand; 5] = [
        CreditBand::Excellent,
        CreditBand::Good,
        CreditBand::Fair,
        CreditBand::Poor,
        CreditBand::VeryPoor,
    ];

    pub fn midpoint_score(&self) -> f64 {
        match self {
            CreditBand::Excellent => 800.0,
            CreditBand::Good => 700.0,
            CreditBand::Fair => 600.0,
            CreditBand::Poor => 500.0,
            CreditBand::VeryPoor => 400.0,
        }
    }

    fn from_class(class: usize) -> CreditBand {
        CreditBand::ALL[class.min(CreditBand::ALL.len() - 1)]
    }
}

/// Number of entries in the credit feature vector: 21 numerics,
/// 12 one-hot categorical slots, 6 derived ratios.
pub const CREDIT_FEATURE_DIM: usize = 39;

/// Number of entries in the account-fraud feature vector.
pub const FRAUD_FEATURE_DIM: usize = 13;

fn credit_feature_vector(f: &RiskFeatures) -> Vec<f64> {
    let mut v = Vec::with_capacity(CREDIT_FEATURE_DIM);
    v.push(f64::from(f.age));
    v.push(f.total_assets);
    v.push(f.total_liabilities);
    v.push(f.monthly_income);
    v.push(f.monthly_expenses);
    v.push(f.credit_utilization);
    v.push(f.debt_to_income);
    v.push(f.avg_transaction_amount);
    v.push(f.transaction_frequency);
    v.push(f64::from(f.account_count));
    v.push(f.account_age_avg);
    v.push(f.balance_volatility);
    v.push(f64::from(f.overdraft_frequency));
    v.push(f64::from(f.returned_payment_count));
    v.push(f.income_stability);
    v.push(f.savings_rate);
    v.push(f.investment_activity);
    v.push(f.credit_bureau_score.map_or(0.0, f64::from));
    v.push(f.login_frequency);
    v.push(f64::from(f.device_count));
    v.push(f64::from(f.failed_login_attempts));

    for level in IncomeLevel::ALL {
        v.push(if f.income_level == level { 1.0 } else { 0.0 });
    }
    for status in EmploymentStatus::ALL {
        v.push(if f.employment_status == status { 1.0 } else { 0.0 });
    }
    for level in EducationLevel::ALL {
        v.push(if f.education_level == level { 1.0 } else { 0.0 });
    }
    for status in MaritalStatus::ALL {
        v.push(if f.marital_status == status { 1.0 } else { 0.0 });
    }

    // Derived ratios; denominators floored at 1 to stay finite.
    let assets_to_income = f.total_assets / f.monthly_income.max(1.0);
    let liabilities_to_assets = f.total_liabilities / f.total_assets.max(1.0);
    let expense_to_income = f.monthly_expenses / f.monthly_income.max(1.0);
    let amount_volatility = f.avg_transaction_amount / f.monthly_income.max(1.0);
    let risky_transaction_ratio = f64::from(
        f.unusual_transaction_count + f.foreign_transaction_count + f.night_transaction_count,
    ) / f.transaction_frequency.max(1.0);
    let stability = 1.0 / (1.0 + f64::from(f.failed_login_attempts) + f64::from(f.device_count));

    v.push(assets_to_income);
    v.push(liabilities_to_assets);
    v.push(expense_to_income);
    v.push(amount_volatility);
    v.push(risky_transaction_ratio);
    v.push(stability);

    debug_assert_eq!(v.len(), CREDIT_FEATURE_DIM);
    v
}

fn credit_feature_names() -> Vec<String> {
    let mut names: Vec<String> = [
        "age",
        "total_assets",
        "total_liabilities",
        "monthly_income",
        "monthly_expenses",
        "credit_utilization",
        "debt_to_income",
        "avg_transaction_amount",
        "transaction_frequency",
        "account_count",
        "account_age_avg",
        "balance_volatility",
        "overdraft_frequency",
        "returned_payment_count",
        "income_stability",
        "savings_rate",
        "investment_activity",
        "credit_bureau_score",
        "login_frequency",
        "device_count",
        "failed_login_attempts",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for v in ["low", "medium", "high"] {
        names.push(format!("income_{v}"));
    }
    for v in ["employed", "self_employed", "unemployed"] {
        names.push(format!("employment_{v}"));
    }
    for v in ["high_school", "bachelor", "master"] {
        names.push(format!("education_{v}"));
    }
    for v in ["single", "married", "divorced"] {
        names.push(format!("marital_{v}"));
    }
    for v in [
        "assets_to_income",
        "liabilities_to_assets",
        "expense_to_income",
        "transaction_amount_volatility",
        "risky_transaction_ratio",
        "stability_score",
    ] {
        names.push(v.to_string());
    }
    names
}

fn fraud_feature_vector(f: &RiskFeatures) -> Vec<f64> {
    let v = vec![
        f64::from(f.unusual_transaction_count),
        f64::from(f.foreign_transaction_count),
        f64::from(f.night_transaction_count),
        f.transaction_velocity,
        f64::from(f.failed_login_attempts),
        f64::from(f.device_count),
        f64::from(f.location_count),
        f.avg_transaction_amount,
        f.balance_volatility,
        f.time_between_actions,
        if f.sanctions_check { 1.0 } else { 0.0 },
        if f.pep_check { 1.0 } else { 0.0 },
        if f.adverse_media_check { 1.0 } else { 0.0 },
    ];
    debug_assert_eq!(v.len(), FRAUD_FEATURE_DIM);
    v
}

/// Result of one credit prediction.
#[derive(Debug, Clone)]
pub struct CreditPrediction {
    pub band: CreditBand,
    /// Band midpoint clamped to the configured score range.
    pub score: f64,
    /// Highest class probability from the forest.
    pub confidence: f64,
    pub risk_factors: Vec<String>,
    pub protective_factors: Vec<String>,
    pub feature_importance: BTreeMap<String, f64>,
}

/// Five-band credit model.
pub struct CreditModel {
    scaler: StandardScaler,
    forest: RandomForest,
    feature_names: Vec<String>,
    score_min: f64,
    score_max: f64,
}

impl CreditModel {
    /// Fit from (features, band) pairs.
    pub fn fit(
        examples: &[(RiskFeatures, CreditBand)],
        config: &ScoringConfig,
        rng: &mut ModelRng,
    ) -> AmlResult<Self> {
        if examples.is_empty() {
            return Err(AmlError::Scoring {
                reason: "empty credit training set".into(),
            });
        }
        let rows: Vec<Vec<f64>> = examples
            .iter()
            .map(|(f, _)| credit_feature_vector(f))
            .collect();
        let labels: Vec<usize> = examples
            .iter()
            .map(|(_, band)| {
                CreditBand::ALL.iter().position(|b| b == band).unwrap_or(2)
            })
            .collect();

        let scaler = StandardScaler::fit(&rows);
        let scaled = scaler.transform_all(&rows);
        let forest = RandomForest::fit(
            &scaled,
            &labels,
            ForestParams::new(config.n_estimators, CreditBand::ALL.len()),
            rng,
        );
        log::info!("credit model trained on {} profiles", examples.len());

        Ok(Self {
            scaler,
            forest,
            feature_names: credit_feature_names(),
            score_min: config.credit_score_min,
            score_max: config.credit_score_max,
        })
    }

    pub fn predict(&self, features: &RiskFeatures) -> CreditPrediction {
        let scaled = self.scaler.transform(&credit_feature_vector(features));
        let probs = self.forest.predict_proba(&scaled);
        let (class, confidence) = probs
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0.0), |best, (i, p)| if p > best.1 { (i, p) } else { best });
        let band = CreditBand::from_class(class);
        let score = band.midpoint_score().clamp(self.score_min, self.score_max);

        let feature_importance = self
            .feature_names
            .iter()
            .cloned()
            .zip(self.forest.feature_importances().iter().copied())
            .collect();

        CreditPrediction {
            band,
            score,
            confidence,
            risk_factors: credit_risk_factors(features),
            protective_factors: protective_factors(features),
            feature_importance,
        }
    }
}

fn credit_risk_factors(f: &RiskFeatures) -> Vec<String> {
    let mut factors = Vec::new();
    if f.debt_to_income > 0.4 {
        factors.push("High debt-to-income ratio".to_string());
    }
    if f.credit_utilization > 0.8 {
        factors.push("High credit utilization".to_string());
    }
    if f.overdraft_frequency > 2 {
        factors.push("Frequent overdrafts".to_string());
    }
    if f.returned_payment_count > 0 {
        factors.push("Payment returns".to_string());
    }
    if f.income_stability < 0.7 {
        factors.push("Unstable income".to_string());
    }
    if f.savings_rate < 0.1 {
        factors.push("Low savings rate".to_string());
    }
    if f.failed_login_attempts > 5 {
        factors.push("Security concerns".to_string());
    }
    factors
}

fn protective_factors(f: &RiskFeatures) -> Vec<String> {
    let mut factors = Vec::new();
    if f.savings_rate > 0.2 {
        factors.push("Good savings habits".to_string());
    }
    if f.income_stability > 0.8 {
        factors.push("Stable income".to_string());
    }
    if f.investment_activity > 0.1 {
        factors.push("Investment activity".to_string());
    }
    if f.account_age_avg > 365.0 {
        factors.push("Long banking history".to_string());
    }
    if f.credit_utilization < 0.3 {
        factors.push("Low credit utilization".to_string());
    }
    if f.employment_status == EmploymentStatus::Employed {
        factors.push("Stable employment".to_string());
    }
    factors
}

/// Result of one account-fraud prediction.
#[derive(Debug, Clone)]
pub struct FraudPrediction {
    pub fraud_probability: f64,
    /// Probability plus 0.1 per fired indicator, capped at 1.0.
    pub adjusted_score: f64,
    pub indicators: Vec<String>,
}

/// Binary account-takeover / fraud-pattern model over session and
/// transaction behavior.
pub struct FraudRiskModel {
    scaler: StandardScaler,
    forest: RandomForest,
}

impl FraudRiskModel {
    pub fn fit(
        examples: &[(RiskFeatures, bool)],
        config: &ScoringConfig,
        rng: &mut ModelRng,
    ) -> AmlResult<Self> {
        if examples.is_empty() {
            return Err(AmlError::Scoring {
                reason: "empty fraud training set".into(),
            });
        }
        let rows: Vec<Vec<f64>> = examples
            .iter()
            .map(|(f, _)| fraud_feature_vector(f))
            .collect();
        let labels: Vec<usize> = examples
            .iter()
            .map(|(_, is_fraud)| usize::from(*is_fraud))
            .collect();

        let scaler = StandardScaler::fit(&rows);
        let scaled = scaler.transform_all(&rows);
        let forest = RandomForest::fit(
            &scaled,
            &labels,
            ForestParams::new(config.n_estimators, 2),
            rng,
        );
        log::info!("account-fraud model trained on {} profiles", examples.len());

        Ok(Self { scaler, forest })
    }

    pub fn predict(&self, features: &RiskFeatures) -> FraudPrediction {
        let scaled = self.scaler.transform(&fraud_feature_vector(features));
        let fraud_probability = self.forest.predict_proba(&scaled)[1];

        let indicators = fraud_indicators(features);
        let adjusted_score =
            (fraud_probability + 0.1 * indicators.len() as f64).min(1.0);

        FraudPrediction {
            fraud_probability,
            adjusted_score,
            indicators,
        }
    }
}

fn fraud_indicators(f: &RiskFeatures) -> Vec<String> {
    let mut indicators = Vec::new();
    if f.unusual_transaction_count > 3 {
        indicators.push("High unusual transaction count".to_string());
    }
    if f.foreign_transaction_count > 2 {
        indicators.push("Multiple foreign transactions".to_string());
    }
    if f.night_transaction_count > 5 {
        indicators.push("High night-time activity".to_string());
    }
    if f.transaction_velocity > 10.0 {
        indicators.push("High transaction velocity".to_string());
    }
    if f.failed_login_attempts > 3 {
        indicators.push("Multiple failed logins".to_string());
    }
    if f.device_count > 3 {
        indicators.push("Multiple devices".to_string());
    }
    if f.location_count > 3 {
        indicators.push("Multiple locations".to_string());
    }
    if f.sanctions_check {
        indicators.push("Sanctions list match".to_string());
    }
    if f.pep_check {
        indicators.push("PEP list match".to_string());
    }
    if f.adverse_media_check {
        indicators.push("Adverse media mentions".to_string());
    }
    indicators
}

/// Rule-based behavioral risk: 0.5 baseline plus 0.1 per tripped
/// session-pattern indicator, capped at 1.0.
pub fn behavioral_score(f: &RiskFeatures) -> f64 {
    let mut score: f64 = 0.5;
    if f.failed_login_attempts > 3 {
        score += 0.1;
    }
    if f.device_count > 3 {
        score += 0.1;
    }
    if f.location_count > 3 {
        score += 0.1;
    }
    if f.time_between_actions < 5.0 {
        score += 0.1;
    }
    if f.income_stability < 0.7 {
        score += 0.1;
    }
    score.min(1.0)
}

/// Synthetic credit training profiles: 200 per band, with band-dependent
/// income, debt ratio, and savings rate. Placeholder until a labeled
/// bureau corpus is available.
pub fn synthetic_credit_examples(rng: &mut ModelRng) -> Vec<(RiskFeatures, CreditBand)> {
    let mut examples = Vec::with_capacity(CreditBand::ALL.len() * 200);
    for band in CreditBand::ALL {
        let (income_base, debt_ratio, savings_rate) = match band {
            CreditBand::Excellent => (3_000.0, 0.2, 0.3),
            CreditBand::Good => (2_000.0, 0.3, 0.2),
            CreditBand::Fair => (1_500.0, 0.4, 0.15),
            CreditBand::Poor => (1_000.0, 0.5, 0.1),
            CreditBand::VeryPoor => (800.0, 0.6, 0.05),
        };
        for i in 0..200 {
            let monthly_income = (income_base + rng.normal(0.0, income_base * 0.2)).max(100.0);
            let monthly_expenses = monthly_income * (0.6 + rng.normal(0.0, 0.1));
            let features = RiskFeatures {
                user_id: format!("synthetic-credit-{}-{i}", band.midpoint_score() as u32),
                timestamp: synthetic_epoch(),
                age: 25 + rng.next_below(40) as u32,
                income_level: *rng.choose(&IncomeLevel::ALL),
                employment_status: *rng.choose(&EmploymentStatus::ALL),
                education_level: *rng.choose(&EducationLevel::ALL),
                marital_status: *rng.choose(&MaritalStatus::ALL),
                total_assets: monthly_income * 12.0 * rng.uniform(0.5, 3.0),
                total_liabilities: monthly_income * 12.0 * debt_ratio * rng.uniform(0.8, 1.2),
                monthly_income,
                monthly_expenses,
                credit_utilization: rng.uniform(0.1, 0.9),
                debt_to_income: (debt_ratio + rng.normal(0.0, 0.1)).max(0.0),
                avg_transaction_amount: monthly_income * 0.1,
                transaction_frequency: rng.uniform(20.0, 100.0),
                transaction_velocity: rng.uniform(1.0, 10.0),
                unusual_transaction_count: rng.next_below(5) as u32,
                foreign_transaction_count: rng.next_below(3) as u32,
                night_transaction_count: rng.next_below(10) as u32,
                weekend_transaction_count: rng.next_below(20) as u32,
                login_frequency: rng.uniform(1.0, 10.0),
                device_count: 1 + rng.next_below(4) as u32,
                location_count: 1 + rng.next_below(2) as u32,
                failed_login_attempts: rng.next_below(5) as u32,
                time_between_actions: rng.uniform(1.0, 60.0),
                account_count: 1 + rng.next_below(4) as u32,
                account_age_avg: rng.uniform(30.0, 1_000.0),
                balance_volatility: rng.uniform(0.1, 0.5),
                overdraft_frequency: rng.next_below(3) as u32,
                returned_payment_count: rng.next_below(2) as u32,
                income_stability: rng.uniform(0.5, 1.0),
                savings_rate: (savings_rate + rng.normal(0.0, 0.05)).max(0.0),
                investment_activity: rng.uniform(0.0, 0.2),
                credit_bureau_score: None,
                sanctions_check: false,
                pep_check: false,
                adverse_media_check: false,
            };
            examples.push((features, band));
        }
    }
    examples
}

/// Synthetic account-fraud profiles: 800 legitimate, 200 fraudulent with
/// burst activity, many devices/locations, and new accounts.
pub fn synthetic_fraud_examples(rng: &mut ModelRng) -> Vec<(RiskFeatures, bool)> {
    let mut examples = Vec::with_capacity(1_000);
    for i in 0..1_000 {
        let is_fraud = i >= 800;
        let monthly_income = rng.uniform(1_000.0, 5_000.0);
        let features = RiskFeatures {
            user_id: format!("synthetic-fraud-{i}"),
            timestamp: synthetic_epoch(),
            age: 25 + rng.next_below(40) as u32,
            income_level: IncomeLevel::Medium,
            employment_status: EmploymentStatus::Employed,
            education_level: EducationLevel::Bachelor,
            marital_status: if is_fraud {
                MaritalStatus::Single
            } else {
                MaritalStatus::Married
            },
            total_assets: rng.uniform(10_000.0, 100_000.0),
            total_liabilities: rng.uniform(5_000.0, 50_000.0),
            monthly_income,
            monthly_expenses: rng.uniform(800.0, 4_000.0),
            credit_utilization: rng.uniform(0.1, 0.7),
            debt_to_income: rng.uniform(0.1, 0.4),
            avg_transaction_amount: if is_fraud {
                rng.uniform(1_000.0, 5_000.0)
            } else {
                rng.uniform(50.0, 500.0)
            },
            transaction_frequency: if is_fraud {
                rng.uniform(50.0, 200.0)
            } else {
                rng.uniform(10.0, 50.0)
            },
            transaction_velocity: if is_fraud {
                rng.uniform(10.0, 50.0)
            } else {
                rng.uniform(1.0, 5.0)
            },
            unusual_transaction_count: if is_fraud {
                5 + rng.next_below(15) as u32
            } else {
                rng.next_below(2) as u32
            },
            foreign_transaction_count: if is_fraud {
                3 + rng.next_below(7) as u32
            } else {
                rng.next_below(1) as u32
            },
            night_transaction_count: if is_fraud {
                10 + rng.next_below(20) as u32
            } else {
                rng.next_below(5) as u32
            },
            weekend_transaction_count: if is_fraud {
                20 + rng.next_below(30) as u32
            } else {
                rng.next_below(15) as u32
            },
            login_frequency: if is_fraud {
                rng.uniform(10.0, 50.0)
            } else {
                rng.uniform(1.0, 5.0)
            },
            device_count: if is_fraud {
                3 + rng.next_below(7) as u32
            } else {
                1 + rng.next_below(1) as u32
            },
            location_count: if is_fraud {
                3 + rng.next_below(7) as u32
            } else {
                1 + rng.next_below(1) as u32
            },
            failed_login_attempts: if is_fraud {
                5 + rng.next_below(15) as u32
            } else {
                rng.next_below(2) as u32
            },
            time_between_actions: if is_fraud {
                rng.uniform(0.1, 2.0)
            } else {
                rng.uniform(5.0, 30.0)
            },
            account_count: 1 + rng.next_below(2) as u32,
            account_age_avg: if is_fraud {
                rng.uniform(1.0, 50.0)
            } else {
                rng.uniform(100.0, 1_000.0)
            },
            balance_volatility: if is_fraud {
                rng.uniform(0.5, 1.0)
            } else {
                rng.uniform(0.1, 0.3)
            },
            overdraft_frequency: rng.next_below(1) as u32,
            returned_payment_count: rng.next_below(1) as u32,
            income_stability: if is_fraud {
                rng.uniform(0.1, 0.5)
            } else {
                rng.uniform(0.7, 1.0)
            },
            savings_rate: if is_fraud {
                rng.uniform(0.0, 0.1)
            } else {
                rng.uniform(0.1, 0.3)
            },
            investment_activity: rng.uniform(0.0, 0.1),
            credit_bureau_score: Some(if is_fraud {
                300 + rng.next_below(300) as u32
            } else {
                600 + rng.next_below(200) as u32
            }),
            sanctions_check: is_fraud && rng.chance(0.5),
            pep_check: is_fraud && rng.chance(0.5),
            adverse_media_check: is_fraud && rng.chance(0.5),
        };
        examples.push((features, is_fraud));
    }
    examples
}

fn synthetic_epoch() -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339("2025-01-01T12:00:00Z")
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Comprehensive user risk-scoring service.
pub struct RiskScoringService {
    config: ScoringConfig,
    credit: CreditModel,
    fraud: FraudRiskModel,
    features: Box<dyn RiskFeatureSource>,
}

impl RiskScoringService {
    /// Build the service over a feature source, training both models on
    /// synthetic profiles derived deterministically from the configured
    /// seed.
    pub fn new(config: ScoringConfig, features: Box<dyn RiskFeatureSource>) -> AmlResult<Self> {
        log::warn!(
            "risk scoring models bootstrap-training on synthetic profiles \
             (placeholder — supply a historical corpus in production)"
        );
        let mut credit_rng = ModelRng::for_component(config.seed, ComponentSlot::CreditModel);
        let credit = CreditModel::fit(&synthetic_credit_examples(&mut credit_rng), &config, &mut credit_rng)?;

        let mut fraud_rng = ModelRng::for_component(config.seed, ComponentSlot::FraudRiskModel);
        let fraud = FraudRiskModel::fit(&synthetic_fraud_examples(&mut fraud_rng), &config, &mut fraud_rng)?;

        Ok(Self {
            config,
            credit,
            fraud,
            features,
        })
    }

    /// Run the full credit + fraud + behavioral assessment for a user and
    /// persist the result. The profile comes from the feature source; an
    /// in-flight transaction, when given, is overlaid before scoring.
    /// Source or scoring failures degrade to a neutral Medium assessment
    /// flagged for manual review; database failures propagate.
    pub fn assess_user_risk(
        &self,
        user_id: &str,
        context: Option<&TransactionContext>,
        store: &MonitorStore,
    ) -> AmlResult<RiskAssessment> {
        let now = Utc::now();
        let assessment = match self.score_user(user_id, context, now) {
            Ok(assessment) => assessment,
            Err(err) => {
                log::error!(
                    "risk assessment failed for {user_id}: {err}; returning neutral fallback"
                );
                neutral_assessment(user_id, now, &err)
            }
        };
        store.insert_assessment(&assessment)?;
        Ok(assessment)
    }

    fn score_user(
        &self,
        user_id: &str,
        context: Option<&TransactionContext>,
        now: DateTime<Utc>,
    ) -> AmlResult<RiskAssessment> {
        let mut features = self.features.features_for(user_id)?;
        if let Some(context) = context {
            apply_context(&mut features, context);
        }
        self.score(&features, now)
    }

    fn score(&self, features: &RiskFeatures, now: DateTime<Utc>) -> AmlResult<RiskAssessment> {
        if !features.monthly_income.is_finite() || !features.total_assets.is_finite() {
            return Err(AmlError::Scoring {
                reason: format!("non-finite financials for user {}", features.user_id),
            });
        }

        let credit = self.credit.predict(features);
        let fraud = self.fraud.predict(features);
        let behavioral = behavioral_score(features);

        // Invert credit onto the risk scale: 1.0 = worst credit.
        let span = self.config.credit_score_max - self.config.credit_score_min;
        let normalized_credit =
            (1.0 - (credit.score - self.config.credit_score_min) / span).clamp(0.0, 1.0);

        let overall = aggregate::overall_user_risk(
            normalized_credit,
            fraud.adjusted_score,
            behavioral,
            &self.config,
        );
        let level = aggregate::user_risk_level(overall, &self.config);

        let mut risk_factors = credit.risk_factors.clone();
        risk_factors.extend(fraud.indicators.iter().cloned());

        let details = AssessmentDetails {
            predicted_band: Some(credit.band),
            risk_factors,
            protective_factors: credit.protective_factors.clone(),
            fraud_indicators: fraud.indicators.clone(),
            recommendations: recommendations(level, credit.score, fraud.adjusted_score),
            feature_importance: credit.feature_importance.clone(),
            decision_reasoning: decision_reasoning(
                credit.score,
                fraud.adjusted_score,
                behavioral,
                &self.config,
            ),
        };

        Ok(RiskAssessment {
            assessment_id: Uuid::new_v4().to_string(),
            user_id: features.user_id.clone(),
            risk_category: RiskCategory::CreditRisk,
            risk_level: level,
            risk_score: overall,
            confidence_score: credit.confidence,
            model_version: "1.0".to_string(),
            created_at: now,
            credit_score: credit.score / self.config.credit_score_max,
            fraud_score: fraud.adjusted_score,
            behavioral_score: behavioral,
            details,
        })
    }
}

fn neutral_assessment(user_id: &str, now: DateTime<Utc>, err: &AmlError) -> RiskAssessment {
    RiskAssessment {
        assessment_id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        risk_category: RiskCategory::CreditRisk,
        risk_level: UserRiskLevel::Medium,
        risk_score: 0.5,
        confidence_score: 0.5,
        model_version: "1.0".to_string(),
        created_at: now,
        credit_score: 0.5,
        fraud_score: 0.5,
        behavioral_score: 0.5,
        details: AssessmentDetails {
            predicted_band: None,
            risk_factors: vec!["Assessment error".to_string()],
            protective_factors: Vec::new(),
            fraud_indicators: Vec::new(),
            recommendations: vec!["Manual review required".to_string()],
            feature_importance: BTreeMap::new(),
            decision_reasoning: format!("Error in assessment: {err}"),
        },
    }
}

fn recommendations(level: UserRiskLevel, credit_score: f64, fraud_score: f64) -> Vec<String> {
    let mut recs: Vec<String> = match level {
        UserRiskLevel::VeryHigh => vec![
            "Account requires immediate manual review".to_string(),
            "Consider account restrictions".to_string(),
            "Enhanced monitoring required".to_string(),
        ],
        UserRiskLevel::High => vec![
            "Enhanced due diligence required".to_string(),
            "Transaction limits recommended".to_string(),
            "Additional verification needed".to_string(),
        ],
        UserRiskLevel::Medium => vec![
            "Standard monitoring procedures".to_string(),
            "Periodic review recommended".to_string(),
        ],
        UserRiskLevel::Low | UserRiskLevel::VeryLow => vec![
            "Standard risk management procedures".to_string(),
            "Normal monitoring sufficient".to_string(),
        ],
    };
    if credit_score < 500.0 {
        recs.push("Credit enhancement programs available".to_string());
    }
    if fraud_score > 0.7 {
        recs.push("Fraud prevention measures activated".to_string());
    }
    recs
}

fn decision_reasoning(
    credit_score: f64,
    fraud_score: f64,
    behavioral_score: f64,
    config: &ScoringConfig,
) -> String {
    let mut reasoning = format!(
        "Risk assessment based on: Credit score: {credit_score:.0} (weight: {:.0}%), \
         Fraud risk: {fraud_score:.2} (weight: {:.0}%), \
         Behavioral risk: {behavioral_score:.2} (weight: {:.0}%). ",
        config.credit_weight * 100.0,
        config.fraud_weight * 100.0,
        config.behavioral_weight * 100.0,
    );
    if credit_score < 500.0 {
        reasoning.push_str("Low credit score indicates higher default risk. ");
    }
    if fraud_score > 0.5 {
        reasoning.push_str("Elevated fraud indicators detected. ");
    }
    if behavioral_score > 0.5 {
        reasoning.push_str("Behavioral patterns suggest increased risk. ");
    }
    reasoning
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady_profile() -> RiskFeatures {
        RiskFeatures {
            user_id: "user-steady".to_string(),
            timestamp: synthetic_epoch(),
            age: 40,
            income_level: IncomeLevel::High,
            employment_status: EmploymentStatus::Employed,
            education_level: EducationLevel::Master,
            marital_status: MaritalStatus::Married,
            total_assets: 120_000.0,
            total_liabilities: 20_000.0,
            monthly_income: 4_000.0,
            monthly_expenses: 2_200.0,
            credit_utilization: 0.2,
            debt_to_income: 0.15,
            avg_transaction_amount: 300.0,
            transaction_frequency: 30.0,
            transaction_velocity: 2.0,
            unusual_transaction_count: 0,
            foreign_transaction_count: 0,
            night_transaction_count: 1,
            weekend_transaction_count: 8,
            login_frequency: 3.0,
            device_count: 1,
            location_count: 1,
            failed_login_attempts: 0,
            time_between_actions: 20.0,
            account_count: 2,
            account_age_avg: 900.0,
            balance_volatility: 0.15,
            overdraft_frequency: 0,
            returned_payment_count: 0,
            income_stability: 0.95,
            savings_rate: 0.3,
            investment_activity: 0.15,
            credit_bureau_score: Some(780),
            sanctions_check: false,
            pep_check: false,
            adverse_media_check: false,
        }
    }

    #[test]
    fn behavioral_score_counts_tripwires() {
        let mut profile = steady_profile();
        assert!((behavioral_score(&profile) - 0.5).abs() < 1e-12);

        profile.failed_login_attempts = 10;
        profile.device_count = 5;
        profile.location_count = 6;
        profile.time_between_actions = 1.0;
        profile.income_stability = 0.4;
        assert!((behavioral_score(&profile) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fraud_indicator_adjustment_caps_at_one() {
        let mut profile = steady_profile();
        profile.sanctions_check = true;
        profile.pep_check = true;
        profile.adverse_media_check = true;
        profile.unusual_transaction_count = 10;
        profile.foreign_transaction_count = 5;
        profile.night_transaction_count = 15;
        profile.transaction_velocity = 25.0;
        profile.failed_login_attempts = 8;
        profile.device_count = 6;
        profile.location_count = 6;
        let indicators = fraud_indicators(&profile);
        assert_eq!(indicators.len(), 10);
        // 10 indicators add 1.0 on their own, so any probability caps out.
        assert!((0.3f64 + 0.1 * indicators.len() as f64).min(1.0) >= 1.0);
    }

    #[test]
    fn credit_vector_shape_is_stable() {
        let profile = steady_profile();
        assert_eq!(credit_feature_vector(&profile).len(), CREDIT_FEATURE_DIM);
        assert_eq!(credit_feature_names().len(), CREDIT_FEATURE_DIM);
        assert_eq!(fraud_feature_vector(&profile).len(), FRAUD_FEATURE_DIM);
    }

    #[test]
    fn transaction_context_overlays_transaction_counts() {
        let mut profile = steady_profile();
        let avg_amount = profile.avg_transaction_amount;
        apply_context(
            &mut profile,
            &TransactionContext {
                amount: 10.0 * avg_amount,
                is_foreign: true,
                is_night: true,
            },
        );
        assert_eq!(profile.unusual_transaction_count, 1);
        assert_eq!(profile.foreign_transaction_count, 1);
        assert_eq!(profile.night_transaction_count, 2);

        // An in-pattern daytime domestic payment changes nothing.
        let before = steady_profile();
        let mut unchanged = steady_profile();
        apply_context(
            &mut unchanged,
            &TransactionContext {
                amount: before.avg_transaction_amount,
                is_foreign: false,
                is_night: false,
            },
        );
        assert_eq!(unchanged.unusual_transaction_count, before.unusual_transaction_count);
        assert_eq!(unchanged.foreign_transaction_count, before.foreign_transaction_count);
        assert_eq!(unchanged.night_transaction_count, before.night_transaction_count);
    }
}
