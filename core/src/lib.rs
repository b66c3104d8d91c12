//! AML transaction monitoring and user risk scoring engine.
//!
//! Two cooperating subsystems over one SQLite store:
//!
//!   - [`monitor::AmlMonitor`] evaluates individual transactions: feature
//!     extraction, rule-based compliance checks, ML anomaly/fraud
//!     scoring, alert generation, regulatory reporting, and a feedback
//!     loop that retrains the scorer from analyst verdicts.
//!   - [`scoring::RiskScoringService`] assesses users: credit banding,
//!     account-fraud risk, and behavioral scoring combined into a
//!     persisted weighted assessment.
//!
//! All model randomness derives from a single configured seed, so runs
//! are reproducible end to end.

pub mod aggregate;
pub mod alerts;
pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod isolation;
pub mod monitor;
pub mod rng;
pub mod rules;
pub mod scaler;
pub mod scorer;
pub mod scoring;
pub mod store;
pub mod synthetic;
pub mod types;
