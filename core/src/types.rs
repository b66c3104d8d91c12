//! Shared domain types used across the monitoring and scoring engines.
//!
//! RULE: Enums are persisted through their stable string mapping
//! (`as_str` / `parse`), never through their in-memory representation.
//! Adding a variant must never change an existing string.

use crate::error::{AmlError, AmlResult};
use serde::{Deserialize, Serialize};

/// Stable identifier for a user/customer.
pub type UserId = String;

/// Stable identifier for a transaction.
pub type TransactionId = String;

/// Generated identifier for a persisted alert.
pub type AlertId = String;

/// AML risk level for a single transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> AmlResult<Self> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            other => Err(AmlError::MalformedInput {
                reason: format!("unknown risk level '{other}'"),
            }),
        }
    }
}

/// Five-way risk level used by the user risk-scoring subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl UserRiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRiskLevel::VeryLow => "very_low",
            UserRiskLevel::Low => "low",
            UserRiskLevel::Medium => "medium",
            UserRiskLevel::High => "high",
            UserRiskLevel::VeryHigh => "very_high",
        }
    }

    pub fn parse(s: &str) -> AmlResult<Self> {
        match s {
            "very_low" => Ok(UserRiskLevel::VeryLow),
            "low" => Ok(UserRiskLevel::Low),
            "medium" => Ok(UserRiskLevel::Medium),
            "high" => Ok(UserRiskLevel::High),
            "very_high" => Ok(UserRiskLevel::VeryHigh),
            other => Err(AmlError::MalformedInput {
                reason: format!("unknown user risk level '{other}'"),
            }),
        }
    }
}

/// Rule-engine flag categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmlFlag {
    /// Amount at or above the large-transaction threshold.
    Amount,
    /// Multiple transactions just under the reporting threshold.
    Structuring,
    /// Transaction rate above the hourly velocity threshold.
    Velocity,
    /// Round-number or night-time activity pattern.
    Pattern,
    /// Deviation from the user's own baseline.
    Behavior,
    /// Counterparty on the sanctions list.
    Sanctioned,
    /// Counterparty is a politically exposed person.
    Pep,
}

impl AmlFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmlFlag::Amount => "amount",
            AmlFlag::Structuring => "structuring",
            AmlFlag::Velocity => "velocity",
            AmlFlag::Pattern => "pattern",
            AmlFlag::Behavior => "behavior",
            AmlFlag::Sanctioned => "sanctioned",
            AmlFlag::Pep => "pep",
        }
    }

    pub fn parse(s: &str) -> AmlResult<Self> {
        match s {
            "amount" => Ok(AmlFlag::Amount),
            "structuring" => Ok(AmlFlag::Structuring),
            "velocity" => Ok(AmlFlag::Velocity),
            "pattern" => Ok(AmlFlag::Pattern),
            "behavior" => Ok(AmlFlag::Behavior),
            "sanctioned" => Ok(AmlFlag::Sanctioned),
            "pep" => Ok(AmlFlag::Pep),
            other => Err(AmlError::MalformedInput {
                reason: format!("unknown AML flag '{other}'"),
            }),
        }
    }
}

/// Transaction categories understood by the feature pipeline.
///
/// The one-hot encoding order in `features::to_vector` follows the
/// declaration order here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    Exchange,
    Payment,
}

impl TransactionType {
    pub const ALL: [TransactionType; 5] = [
        TransactionType::Deposit,
        TransactionType::Withdrawal,
        TransactionType::Transfer,
        TransactionType::Exchange,
        TransactionType::Payment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Transfer => "transfer",
            TransactionType::Exchange => "exchange",
            TransactionType::Payment => "payment",
        }
    }

    pub fn parse(s: &str) -> AmlResult<Self> {
        match s {
            "deposit" => Ok(TransactionType::Deposit),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            "transfer" => Ok(TransactionType::Transfer),
            "exchange" => Ok(TransactionType::Exchange),
            "payment" => Ok(TransactionType::Payment),
            other => Err(AmlError::MalformedInput {
                reason: format!("unknown transaction type '{other}'"),
            }),
        }
    }
}

/// Primary category of a user risk assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    CreditRisk,
    FraudRisk,
    BehavioralRisk,
    OperationalRisk,
    ComplianceRisk,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::CreditRisk => "credit_risk",
            RiskCategory::FraudRisk => "fraud_risk",
            RiskCategory::BehavioralRisk => "behavioral_risk",
            RiskCategory::OperationalRisk => "operational_risk",
            RiskCategory::ComplianceRisk => "compliance_risk",
        }
    }

    pub fn parse(s: &str) -> AmlResult<Self> {
        match s {
            "credit_risk" => Ok(RiskCategory::CreditRisk),
            "fraud_risk" => Ok(RiskCategory::FraudRisk),
            "behavioral_risk" => Ok(RiskCategory::BehavioralRisk),
            "operational_risk" => Ok(RiskCategory::OperationalRisk),
            "compliance_risk" => Ok(RiskCategory::ComplianceRisk),
            other => Err(AmlError::MalformedInput {
                reason: format!("unknown risk category '{other}'"),
            }),
        }
    }
}

/// Alert lifecycle. Alerts are append-only: status moves pending → resolved
/// and the row is never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Pending,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Pending => "pending",
            AlertStatus::Resolved => "resolved",
        }
    }

    pub fn parse(s: &str) -> AmlResult<Self> {
        match s {
            "pending" => Ok(AlertStatus::Pending),
            "resolved" => Ok(AlertStatus::Resolved),
            other => Err(AmlError::MalformedInput {
                reason: format!("unknown alert status '{other}'"),
            }),
        }
    }
}
