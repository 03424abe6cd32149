mod errors;
mod record;
mod tabular;
mod transaction;

use std::fmt;
use std::fmt::{Display, Formatter};

use serde::Serialize;

pub use errors::RecordError;
pub use record::{Enrichment, Record, RecordBatch};
pub use tabular::Tabular;
pub use transaction::CleanTransaction;

/// Columns a raw input batch must carry.
pub const RAW_COLUMNS: [&str; 8] = [
    "transaction_id",
    "customer_id",
    "transaction_date",
    "amount",
    "merchant_id",
    "category",
    "status",
    "payment_method"
];

/// Full enriched output schema, in output order.
pub const CLEAN_COLUMNS: [&str; 17] = [
    "transaction_id",
    "customer_id",
    "transaction_date",
    "amount",
    "merchant_id",
    "category",
    "status",
    "payment_method",
    "transaction_year",
    "transaction_month",
    "transaction_day",
    "transaction_dayofweek",
    "transaction_hour",
    "amount_category",
    "risk_score",
    "risk_level",
    "processed_at"
];

/// Fields that must be present and non-null before a batch is released.
pub const REQUIRED_FIELDS: [&str; 10] = [
    "transaction_id",
    "customer_id",
    "transaction_date",
    "amount",
    "merchant_id",
    "category",
    "status",
    "payment_method",
    "risk_score",
    "risk_level"
];

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Completed,
    Pending,
    Failed
}

impl Status {
    /// Matches an already normalized (trimmed, lower-cased) status.
    pub fn from_normalized(value: &str) -> Option<Self> {
        match value {
            "completed" => Some(Status::Completed),
            "pending" => Some(Status::Pending),
            "failed" => Some(Status::Failed),
            _ => None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Completed => "completed",
            Status::Pending => "pending",
            Status::Failed => "failed"
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountCategory {
    Small,
    Medium,
    Large,
    VeryLarge,
    Exceptional
}

impl AmountCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmountCategory::Small => "small",
            AmountCategory::Medium => "medium",
            AmountCategory::Large => "large",
            AmountCategory::VeryLarge => "very_large",
            AmountCategory::Exceptional => "exceptional"
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical"
        }
    }
}

impl Display for Status {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl Display for AmountCategory {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl Display for RiskLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
