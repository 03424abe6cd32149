use rust_decimal::Decimal;

use crate::models::{AmountCategory, RAW_COLUMNS, RiskLevel};
use crate::types::{Coercible, Timestamp};

/// A single transaction as it moves through the cleaning stages.
///
/// Every input field is optional because raw data may omit any of them. The
/// date and amount start out as raw text and are typed by the coercion stage;
/// `enrichment` is only filled in by the derivation stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub transaction_id: Option<String>,
    pub customer_id: Option<String>,
    pub transaction_date: Option<Coercible<Timestamp>>,
    pub amount: Option<Coercible<Decimal>>,
    pub merchant_id: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub enrichment: Option<Enrichment>
}

/// Fields derived from the transaction date and amount.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub transaction_year: i32,
    pub transaction_month: u32,
    pub transaction_day: u32,
    /// 0 = Monday .. 6 = Sunday.
    pub transaction_dayofweek: u32,
    pub transaction_hour: u32,
    pub amount_category: AmountCategory,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub processed_at: Timestamp
}

impl Record {
    /// The typed transaction date, once coerced.
    pub fn date(&self) -> Option<&Timestamp> {
        self.transaction_date.as_ref().and_then(Coercible::value)
    }

    /// The typed amount, once coerced.
    pub fn amount_value(&self) -> Option<&Decimal> {
        self.amount.as_ref().and_then(Coercible::value)
    }
}

/// A named batch of records sharing one input schema.
#[derive(Debug, Clone)]
pub struct RecordBatch {
    pub dataset: String,
    pub columns: Vec<String>,
    pub records: Vec<Record>
}

impl RecordBatch {
    /// Creates a batch that carries the full raw schema.
    pub fn new(dataset: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            dataset: dataset.into(),
            columns: RAW_COLUMNS.iter().map(|column| column.to_string()).collect(),
            records
        }
    }

    /// Creates a batch whose input schema only has the given columns.
    pub fn with_columns(dataset: impl Into<String>, columns: Vec<String>, records: Vec<Record>) -> Self {
        Self {
            dataset: dataset.into(),
            columns,
            records
        }
    }

    /// Raw columns absent from this batch's schema.
    pub fn missing_columns(&self) -> Vec<String> {
        RAW_COLUMNS.iter()
            .filter(|column| !self.columns.iter().any(|present| present == *column))
            .map(|column| column.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
