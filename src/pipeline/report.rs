use std::collections::BTreeMap;
use std::collections::btree_map::Values;
use std::fmt;
use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::models::Tabular;
use crate::pipeline::BusinessRule;
use crate::types::Timestamp;

/// Why a record was excluded from the output.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DropReason {
    DuplicateTransactionId,
    MissingField(&'static str),
    InvalidValue(&'static str),
    BusinessRule(BusinessRule),
    UnknownCustomer
}

impl Display for DropReason {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::DuplicateTransactionId => write!(formatter, "duplicate transaction_id"),
            DropReason::MissingField(field) => write!(formatter, "missing {field}"),
            DropReason::InvalidValue(field) => write!(formatter, "invalid {field}"),
            DropReason::BusinessRule(rule) => write!(formatter, "{rule}"),
            DropReason::UnknownCustomer => write!(formatter, "unknown customer_id")
        }
    }
}

/// Number of records one stage removed for one reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Removal {
    pub stage: &'static str,
    pub reason: DropReason,
    pub count: usize
}

/// Summary of one `transform` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetReport {
    pub dataset: String,
    pub initial_records: usize,
    pub final_records: usize,
    pub removed_count: usize,
    pub removal_percentage: f64,
    /// Null cells per output column.
    pub null_counts: BTreeMap<String, usize>,
    /// Non-zero removals, in the order the stages applied them.
    pub removals: Vec<Removal>,
    pub generated_at: Timestamp
}

impl DatasetReport {
    pub fn new<T: Tabular>(
        dataset: &str,
        initial_records: usize,
        output: &[T],
        removals: Vec<Removal>,
        generated_at: Timestamp
    ) -> Self {
        let final_records = output.len();
        let removed_count = initial_records.saturating_sub(final_records);
        let removal_percentage = if initial_records > 0 {
            removed_count as f64 / initial_records as f64 * 100.0
        } else {
            0.0
        };

        let null_counts = T::columns().iter()
            .map(|column| {
                let nulls = output.iter().filter(|row| row.is_null(column)).count();
                (column.to_string(), nulls)
            })
            .collect();

        Self {
            dataset: dataset.to_string(),
            initial_records,
            final_records,
            removed_count,
            removal_percentage,
            null_counts,
            removals,
            generated_at
        }
    }

    /// Total removed for a given reason across all stages.
    pub fn removed_for(&self, reason: DropReason) -> usize {
        self.removals.iter()
            .filter(|removal| removal.reason == reason)
            .map(|removal| removal.count)
            .sum()
    }
}

/// Reports keyed by dataset name; a repeated dataset replaces its entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QualityReport {
    datasets: BTreeMap<String, DatasetReport>
}

impl QualityReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, report: DatasetReport) {
        self.datasets.insert(report.dataset.clone(), report);
    }

    pub fn get(&self, dataset: &str) -> Option<&DatasetReport> {
        self.datasets.get(dataset)
    }

    pub fn iter(&self) -> Values<'_, String, DatasetReport> {
        self.datasets.values()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
