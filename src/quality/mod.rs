
use std::collections::HashSet;
use std::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::models::Tabular;

/// Column whose duplicate density the gate scores.
pub const KEY_COLUMN: &str = "transaction_id";

/// Numeric limits a batch is scored against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Fraction of all cells that may be null.
    pub max_null_percentage: f64,
    pub min_row_count: usize,
    /// Fraction of rows whose key repeats an earlier row.
    pub max_duplicate_percentage: f64
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            max_null_percentage: 0.05,
            min_row_count: 100,
            max_duplicate_percentage: 0.01
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum QualityCheck {
    RowCount,
    NullDensity,
    DuplicateDensity,
    Schema
}

impl QualityCheck {
    pub const ALL: [QualityCheck; 4] = [
        QualityCheck::RowCount,
        QualityCheck::NullDensity,
        QualityCheck::DuplicateDensity,
        QualityCheck::Schema
    ];
}

impl Display for QualityCheck {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            QualityCheck::RowCount => "row_count",
            QualityCheck::NullDensity => "null_density",
            QualityCheck::DuplicateDensity => "duplicate_density",
            QualityCheck::Schema => "schema"
        };

        formatter.write_str(name)
    }
}

/// Outcome of one gate evaluation. Issues are listed in check order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateVerdict {
    pub dataset: String,
    pub passed: bool,
    issues: Vec<String>,
    issue_count: usize
}

impl GateVerdict {
    fn new(dataset: &str, issues: Vec<String>) -> Self {
        Self {
            dataset: dataset.to_string(),
            passed: issues.is_empty(),
            issue_count: issues.len(),
            issues
        }
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    pub fn issue_count(&self) -> usize {
        self.issue_count
    }
}

/// Scores a batch against [`QualityThresholds`].
///
/// The gate is advisory: a failed verdict never stops the caller, and every
/// check runs even after an earlier one fails so all violations are reported
/// together.
pub struct QualityGate {
    thresholds: QualityThresholds
}

impl QualityGate {
    pub fn new(thresholds: QualityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &QualityThresholds {
        &self.thresholds
    }

    pub fn run_checks<T: Tabular>(&self, batch: &[T], dataset_name: &str) -> GateVerdict {
        info!("Running quality checks on [{dataset_name}]");

        let issues: Vec<String> = QualityCheck::ALL.iter()
            .filter_map(|check| {
                let issue = self.evaluate(*check, batch, dataset_name);

                if let Some(issue) = &issue {
                    warn!("Quality check [{check}] failed: {issue}");
                }

                issue
            })
            .collect();

        let verdict = GateVerdict::new(dataset_name, issues);

        if verdict.passed {
            info!("All quality checks passed for [{dataset_name}]");
        } else {
            error!("Quality checks failed for [{dataset_name}] with {} issue(s)", verdict.issue_count());
        }

        verdict
    }

    fn evaluate<T: Tabular>(&self, check: QualityCheck, batch: &[T], dataset_name: &str) -> Option<String> {
        match check {
            QualityCheck::RowCount => self.check_row_count(batch, dataset_name),
            QualityCheck::NullDensity => self.check_null_density(batch, dataset_name),
            QualityCheck::DuplicateDensity => self.check_duplicate_density(batch, dataset_name),
            QualityCheck::Schema => self.check_schema(batch, dataset_name)
        }
    }

    fn check_row_count<T: Tabular>(&self, batch: &[T], dataset_name: &str) -> Option<String> {
        let minimum = self.thresholds.min_row_count;

        (batch.len() < minimum).then(|| {
            format!("{dataset_name}: Row count {} below minimum {minimum}", batch.len())
        })
    }

    fn check_null_density<T: Tabular>(&self, batch: &[T], dataset_name: &str) -> Option<String> {
        let total_cells = batch.len() * T::columns().len();

        if total_cells == 0 {
            return None;
        }

        let null_cells: usize = batch.iter().map(Tabular::null_count).sum();
        let null_percentage = null_cells as f64 / total_cells as f64 * 100.0;
        let threshold = self.thresholds.max_null_percentage * 100.0;

        (null_percentage > threshold).then(|| {
            format!("{dataset_name}: Null percentage {null_percentage:.2}% exceeds threshold {threshold:.2}%")
        })
    }

    fn check_duplicate_density<T: Tabular>(&self, batch: &[T], dataset_name: &str) -> Option<String> {
        if batch.is_empty() || !T::columns().contains(&KEY_COLUMN) {
            return None;
        }

        let mut seen = HashSet::with_capacity(batch.len());
        let duplicates = batch.iter().filter(|row| !seen.insert(row.key())).count();
        let duplicate_percentage = duplicates as f64 / batch.len() as f64 * 100.0;
        let threshold = self.thresholds.max_duplicate_percentage * 100.0;

        (duplicate_percentage > threshold).then(|| {
            format!("{dataset_name}: Duplicate percentage {duplicate_percentage:.2}% exceeds threshold {threshold:.2}%")
        })
    }

    // Extension point for per-column type assertions; every row type we score is statically typed.
    fn check_schema<T: Tabular>(&self, _batch: &[T], _dataset_name: &str) -> Option<String> {
        None
    }
}
