use serde::Serialize;

use crate::engine::BatchError;
use crate::models::CleanTransaction;
use crate::pipeline::DatasetReport;
use crate::quality::GateVerdict;

#[derive(Debug)]
pub enum BatchOutcome {
    Completed {
        records: Vec<CleanTransaction>,
        report: DatasetReport,
        verdict: GateVerdict,
        /// Records dropped because their customer is not in the reference set.
        unknown_customers: usize
    },
    Failed {
        error: BatchError
    }
}

/// JSON view of a completed batch: the transform report next to the gate verdict.
#[derive(Debug, Serialize)]
pub struct BatchSummary<'a> {
    pub report: &'a DatasetReport,
    pub verdict: &'a GateVerdict,
    pub unknown_customers: usize
}

impl BatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, BatchOutcome::Completed { .. })
    }

    /// Whether the batch completed and its gate verdict passed.
    pub fn gate_passed(&self) -> bool {
        matches!(self, BatchOutcome::Completed { verdict, .. } if verdict.passed)
    }

    pub fn summary(&self) -> Option<BatchSummary<'_>> {
        match self {
            BatchOutcome::Completed { report, verdict, unknown_customers, .. } => Some(BatchSummary {
                report,
                verdict,
                unknown_customers: *unknown_customers
            }),
            BatchOutcome::Failed { .. } => None
        }
    }
}
