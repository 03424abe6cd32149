mod customers;
mod enrichment;
mod errors;
mod report;
mod rules;
mod stages;
#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::models::{CleanTransaction, Record, RecordBatch, RecordError};
use crate::types::Timestamp;

pub use customers::CustomerSet;
pub use enrichment::{amount_category, risk_level, risk_score};
pub use errors::PipelineError;
pub use report::{DatasetReport, DropReason, QualityReport, Removal};
pub use rules::{BusinessRule, RunContext};
pub use stages::{Stage, StageOutcome};

/// Result of one successful `transform` call.
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub records: Vec<CleanTransaction>,
    pub report: DatasetReport
}

/// Cleans, validates and enriches raw transaction batches.
///
/// Stage logic holds no state. The only state is the accumulated
/// [`QualityReport`], one entry per dataset name this instance has processed.
/// Use one pipeline per thread; independent batches processed in parallel each
/// need their own instance.
pub struct TransactionPipeline {
    config: PipelineConfig,
    report: QualityReport
}

impl Default for TransactionPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl TransactionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            report: QualityReport::new()
        }
    }

    /// Runs every stage against the batch, evaluated at the current time.
    ///
    /// # Errors
    /// Returns `PipelineError` if:
    /// - A raw column is absent from the batch schema.
    /// - A required field is still null after cleaning.
    pub fn transform(&mut self, batch: RecordBatch) -> Result<TransformOutcome, PipelineError> {
        self.transform_at(batch, Utc::now())
    }

    /// Same as [`transform`](Self::transform) with an explicit evaluation time.
    pub fn transform_at(&mut self, batch: RecordBatch, now: Timestamp) -> Result<TransformOutcome, PipelineError> {
        let missing_columns = batch.missing_columns();

        if !missing_columns.is_empty() {
            error!("Input batch [{}] is missing columns {missing_columns:?}", batch.dataset);
            return Err(PipelineError::MissingColumns { dataset: batch.dataset, columns: missing_columns });
        }

        let RecordBatch { dataset, records, .. } = batch;
        let initial_records = records.len();

        info!("Starting transformation of [{dataset}] with {initial_records} records");

        let context = RunContext::new(&self.config, now);
        let (records, removals) = Stage::SEQUENCE.iter().fold(
            (records, Vec::new()),
            |(records, mut removals), stage| {
                let outcome = stage.apply(records, &context);
                removals.extend(outcome.removals);
                (outcome.records, removals)
            }
        );

        let records = final_validation(&dataset, records)?;
        let report = DatasetReport::new(&dataset, initial_records, &records, removals, now);

        info!("Transformation of [{dataset}] complete. Records: {initial_records} -> {}", records.len());

        self.report.insert(report.clone());

        Ok(TransformOutcome { records, report })
    }

    /// Drops every transaction whose customer is not in `customers`.
    pub fn validate_against_customers(&self, records: Vec<CleanTransaction>, customers: &CustomerSet) -> Vec<CleanTransaction> {
        info!("Validating {} transactions against {} known customers", records.len(), customers.len());

        let before = records.len();
        let records: Vec<CleanTransaction> = records.into_iter()
            .filter(|record| customers.contains(&record.customer_id))
            .collect();

        let removed = before - records.len();

        if removed > 0 {
            warn!("Removed {removed} transaction(s): {}", DropReason::UnknownCustomer);
        }

        records
    }

    pub fn quality_report(&self) -> &QualityReport {
        &self.report
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// Terminal step: every record must carry all required fields, otherwise the
/// whole batch is rejected.
fn final_validation(dataset: &str, records: Vec<Record>) -> Result<Vec<CleanTransaction>, PipelineError> {
    let mut clean = Vec::with_capacity(records.len());
    let mut null_counts = BTreeMap::<&'static str, usize>::new();

    for record in records {
        match CleanTransaction::try_from(record) {
            Ok(transaction) => clean.push(transaction),
            Err(RecordError::MissingFields { fields, .. }) => {
                for field in fields {
                    *null_counts.entry(field).or_default() += 1;
                }
            }
        }
    }

    if !null_counts.is_empty() {
        error!("Critical nulls found in [{dataset}]: {null_counts:?}");
        return Err(PipelineError::FinalValidation { dataset: dataset.to_string(), null_counts });
    }

    info!("Final validation passed for [{dataset}]");

    Ok(clean)
}
