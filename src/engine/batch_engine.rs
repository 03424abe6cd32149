use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::engine::{BatchError, BatchOutcome};
use crate::ingest;
use crate::pipeline::{CustomerSet, TransactionPipeline, TransformOutcome};
use crate::quality::QualityGate;
use crate::storage::{ResultStorage, Storage};

/// Runs independent input files through the pipeline concurrently.
///
/// Every file is its own batch on a blocking worker with its own
/// `TransactionPipeline` and `QualityGate`; nothing is shared between batches
/// except the read-only config and customer set.
pub struct BatchEngine {
    storage: Arc<ResultStorage>,
    config: Arc<AppConfig>,
    customers: Option<Arc<CustomerSet>>
}

impl BatchEngine {
    pub fn new(storage: Arc<ResultStorage>, config: AppConfig) -> Self {
        Self {
            storage,
            config: Arc::new(config),
            customers: None
        }
    }

    /// Validates every batch against `customers` after transformation.
    pub fn with_customers(mut self, customers: CustomerSet) -> Self {
        self.customers = Some(Arc::new(customers));
        self
    }

    /// Processes every input and stores one outcome per dataset name.
    pub async fn run(&self, inputs: &[PathBuf]) -> anyhow::Result<()> {
        let mut workers = JoinSet::new();

        for path in inputs {
            let path = path.clone();
            let storage = self.storage.clone();
            let config = self.config.clone();
            let customers = self.customers.clone();

            workers.spawn_blocking(move || {
                let dataset = ingest::dataset_name(&path);
                let outcome = process_batch(&path, &config, customers.as_deref());

                if let BatchOutcome::Failed { error } = &outcome {
                    error!("Batch [{dataset}] failed: {error}");
                }

                storage.save(dataset, outcome);
            });
        }

        while let Some(result) = workers.join_next().await {
            if let Err(error) = result {
                error!("A batch worker did not finish gracefully: {error:?}");
            }
        }

        info!("Finished {} batch(es)", inputs.len());

        Ok(())
    }
}

fn process_batch(path: &Path, config: &AppConfig, customers: Option<&CustomerSet>) -> BatchOutcome {
    match try_process_batch(path, config, customers) {
        Ok(outcome) => outcome,
        Err(error) => BatchOutcome::Failed { error }
    }
}

fn try_process_batch(path: &Path, config: &AppConfig, customers: Option<&CustomerSet>) -> Result<BatchOutcome, BatchError> {
    let batch = ingest::read_transactions_file(path)?;
    let dataset = batch.dataset.clone();

    let mut pipeline = TransactionPipeline::new(config.pipeline.clone());
    let TransformOutcome { records, report } = pipeline.transform(batch)?;

    let (records, unknown_customers) = match customers {
        Some(customers) => {
            let before = records.len();
            let records = pipeline.validate_against_customers(records, customers);
            let removed = before - records.len();
            (records, removed)
        }
        None => (records, 0)
    };

    let verdict = QualityGate::new(config.quality.clone()).run_checks(&records, &dataset);

    if !verdict.passed {
        warn!("Batch [{dataset}] completed with {} quality issue(s)", verdict.issue_count());
    }

    Ok(BatchOutcome::Completed { records, report, verdict, unknown_customers })
}
