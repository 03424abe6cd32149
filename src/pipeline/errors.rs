use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input batch [{dataset}] is missing required columns {columns:?}")]
    MissingColumns {
        dataset: String,
        columns: Vec<String>
    },
    #[error("Final validation failed for [{dataset}], required fields still null: {null_counts:?}")]
    FinalValidation {
        dataset: String,
        null_counts: BTreeMap<&'static str, usize>
    }
}
