use thiserror::Error;

use crate::ingest::IngestError;
use crate::pipeline::PipelineError;

/// Fatal failure of one batch. Other batches in the same run are unaffected.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError)
}
