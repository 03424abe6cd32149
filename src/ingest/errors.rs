use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Could not open [{path}]: {source}")]
    Open {
        path: String,
        source: io::Error
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Input [{input}] has no [{column}] column")]
    MissingColumn {
        input: String,
        column: &'static str
    }
}
