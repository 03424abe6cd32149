mod batch_engine;
mod errors;
mod outcome;

pub use batch_engine::BatchEngine;
pub use errors::BatchError;
pub use outcome::{BatchOutcome, BatchSummary};
