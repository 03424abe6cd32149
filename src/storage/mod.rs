mod result_storage;

use crate::engine::BatchOutcome;

pub use result_storage::ResultStorage;

/// Destination for per-dataset batch outcomes. Shared between blocking workers.
pub trait Storage: Send + Sync + 'static {
    /// Takes the outcome for `dataset` out of storage.
    fn load(&self, dataset: &str) -> Option<BatchOutcome>;
    fn save(&self, dataset: String, outcome: BatchOutcome);
}
