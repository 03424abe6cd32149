use std::sync::Arc;

use dashmap::iter::Iter;
use dashmap::DashMap;

use crate::engine::BatchOutcome;
use crate::storage::Storage;

#[derive(Default)]
pub struct ResultStorage {
    outcomes: Arc<DashMap<String, BatchOutcome>>
}

impl ResultStorage {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(DashMap::new())
        }
    }

    pub fn iter(&self) -> Iter<'_, String, BatchOutcome> {
        self.outcomes.iter()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl Storage for ResultStorage {
    fn load(&self, dataset: &str) -> Option<BatchOutcome> {
        self.outcomes.remove(dataset).map(|(_, outcome)| outcome)
    }

    fn save(&self, dataset: String, outcome: BatchOutcome) {
        self.outcomes.insert(dataset, outcome);
    }
}
