use std::collections::HashSet;

use crate::types::CustomerId;

/// Known customer ids, normalized (trimmed, upper-cased) the same way the
/// pipeline normalizes `customer_id`.
#[derive(Debug, Clone, Default)]
pub struct CustomerSet {
    ids: HashSet<CustomerId>
}

impl CustomerSet {
    pub fn contains(&self, customer_id: &str) -> bool {
        self.ids.contains(customer_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for CustomerSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let ids = iter.into_iter()
            .map(|id| id.as_ref().trim().to_uppercase())
            .filter(|id| !id.is_empty())
            .collect();

        Self { ids }
    }
}
