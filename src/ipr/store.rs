//! In-process filing store
//!
//! Filings live in a concurrent map keyed by filing id. Mongo keeps a
//! mirror copy for durability, but this map is what the API serves
//! from. Concurrent writers to the same filing are last-writer-wins.

use dashmap::DashMap;
use std::sync::Arc;

use crate::ipr::filing::Filing;

#[derive(Clone, Default)]
pub struct FilingStore {
    inner: Arc<DashMap<String, Filing>>,
}

impl FilingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a filing
    pub fn insert(&self, filing: Filing) {
        self.inner.insert(filing.id.clone(), filing);
    }

    /// Clone out a filing by id
    pub fn get(&self, id: &str) -> Option<Filing> {
        self.inner.get(id).map(|entry| entry.value().clone())
    }

    /// All filings owned by a user, newest start date first, id as a
    /// stable tiebreak
    pub fn list_for_user(&self, user_id: &str) -> Vec<Filing> {
        let mut filings: Vec<Filing> = self
            .inner
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        filings.sort_by(|a, b| {
            b.start_date
                .cmp(&a.start_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        filings
    }

    /// Mutate a filing in place under its shard lock. `None` when the
    /// id is absent; the closure's error passes through untouched.
    pub fn update<E>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Filing) -> Result<(), E>,
    ) -> Option<Result<Filing, E>> {
        let mut entry = self.inner.get_mut(id)?;
        let outcome = f(entry.value_mut());
        Some(outcome.map(|()| entry.value().clone()))
    }

    /// Remove a filing, returning it if present
    pub fn remove(&self, id: &str) -> Option<Filing> {
        self.inner.remove(id).map(|(_, filing)| filing)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
