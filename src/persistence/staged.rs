use std::collections::HashMap;

use super::store::{AggregateStore, Versioned};
use super::unit_of_work::UnitOfWorkError;
use crate::event_sourcing::core::AggregateRoot;
use crate::outbox::{OutboxEntry, OutboxError, OutboxStore};

// ============================================================================
// Staged Repositories - Per-transaction write overlays
// ============================================================================
//
// Reads check the overlay first, then the committed store. Writes only touch
// the overlay. Values are cloned in and out, so nothing staged here is
// visible outside the owning transaction until commit.
//
// ============================================================================

pub struct StagedRepository<A> {
    committed: AggregateStore<A>,
    staged: HashMap<String, A>,
    // Committed version seen on first access, 0 = absent
    observed: HashMap<String, u64>,
}

impl<A: AggregateRoot> StagedRepository<A> {
    pub(crate) fn new(committed: AggregateStore<A>) -> Self {
        Self {
            committed,
            staged: HashMap::new(),
            observed: HashMap::new(),
        }
    }

    pub async fn find_by_id(&mut self, id: &str) -> Option<A> {
        if let Some(staged) = self.staged.get(id) {
            return Some(staged.clone());
        }

        let current = self.committed.get(id).await;
        self.observed
            .entry(id.to_string())
            .or_insert_with(|| current.as_ref().map_or(0, |v| v.version));
        current.map(|v| v.aggregate)
    }

    pub async fn save(&mut self, aggregate: A) {
        let id = aggregate.aggregate_id().to_string();
        if !self.observed.contains_key(&id) {
            let version = self.committed.version(&id).await;
            self.observed.insert(id.clone(), version);
        }
        self.staged.insert(id, aggregate);
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Every staged aggregate must still be at the version this overlay saw
    pub(crate) fn validate(
        &self,
        committed: &HashMap<String, Versioned<A>>,
    ) -> Result<(), UnitOfWorkError> {
        for id in self.staged.keys() {
            let expected = self.observed.get(id).copied().unwrap_or(0);
            let actual = committed.get(id).map_or(0, |v| v.version);
            if expected != actual {
                return Err(UnitOfWorkError::ConcurrencyConflict {
                    aggregate_type: A::AGGREGATE_TYPE,
                    aggregate_id: id.clone(),
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Consume the overlay into the committed map; returns the merged count
    pub(crate) fn merge_into(self, committed: &mut HashMap<String, Versioned<A>>) -> usize {
        let merged = self.staged.len();
        for (id, aggregate) in self.staged {
            let version = committed.get(&id).map_or(0, |v| v.version) + 1;
            committed.insert(id, Versioned { version, aggregate });
        }
        merged
    }
}

pub struct StagedOutbox {
    committed: OutboxStore,
    staged: Vec<OutboxEntry>,
}

impl StagedOutbox {
    pub(crate) fn new(committed: OutboxStore) -> Self {
        Self {
            committed,
            staged: Vec::new(),
        }
    }

    /// Entry ids are unique across the staged and committed entries
    pub async fn save(&mut self, entry: OutboxEntry) -> Result<(), OutboxError> {
        if self.find_by_id(entry.entry_id()).await.is_some() {
            return Err(OutboxError::DuplicateEntry(entry.entry_id().to_string()));
        }
        self.staged.push(entry);
        Ok(())
    }

    pub async fn find_by_id(&self, entry_id: &str) -> Option<OutboxEntry> {
        if let Some(entry) = self.staged.iter().find(|e| e.entry_id() == entry_id) {
            return Some(entry.clone());
        }
        self.committed
            .snapshot()
            .await
            .into_iter()
            .find(|e| e.entry_id() == entry_id)
    }

    pub fn staged(&self) -> &[OutboxEntry] {
        &self.staged
    }

    /// Appended in staging order
    pub(crate) fn merge_into(self, committed: &mut Vec<OutboxEntry>) -> usize {
        let merged = self.staged.len();
        committed.extend(self.staged);
        merged
    }
}
