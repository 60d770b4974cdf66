use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockWriteGuard};

use super::entry::{OutboxEntry, OutboxError, OutboxStatus};
use crate::clock::Clock;

// ============================================================================
// Outbox Repository - Port and in-memory adapter
// ============================================================================
//
// The committed outbox is an append-only log (entries are never deleted, they
// are the audit trail). Command handlers append through a staged transaction;
// the processor reads and transitions entries through this port.
//
// ============================================================================

#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Append an entry directly to the committed log
    async fn save(&self, entry: OutboxEntry) -> Result<(), OutboxError>;

    /// Entries in PENDING/FAILED that can retry and are due, oldest first
    async fn find_pending(&self, limit: usize) -> Result<Vec<OutboxEntry>, OutboxError>;

    async fn mark_processed(&self, entry_id: &str) -> Result<(), OutboxError>;

    /// Record a failed attempt; returns the updated entry
    async fn mark_failed(&self, entry_id: &str, error: &str) -> Result<OutboxEntry, OutboxError>;

    /// Administrative dead-lettering, bypassing the retry budget
    async fn mark_dead_lettered(&self, entry_id: &str) -> Result<(), OutboxError>;

    async fn find_by_id(&self, entry_id: &str) -> Result<Option<OutboxEntry>, OutboxError>;

    /// Dead-lettered entries awaiting manual intervention, oldest first
    async fn find_dead_lettered(&self, limit: usize) -> Result<Vec<OutboxEntry>, OutboxError>;

    async fn stats(&self) -> Result<OutboxStats, OutboxError>;
}

/// Snapshot of the outbox for operational tooling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboxStats {
    pub total: usize,
    pub by_status: HashMap<OutboxStatus, usize>,
    pub dead_lettered_by_event_type: HashMap<String, usize>,
}

impl OutboxStats {
    pub fn count(&self, status: OutboxStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

// ============================================================================
// Committed Store
// ============================================================================

/// Shared handle to the committed outbox log. Clones point at the same log.
#[derive(Clone, Default)]
pub struct OutboxStore {
    entries: Arc<RwLock<Vec<OutboxEntry>>>,
}

impl OutboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, Vec<OutboxEntry>> {
        self.entries.write().await
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Copy of every committed entry in append order
    pub async fn snapshot(&self) -> Vec<OutboxEntry> {
        self.entries.read().await.clone()
    }
}

// ============================================================================
// In-memory Adapter
// ============================================================================

pub struct InMemoryOutboxRepository {
    store: OutboxStore,
    clock: Arc<dyn Clock>,
}

impl InMemoryOutboxRepository {
    pub fn new(store: OutboxStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn update<T, F>(&self, entry_id: &str, apply: F) -> Result<T, OutboxError>
    where
        F: FnOnce(&mut OutboxEntry) -> Result<T, OutboxError>,
    {
        let mut entries = self.store.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.entry_id() == entry_id)
            .ok_or_else(|| OutboxError::EntryNotFound(entry_id.to_string()))?;
        apply(entry)
    }
}

#[async_trait]
impl OutboxRepository for InMemoryOutboxRepository {
    async fn save(&self, entry: OutboxEntry) -> Result<(), OutboxError> {
        let mut entries = self.store.write().await;
        if entries.iter().any(|e| e.entry_id() == entry.entry_id()) {
            return Err(OutboxError::DuplicateEntry(entry.entry_id().to_string()));
        }
        entries.push(entry);
        Ok(())
    }

    async fn find_pending(&self, limit: usize) -> Result<Vec<OutboxEntry>, OutboxError> {
        let now = self.clock.now();
        let entries = self.store.entries.read().await;

        let mut pending: Vec<OutboxEntry> = entries
            .iter()
            .filter(|e| e.is_due(now))
            .cloned()
            .collect();

        // Stable sort: entries sharing a timestamp keep append order
        pending.sort_by_key(|e| e.occurred_at());
        pending.truncate(limit);

        Ok(pending)
    }

    async fn mark_processed(&self, entry_id: &str) -> Result<(), OutboxError> {
        let now = self.clock.now();
        self.update(entry_id, |entry| entry.mark_processed(now)).await
    }

    async fn mark_failed(&self, entry_id: &str, error: &str) -> Result<OutboxEntry, OutboxError> {
        let now = self.clock.now();
        self.update(entry_id, |entry| {
            entry.mark_failed(error, now)?;
            Ok(entry.clone())
        })
        .await
    }

    async fn mark_dead_lettered(&self, entry_id: &str) -> Result<(), OutboxError> {
        self.update(entry_id, |entry| {
            entry.mark_dead_lettered(Some("dead-lettered by operator".to_string()))
        })
        .await?;

        tracing::warn!(entry_id = %entry_id, "💀 Outbox entry dead-lettered manually");
        Ok(())
    }

    async fn find_by_id(&self, entry_id: &str) -> Result<Option<OutboxEntry>, OutboxError> {
        let entries = self.store.entries.read().await;
        Ok(entries.iter().find(|e| e.entry_id() == entry_id).cloned())
    }

    async fn find_dead_lettered(&self, limit: usize) -> Result<Vec<OutboxEntry>, OutboxError> {
        let entries = self.store.entries.read().await;
        let mut dead: Vec<OutboxEntry> = entries
            .iter()
            .filter(|e| e.status() == OutboxStatus::DeadLettered)
            .cloned()
            .collect();
        dead.sort_by_key(|e| e.occurred_at());
        dead.truncate(limit);
        Ok(dead)
    }

    async fn stats(&self) -> Result<OutboxStats, OutboxError> {
        let entries = self.store.entries.read().await;
        let mut stats = OutboxStats {
            total: entries.len(),
            ..OutboxStats::default()
        };

        for entry in entries.iter() {
            *stats.by_status.entry(entry.status()).or_insert(0) += 1;
            if entry.status() == OutboxStatus::DeadLettered {
                *stats
                    .dead_lettered_by_event_type
                    .entry(entry.event_type().to_string())
                    .or_insert(0) += 1;
            }
        }

        Ok(stats)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::event_sourcing::core::DomainEvent;
    use chrono::{DateTime, TimeDelta, Utc};
    use serde::Serialize;

    #[derive(Serialize, Clone, Debug)]
    struct Pinged {
        target: String,
    }

    impl DomainEvent for Pinged {
        fn event_name(&self) -> &'static str {
            "Pinged"
        }
    }

    fn entry(id: &str, at: DateTime<Utc>) -> OutboxEntry {
        let event = Pinged {
            target: id.to_string(),
        };
        OutboxEntry::create(id, &event, id, "Target", at).unwrap()
    }

    fn repo() -> (InMemoryOutboxRepository, ManualClock) {
        let clock = ManualClock::starting_now();
        let repo = InMemoryOutboxRepository::new(OutboxStore::new(), Arc::new(clock.clone()));
        (repo, clock)
    }

    #[tokio::test]
    async fn test_find_pending_orders_by_occurrence_and_limits() {
        let (repo, clock) = repo();
        let t0 = clock.now();

        repo.save(entry("late", t0 + TimeDelta::seconds(2))).await.unwrap();
        repo.save(entry("early", t0)).await.unwrap();
        repo.save(entry("middle", t0 + TimeDelta::seconds(1))).await.unwrap();

        let pending = repo.find_pending(2).await.unwrap();
        let ids: Vec<&str> = pending.iter().map(|e| e.entry_id()).collect();
        assert_eq!(ids, vec!["early", "middle"]);
    }

    #[tokio::test]
    async fn test_ties_keep_append_order() {
        let (repo, clock) = repo();
        let t0 = clock.now();

        for id in ["first", "second", "third"] {
            repo.save(entry(id, t0)).await.unwrap();
        }

        let ids: Vec<String> = repo
            .find_pending(10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.entry_id().to_string())
            .collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_failed_entry_hidden_until_backoff_expires() {
        let (repo, clock) = repo();
        repo.save(entry("e-1", clock.now())).await.unwrap();

        let updated = repo.mark_failed("e-1", "boom").await.unwrap();
        assert_eq!(updated.status(), OutboxStatus::Failed);
        assert!(repo.find_pending(10).await.unwrap().is_empty());

        clock.advance(TimeDelta::seconds(1));
        assert_eq!(repo.find_pending(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_processed_and_dead_lettered_never_returned() {
        let (repo, clock) = repo();
        repo.save(entry("ok", clock.now())).await.unwrap();
        repo.save(entry("dead", clock.now())).await.unwrap();

        repo.mark_processed("ok").await.unwrap();
        for _ in 0..3 {
            repo.mark_failed("dead", "boom").await.unwrap();
            clock.advance(TimeDelta::seconds(10));
        }

        assert!(repo.find_pending(10).await.unwrap().is_empty());
        let dead = repo.find_dead_lettered(10).await.unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].retry_count(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_entry_id_is_rejected() {
        let (repo, clock) = repo();
        repo.save(entry("e-1", clock.now())).await.unwrap();

        let err = repo.save(entry("e-1", clock.now())).await.unwrap_err();
        assert!(matches!(err, OutboxError::DuplicateEntry(id) if id == "e-1"));
        assert_eq!(repo.stats().await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_unknown_entry_is_reported() {
        let (repo, _clock) = repo();
        let err = repo.mark_processed("missing").await.unwrap_err();
        assert!(matches!(err, OutboxError::EntryNotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_manual_dead_letter_goes_through_state_machine() {
        let (repo, clock) = repo();
        repo.save(entry("e-1", clock.now())).await.unwrap();
        repo.mark_failed("e-1", "boom").await.unwrap();
        repo.mark_dead_lettered("e-1").await.unwrap();

        let stored = repo.find_by_id("e-1").await.unwrap().unwrap();
        assert_eq!(stored.status(), OutboxStatus::DeadLettered);
        assert!(stored.next_retry_at().is_none());

        // terminal: a second attempt is rejected
        assert!(repo.mark_dead_lettered("e-1").await.is_err());
    }

    #[tokio::test]
    async fn test_stats_count_by_status() {
        let (repo, clock) = repo();
        repo.save(entry("a", clock.now())).await.unwrap();
        repo.save(entry("b", clock.now())).await.unwrap();
        repo.save(entry("c", clock.now())).await.unwrap();
        repo.mark_processed("a").await.unwrap();
        repo.mark_dead_lettered("b").await.unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.count(OutboxStatus::Processed), 1);
        assert_eq!(stats.count(OutboxStatus::DeadLettered), 1);
        assert_eq!(stats.count(OutboxStatus::Pending), 1);
        assert_eq!(stats.dead_lettered_by_event_type.get("Pinged"), Some(&1));
    }
}
