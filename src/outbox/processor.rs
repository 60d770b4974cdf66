use async_trait::async_trait;
use futures_util::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use super::entry::{OutboxEntry, OutboxError, OutboxStatus};
use super::repository::OutboxRepository;
use crate::metrics::{OutboxMetrics, REASON_NO_PROJECTOR, REASON_PROJECTION_ERROR};
use crate::projections::Projector;

// ============================================================================
// Outbox Processor - Drains ready entries into projectors
// ============================================================================
//
// One pass:
// 1. Fetch up to `batch_size` ready entries, oldest first
// 2. Route each entry to the projector registered for its event type
// 3. Success → mark PROCESSED; any failure (including "no projector" and a
//    panicking projector) → mark_failed, which schedules a backoff or
//    dead-letters the entry
// 4. Return how many entries succeeded in this pass
//
// A failing entry never aborts the pass. Passes never overlap, even when
// several tasks call `process_pending` on the same processor.
//
// ============================================================================

pub const DEFAULT_BATCH_SIZE: usize = 10;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RegistryError {
    #[error("Event type {event_type} is handled by both {existing} and {duplicate}")]
    DuplicateEventType {
        event_type: String,
        existing: &'static str,
        duplicate: &'static str,
    },
}

/// Anything the background worker can drive
#[async_trait]
pub trait ProcessOutbox: Send + Sync {
    /// Run one pass and return the number of entries projected successfully
    async fn process_pending(&self) -> anyhow::Result<usize>;
}

pub struct OutboxProcessor {
    repository: Arc<dyn OutboxRepository>,
    registry: HashMap<&'static str, Arc<dyn Projector>>,
    batch_size: usize,
    metrics: Option<Arc<OutboxMetrics>>,
    pass_lock: Mutex<()>,
}

impl OutboxProcessor {
    /// Build the event type → projector registry once.
    /// Two projectors claiming the same event type is a wiring error.
    pub fn new(
        repository: Arc<dyn OutboxRepository>,
        projectors: Vec<Arc<dyn Projector>>,
    ) -> Result<Self, RegistryError> {
        let mut registry: HashMap<&'static str, Arc<dyn Projector>> = HashMap::new();

        for projector in projectors {
            for event_type in projector.handled_event_types() {
                if let Some(existing) = registry.get(event_type) {
                    return Err(RegistryError::DuplicateEventType {
                        event_type: event_type.to_string(),
                        existing: existing.name(),
                        duplicate: projector.name(),
                    });
                }
                registry.insert(event_type, Arc::clone(&projector));
            }
        }

        tracing::info!(
            event_types = registry.len(),
            "📋 Outbox processor registry built"
        );

        Ok(Self {
            repository,
            registry,
            batch_size: DEFAULT_BATCH_SIZE,
            metrics: None,
            pass_lock: Mutex::new(()),
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<OutboxMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn registered_event_types(&self) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = self.registry.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Project one entry; `Ok(true)` when it was marked PROCESSED
    async fn process_entry(&self, entry: &OutboxEntry) -> Result<bool, OutboxError> {
        let event_type = entry.event_type();

        let Some(projector) = self.registry.get(event_type) else {
            let message = format!("No projector registered for event type: {event_type}");
            self.fail(entry, &message, REASON_NO_PROJECTOR).await?;
            return Ok(false);
        };

        let started = Instant::now();
        let outcome = AssertUnwindSafe(projector.project(event_type, entry.event_data()))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {
                self.repository.mark_processed(entry.entry_id()).await?;
                if let Some(metrics) = &self.metrics {
                    metrics.record_processed(event_type, started.elapsed().as_secs_f64());
                }
                tracing::debug!(
                    entry_id = %entry.entry_id(),
                    event_type = %event_type,
                    projector = projector.name(),
                    "✅ Outbox entry projected"
                );
                Ok(true)
            }
            Ok(Err(e)) => {
                self.fail(entry, &e.to_string(), REASON_PROJECTION_ERROR).await?;
                Ok(false)
            }
            Err(panic) => {
                let message = format!(
                    "Projector {} panicked: {}",
                    projector.name(),
                    panic_message(panic.as_ref())
                );
                self.fail(entry, &message, REASON_PROJECTION_ERROR).await?;
                Ok(false)
            }
        }
    }

    async fn fail(&self, entry: &OutboxEntry, error: &str, reason: &str) -> Result<(), OutboxError> {
        let updated = self.repository.mark_failed(entry.entry_id(), error).await?;

        if let Some(metrics) = &self.metrics {
            metrics.record_failure(entry.event_type(), reason);
        }

        if updated.status() == OutboxStatus::DeadLettered {
            if let Some(metrics) = &self.metrics {
                metrics.record_dead_letter(entry.event_type());
            }
            tracing::warn!(
                entry_id = %updated.entry_id(),
                event_type = %updated.event_type(),
                retry_count = updated.retry_count(),
                error = %error,
                "💀 Outbox entry dead-lettered after exhausting retries"
            );
        } else {
            tracing::info!(
                entry_id = %updated.entry_id(),
                event_type = %updated.event_type(),
                retry_count = updated.retry_count(),
                max_retries = updated.max_retries(),
                next_retry_at = ?updated.next_retry_at(),
                error = %error,
                "🔁 Outbox entry failed, retry {}/{} scheduled",
                updated.retry_count(),
                updated.max_retries()
            );
        }
        Ok(())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}

#[async_trait]
impl ProcessOutbox for OutboxProcessor {
    async fn process_pending(&self) -> anyhow::Result<usize> {
        let _pass = self.pass_lock.lock().await;

        let entries = self.repository.find_pending(self.batch_size).await?;
        if entries.is_empty() {
            return Ok(0);
        }

        tracing::debug!(count = entries.len(), "📦 Processing outbox batch");

        let mut processed = 0;
        for entry in &entries {
            match self.process_entry(entry).await {
                Ok(true) => processed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        entry_id = %entry.entry_id(),
                        error = %e,
                        "Failed to update outbox entry status"
                    );
                }
            }
        }

        tracing::debug!(
            processed,
            fetched = entries.len(),
            "Outbox batch complete"
        );
        Ok(processed)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::event_sourcing::core::{DomainEvent, EventData};
    use crate::outbox::{InMemoryOutboxRepository, OutboxStore};
    use crate::projections::{ProjectionError, ProjectionResult};
    use chrono::TimeDelta;
    use serde::Serialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Serialize, Clone)]
    struct Ping {
        id: String,
    }

    impl DomainEvent for Ping {
        fn event_name(&self) -> &'static str {
            "Ping"
        }
    }

    #[derive(Serialize, Clone)]
    struct Unrouted {
        id: String,
    }

    impl DomainEvent for Unrouted {
        fn event_name(&self) -> &'static str {
            "Unrouted"
        }
    }

    /// Fails the first `failures` calls, then succeeds
    struct FlakyProjector {
        name: &'static str,
        failures: usize,
        calls: AtomicUsize,
    }

    impl FlakyProjector {
        fn new(name: &'static str, failures: usize) -> Self {
            Self {
                name,
                failures,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Projector for FlakyProjector {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handled_event_types(&self) -> Vec<&'static str> {
            vec!["Ping"]
        }

        async fn project(&self, _event_type: &str, _data: &EventData) -> ProjectionResult<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(ProjectionError::Storage("read model unavailable".to_string()));
            }
            Ok(())
        }
    }

    fn flaky(name: &'static str, failures: usize) -> Arc<dyn Projector> {
        Arc::new(FlakyProjector::new(name, failures))
    }

    #[derive(Serialize, Clone)]
    struct Poisoned {
        id: String,
    }

    impl DomainEvent for Poisoned {
        fn event_name(&self) -> &'static str {
            "Poisoned"
        }
    }

    /// Reads a field the payload never carries
    struct PanickingProjector;

    #[async_trait]
    impl Projector for PanickingProjector {
        fn name(&self) -> &'static str {
            "PanickingProjector"
        }

        fn handled_event_types(&self) -> Vec<&'static str> {
            vec!["Poisoned"]
        }

        async fn project(&self, _event_type: &str, data: &EventData) -> ProjectionResult<()> {
            let _ = data["missing_field"].as_str().unwrap();
            Ok(())
        }
    }

    struct Harness {
        store: OutboxStore,
        clock: Arc<ManualClock>,
        repo: Arc<InMemoryOutboxRepository>,
    }

    fn harness() -> Harness {
        let store = OutboxStore::new();
        let clock = Arc::new(ManualClock::starting_now());
        let repo = Arc::new(InMemoryOutboxRepository::new(store.clone(), clock.clone()));
        Harness { store, clock, repo }
    }

    async fn seed<E: DomainEvent>(h: &Harness, entry_id: &str, event: &E) {
        let entry = OutboxEntry::create(entry_id, event, "agg-1", "Test", h.clock.now()).unwrap();
        h.repo.save(entry).await.unwrap();
    }

    fn ping(id: &str) -> Ping {
        Ping { id: id.to_string() }
    }

    #[test]
    fn test_duplicate_event_type_fails_fast() {
        let h = harness();
        let result = OutboxProcessor::new(
            h.repo.clone(),
            vec![flaky("First", 0), flaky("Second", 0)],
        );

        assert_eq!(
            result.err(),
            Some(RegistryError::DuplicateEventType {
                event_type: "Ping".to_string(),
                existing: "First",
                duplicate: "Second",
            })
        );
    }

    #[tokio::test]
    async fn test_successful_pass_marks_processed() {
        let h = harness();
        seed(&h, "e-1", &ping("1")).await;
        seed(&h, "e-2", &ping("2")).await;

        let processor = OutboxProcessor::new(h.repo.clone(), vec![flaky("P", 0)]).unwrap();

        assert_eq!(processor.process_pending().await.unwrap(), 2);
        assert_eq!(processor.process_pending().await.unwrap(), 0);
        assert!(h
            .store
            .snapshot()
            .await
            .iter()
            .all(|e| e.status() == OutboxStatus::Processed));
    }

    #[tokio::test]
    async fn test_unrouted_event_consumes_retries_until_dead_lettered() {
        let h = harness();
        seed(&h, "e-1", &Unrouted { id: "1".to_string() }).await;
        let processor = OutboxProcessor::new(h.repo.clone(), vec![flaky("P", 0)]).unwrap();

        for expected_retries in 1..=3u32 {
            assert_eq!(processor.process_pending().await.unwrap(), 0);
            let entry = h.repo.find_by_id("e-1").await.unwrap().unwrap();
            assert_eq!(entry.retry_count(), expected_retries);
            assert_eq!(
                entry.last_error(),
                Some("No projector registered for event type: Unrouted")
            );
            h.clock.advance(TimeDelta::seconds(10));
        }

        let entry = h.repo.find_by_id("e-1").await.unwrap().unwrap();
        assert_eq!(entry.status(), OutboxStatus::DeadLettered);
        assert_eq!(processor.process_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_the_pass() {
        let h = harness();
        seed(&h, "e-1", &Unrouted { id: "1".to_string() }).await;
        seed(&h, "e-2", &ping("2")).await;

        let processor = OutboxProcessor::new(h.repo.clone(), vec![flaky("P", 0)]).unwrap();

        assert_eq!(processor.process_pending().await.unwrap(), 1);
        let failed = h.repo.find_by_id("e-1").await.unwrap().unwrap();
        assert_eq!(failed.status(), OutboxStatus::Failed);
    }

    #[tokio::test]
    async fn test_batch_size_limits_a_pass() {
        let h = harness();
        for i in 0..5 {
            seed(&h, &format!("e-{i}"), &ping(&i.to_string())).await;
        }
        let processor = OutboxProcessor::new(h.repo.clone(), vec![flaky("P", 0)])
            .unwrap()
            .with_batch_size(2);

        assert_eq!(processor.process_pending().await.unwrap(), 2);
        assert_eq!(processor.process_pending().await.unwrap(), 2);
        assert_eq!(processor.process_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_metrics_are_recorded() {
        let h = harness();
        seed(&h, "e-1", &ping("1")).await;
        seed(&h, "e-2", &Unrouted { id: "2".to_string() }).await;

        let metrics = Arc::new(OutboxMetrics::new().unwrap());
        let processor = OutboxProcessor::new(h.repo.clone(), vec![flaky("P", 0)])
            .unwrap()
            .with_metrics(metrics.clone());

        processor.process_pending().await.unwrap();

        assert_eq!(
            metrics.entries_processed.with_label_values(&["Ping"]).get(),
            1
        );
        assert_eq!(
            metrics
                .entries_failed
                .with_label_values(&["Unrouted", REASON_NO_PROJECTOR])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn test_flaky_projector_recovers_after_backoff() {
        let h = harness();
        seed(&h, "e-1", &ping("1")).await;
        let processor = OutboxProcessor::new(h.repo.clone(), vec![flaky("P", 1)]).unwrap();

        assert_eq!(processor.process_pending().await.unwrap(), 0);
        // Still backing off
        assert_eq!(processor.process_pending().await.unwrap(), 0);

        h.clock.advance(TimeDelta::seconds(1));
        assert_eq!(processor.process_pending().await.unwrap(), 1);
        let entry = h.repo.find_by_id("e-1").await.unwrap().unwrap();
        assert_eq!(entry.status(), OutboxStatus::Processed);
        assert_eq!(entry.retry_count(), 1);
    }

    #[tokio::test]
    async fn test_panicking_projector_fails_entry_without_blocking_the_queue() {
        let h = harness();
        seed(&h, "e-1", &Poisoned { id: "1".to_string() }).await;
        seed(&h, "e-2", &ping("2")).await;
        let panicking: Arc<dyn Projector> = Arc::new(PanickingProjector);
        let processor =
            OutboxProcessor::new(h.repo.clone(), vec![panicking, flaky("P", 0)]).unwrap();

        // The healthy entry behind the poisoned one still gets projected
        assert_eq!(processor.process_pending().await.unwrap(), 1);
        let healthy = h.repo.find_by_id("e-2").await.unwrap().unwrap();
        assert_eq!(healthy.status(), OutboxStatus::Processed);

        let poisoned = h.repo.find_by_id("e-1").await.unwrap().unwrap();
        assert_eq!(poisoned.status(), OutboxStatus::Failed);
        assert_eq!(poisoned.retry_count(), 1);
        assert!(poisoned
            .last_error()
            .unwrap()
            .starts_with("Projector PanickingProjector panicked"));

        for _ in 0..2 {
            h.clock.advance(TimeDelta::seconds(10));
            assert_eq!(processor.process_pending().await.unwrap(), 0);
        }
        let poisoned = h.repo.find_by_id("e-1").await.unwrap().unwrap();
        assert_eq!(poisoned.status(), OutboxStatus::DeadLettered);
        assert_eq!(poisoned.retry_count(), 3);
    }
}
