use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use super::processor::ProcessOutbox;
use crate::metrics::OutboxMetrics;

// ============================================================================
// Outbox Worker - Background scheduler for processing passes
// ============================================================================
//
// A single tokio task runs: pass → sleep(interval) → pass → ...
//
// - start() is idempotent; a running worker is left alone
// - stop() is idempotent; it signals shutdown and waits for the task, so an
//   in-flight pass always finishes and no pass starts after stop() returns
// - the shutdown signal only interrupts the sleep between passes
// - errors (and panics) escaping a pass are logged and the loop carries on
//
// ============================================================================

struct Running {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct OutboxWorker {
    processor: Arc<dyn ProcessOutbox>,
    interval: Duration,
    metrics: Option<Arc<OutboxMetrics>>,
    running: Mutex<Option<Running>>,
}

impl OutboxWorker {
    pub fn new(processor: Arc<dyn ProcessOutbox>, interval: Duration) -> Self {
        Self {
            processor,
            interval,
            metrics: None,
            running: Mutex::new(None),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<OutboxMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            tracing::debug!("Outbox worker already running");
            return;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.processor),
            self.interval,
            self.metrics.clone(),
            shutdown_rx,
        ));

        *running = Some(Running { shutdown, handle });
    }

    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        let Some(Running { shutdown, handle }) = running.take() else {
            return;
        };

        // The receiver is gone only if the loop already exited
        let _ = shutdown.send(true);

        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Outbox worker task ended abnormally");
        }
    }
}

async fn run_loop(
    processor: Arc<dyn ProcessOutbox>,
    interval: Duration,
    metrics: Option<Arc<OutboxMetrics>>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(
        interval_ms = interval.as_millis() as u64,
        "🚀 Outbox worker started"
    );

    loop {
        if *shutdown.borrow() {
            break;
        }

        let outcome = AssertUnwindSafe(processor.process_pending())
            .catch_unwind()
            .await;

        let failed = match outcome {
            Ok(Ok(processed)) => {
                if processed > 0 {
                    tracing::debug!(processed, "Outbox pass complete");
                }
                false
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "❌ Outbox processing pass failed");
                true
            }
            Err(_) => {
                tracing::error!("❌ Outbox processing pass panicked");
                true
            }
        };
        if let Some(metrics) = &metrics {
            metrics.record_worker_pass(failed);
        }

        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    tracing::info!("🛑 Outbox worker stopped");
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProcessor {
        passes: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ProcessOutbox for CountingProcessor {
        async fn process_pending(&self) -> anyhow::Result<usize> {
            self.passes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("projection store offline");
            }
            Ok(0)
        }
    }

    /// Takes a while, so stop() lands mid-pass
    #[derive(Default)]
    struct SlowProcessor {
        started: AtomicBool,
        finished: AtomicBool,
    }

    #[async_trait]
    impl ProcessOutbox for SlowProcessor {
        async fn process_pending(&self) -> anyhow::Result<usize> {
            self.started.store(true, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.finished.store(true, Ordering::SeqCst);
            Ok(1)
        }
    }

    #[tokio::test]
    async fn test_worker_runs_passes_until_stopped() {
        let processor = Arc::new(CountingProcessor::default());
        let worker = OutboxWorker::new(processor.clone(), Duration::from_millis(10));

        worker.start().await;
        assert!(worker.is_running().await);
        tokio::time::sleep(Duration::from_millis(60)).await;
        worker.stop().await;
        assert!(!worker.is_running().await);

        let passes = processor.passes.load(Ordering::SeqCst);
        assert!(passes >= 2, "expected several passes, got {passes}");

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(processor.passes.load(Ordering::SeqCst), passes);
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let processor = Arc::new(CountingProcessor::default());
        let worker = OutboxWorker::new(processor.clone(), Duration::from_secs(60));

        worker.stop().await;
        worker.start().await;
        worker.start().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        // One loop only: a single pass before the long sleep
        assert_eq!(processor.passes.load(Ordering::SeqCst), 1);

        worker.stop().await;
        worker.stop().await;
        assert!(!worker.is_running().await);
    }

    #[tokio::test]
    async fn test_failing_passes_do_not_kill_the_loop() {
        let processor = Arc::new(CountingProcessor {
            passes: AtomicUsize::new(0),
            fail: true,
        });
        let metrics = Arc::new(OutboxMetrics::new().unwrap());
        let worker = OutboxWorker::new(processor.clone(), Duration::from_millis(10))
            .with_metrics(metrics.clone());

        worker.start().await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        worker.stop().await;

        assert!(processor.passes.load(Ordering::SeqCst) >= 2);
        assert_eq!(metrics.worker_passes.get(), metrics.worker_errors.get());
    }

    #[tokio::test]
    async fn test_stop_waits_for_in_flight_pass() {
        let processor = Arc::new(SlowProcessor::default());
        let worker = OutboxWorker::new(processor.clone(), Duration::from_millis(10));

        worker.start().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(processor.started.load(Ordering::SeqCst));

        worker.stop().await;
        assert!(processor.finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_worker_can_restart() {
        let processor = Arc::new(CountingProcessor::default());
        let worker = OutboxWorker::new(processor.clone(), Duration::from_secs(60));

        worker.start().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        worker.stop().await;
        worker.start().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        worker.stop().await;

        assert_eq!(processor.passes.load(Ordering::SeqCst), 2);
    }
}
