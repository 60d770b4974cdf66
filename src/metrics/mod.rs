use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for the outbox pipeline
// ============================================================================
//
// Covers:
// - Projection throughput and latency per event type
// - Failed attempts (with reason) and dead-lettered entries
// - Background worker passes and swallowed errors
//
// Metrics live in their own Registry; `render()` produces the text
// exposition format for whatever surface the host exposes.
// ============================================================================

pub const REASON_PROJECTION_ERROR: &str = "projection_error";
pub const REASON_NO_PROJECTOR: &str = "no_projector";

pub struct OutboxMetrics {
    registry: Registry,

    pub entries_processed: IntCounterVec,
    pub entries_failed: IntCounterVec,
    pub entries_dead_lettered: IntCounterVec,
    pub projection_duration: HistogramVec,

    pub worker_passes: IntCounter,
    pub worker_errors: IntCounter,
}

impl OutboxMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let entries_processed = IntCounterVec::new(
            Opts::new("outbox_entries_processed_total", "Outbox entries projected successfully"),
            &["event_type"],
        )?;
        registry.register(Box::new(entries_processed.clone()))?;

        let entries_failed = IntCounterVec::new(
            Opts::new("outbox_entries_failed_total", "Failed outbox projection attempts"),
            &["event_type", "reason"],
        )?;
        registry.register(Box::new(entries_failed.clone()))?;

        let entries_dead_lettered = IntCounterVec::new(
            Opts::new(
                "outbox_entries_dead_lettered_total",
                "Outbox entries that exhausted their retries",
            ),
            &["event_type"],
        )?;
        registry.register(Box::new(entries_dead_lettered.clone()))?;

        let projection_duration = HistogramVec::new(
            HistogramOpts::new(
                "outbox_projection_duration_seconds",
                "Time spent inside a projector per entry",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["event_type"],
        )?;
        registry.register(Box::new(projection_duration.clone()))?;

        let worker_passes = IntCounter::new(
            "outbox_worker_passes_total",
            "Processing passes started by the background worker",
        )?;
        registry.register(Box::new(worker_passes.clone()))?;

        let worker_errors = IntCounter::new(
            "outbox_worker_errors_total",
            "Errors escaping a processing pass, swallowed by the worker",
        )?;
        registry.register(Box::new(worker_errors.clone()))?;

        Ok(Self {
            registry,
            entries_processed,
            entries_failed,
            entries_dead_lettered,
            projection_duration,
            worker_passes,
            worker_errors,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record one successful projection
    pub fn record_processed(&self, event_type: &str, duration_secs: f64) {
        self.entries_processed.with_label_values(&[event_type]).inc();
        self.projection_duration
            .with_label_values(&[event_type])
            .observe(duration_secs);
    }

    /// Record one failed attempt
    pub fn record_failure(&self, event_type: &str, reason: &str) {
        self.entries_failed
            .with_label_values(&[event_type, reason])
            .inc();
    }

    pub fn record_dead_letter(&self, event_type: &str) {
        self.entries_dead_lettered
            .with_label_values(&[event_type])
            .inc();
    }

    pub fn record_worker_pass(&self, failed: bool) {
        self.worker_passes.inc();
        if failed {
            self.worker_errors.inc();
        }
    }

    /// Prometheus text exposition of every registered metric
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = OutboxMetrics::new().unwrap();
        metrics.record_worker_pass(false);
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_processed() {
        let metrics = OutboxMetrics::new().unwrap();
        metrics.record_processed("OrderPlaced", 0.002);

        let gathered = metrics.registry().gather();
        let processed = gathered
            .iter()
            .find(|m| m.name() == "outbox_entries_processed_total")
            .unwrap();
        assert_eq!(processed.metric[0].counter.value, Some(1.0));
    }

    #[test]
    fn test_failures_are_labelled_by_reason() {
        let metrics = OutboxMetrics::new().unwrap();
        metrics.record_failure("OrderPlaced", REASON_PROJECTION_ERROR);
        metrics.record_failure("Unknown", REASON_NO_PROJECTOR);
        metrics.record_dead_letter("Unknown");

        let gathered = metrics.registry().gather();
        let failed = gathered
            .iter()
            .find(|m| m.name() == "outbox_entries_failed_total")
            .unwrap();
        assert_eq!(failed.metric.len(), 2);
    }

    #[test]
    fn test_worker_errors_counted() {
        let metrics = OutboxMetrics::new().unwrap();
        metrics.record_worker_pass(true);
        metrics.record_worker_pass(false);

        assert_eq!(metrics.worker_passes.get(), 2);
        assert_eq!(metrics.worker_errors.get(), 1);
    }

    #[test]
    fn test_render_contains_metric_names() {
        let metrics = OutboxMetrics::new().unwrap();
        metrics.record_dead_letter("MenuItemCreated");
        let text = metrics.render().unwrap();
        assert!(text.contains("outbox_entries_dead_lettered_total"));
    }
}
