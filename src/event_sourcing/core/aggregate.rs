use super::event::DomainEvent;

// ============================================================================
// Aggregate Root - State-stored aggregates that record events
// ============================================================================
//
// Key Principles:
// 1. Aggregates are persisted as state snapshots, not event streams
// 2. Every mutation records the domain events it caused
// 3. Command handlers drain recorded events into the outbox in the same
//    staged transaction that saves the aggregate
//
// ============================================================================

/// Generic Aggregate trait - all domain aggregates implement this
pub trait AggregateRoot: Clone + Send + Sync + 'static {
    type Event: DomainEvent;

    /// Aggregate type name stored on outbox entries, e.g. `"Order"`
    const AGGREGATE_TYPE: &'static str;

    /// Stable identity used as the storage key
    fn aggregate_id(&self) -> &str;

    /// Drain events recorded since the last call
    fn take_events(&mut self) -> Vec<Self::Event>;
}
