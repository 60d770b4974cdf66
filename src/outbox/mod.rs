// ============================================================================
// Outbox - Durable event log between the command and query sides
// ============================================================================
//
// - entry: per-event retry / backoff / dead-letter state machine
// - repository: port + in-memory adapter, including admin queries
// - processor: one pass of routing ready entries to projectors
// - worker: background task driving the processor on an interval
//
// ============================================================================

pub mod entry;
pub mod processor;
pub mod repository;
pub mod worker;

pub use entry::{OutboxEntry, OutboxError, OutboxStatus, RetryPolicy};
pub use processor::{OutboxProcessor, ProcessOutbox, RegistryError, DEFAULT_BATCH_SIZE};
pub use repository::{InMemoryOutboxRepository, OutboxRepository, OutboxStats, OutboxStore};
pub use worker::OutboxWorker;
