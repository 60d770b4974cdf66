// ============================================================================
// tabb - Restaurant orders with a transactional outbox
// ============================================================================
//
// Command side: handlers mutate aggregates and write their events as outbox
// entries in the same staged transaction.
// Query side: a background worker drains the outbox into idempotent
// projectors that maintain denormalized read models.
//
// ============================================================================

pub mod clock;
pub mod config;
pub mod domain;
pub mod event_sourcing;
pub mod ids;
pub mod metrics;
pub mod outbox;
pub mod persistence;
pub mod projections;
