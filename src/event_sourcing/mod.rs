// ============================================================================
// Event Sourcing Module
// ============================================================================
//
// Generic building blocks shared by every aggregate:
// - core/ - AggregateRoot and DomainEvent traits, EventData wire shape
//
// ============================================================================

pub mod core;

pub use self::core::{AggregateRoot, DomainEvent, EventData, EventDataError};
