// ============================================================================
// Event Sourcing Core - Generic aggregate and event abstractions
// ============================================================================
//
// No domain-specific code lives here (no Order, MenuItem, ...).
//
// ============================================================================

pub mod aggregate;
pub mod event;

pub use aggregate::AggregateRoot;
pub use event::{DomainEvent, EventData, EventDataError};
