// ============================================================================
// Persistence - Committed stores and the staged transaction over them
// ============================================================================

pub mod staged;
pub mod store;
pub mod unit_of_work;

pub use staged::{StagedOutbox, StagedRepository};
pub use store::{AggregateStore, CommittedStores, Versioned};
pub use unit_of_work::{UnitOfWork, UnitOfWorkError};
