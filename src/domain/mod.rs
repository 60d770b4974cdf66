// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each aggregate has its own subdirectory with:
// - Value objects
// - Events
// - Commands
// - Errors
// - Aggregate implementation
// - Command handler
//
// Command handlers share a `CommandContext` (committed stores, id generator,
// clock, retry policy) and write through one staged transaction per command.
//
// ============================================================================

pub mod context;
pub mod errors;
pub mod menu_item;
pub mod order;
pub mod services;
pub mod value_objects;

pub use context::CommandContext;
pub use errors::{CommandError, ValidationError};
pub use value_objects::{Money, Quantity, TableNumber};
