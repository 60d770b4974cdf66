// ============================================================================
// MenuItem Domain - Dish availability
// ============================================================================
//
// Kept apart from Order so availability changes never contend with orders
// being placed or served.
//
// ============================================================================

pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;

pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use command_handler::*;
