// ============================================================================
// Order Domain - Table orders from placement to completion
// ============================================================================
//
// - Value objects (OrderItem, OrderStatus, OrderItemStatus)
// - Events (OrderPlaced, OrderItemAdded, DishMarkedReady, ...)
// - Commands (PlaceOrder, MarkItemReady, CancelItem, ...)
// - Errors (OrderError enum)
// - Aggregate (Order with its business rules)
// - Command Handler (OrderCommandHandler)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;

pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use command_handler::*;
