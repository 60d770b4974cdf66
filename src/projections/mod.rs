// ============================================================================
// Projections - Query side of the pipeline
// ============================================================================

pub mod menu_item_projector;
pub mod order_projector;
pub mod projector;
pub mod queries;
pub mod read_models;

pub use menu_item_projector::MenuItemProjector;
pub use order_projector::OrderProjector;
pub use projector::{Fields, HandlerTable, ProjectionError, ProjectionResult, Projector};
pub use queries::{
    GetAvailableMenuItemsHandler, GetOrderHandler, MenuItemResult, OrderItemResult, OrderResult,
    QueryError,
};
pub use read_models::{
    InMemoryMenuItemReadModelRepository, InMemoryOrderReadModelRepository, MenuItemReadModel,
    MenuItemReadModelRepository, OrderItemReadModel, OrderReadModel, OrderReadModelRepository,
};
