use super::menu_item::{MenuItem, MenuItemError};
use crate::event_sourcing::core::AggregateRoot;

// ============================================================================
// Order Domain Service - Rules spanning Order and MenuItem
// ============================================================================

/// Every requested menu item must exist and be available.
/// Missing and sold-out ids are reported together, in request order.
pub fn verify_items_available(
    requested_ids: &[String],
    menu_items: &[MenuItem],
) -> Result<(), MenuItemError> {
    let unavailable: Vec<String> = requested_ids
        .iter()
        .filter(|id| {
            !menu_items
                .iter()
                .any(|m| m.aggregate_id() == id.as_str() && m.is_available())
        })
        .cloned()
        .collect();

    if unavailable.is_empty() {
        Ok(())
    } else {
        Err(MenuItemError::NotAvailable(unavailable))
    }
}
