// ============================================================================
// MenuItem Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MenuItemError {
    #[error("Menu items not available: {}", .0.join(", "))]
    NotAvailable(Vec<String>),
}
