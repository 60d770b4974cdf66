use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

use super::projector::ProjectionError;
use super::read_models::{MenuItemReadModelRepository, OrderReadModelRepository};

// ============================================================================
// Query Handlers - Read only from the read model store
// ============================================================================
//
// Results are eventually consistent: a freshly placed order is not found
// until the outbox processor has projected its OrderPlaced event.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Order '{0}' not found")]
    OrderNotFound(String),

    #[error(transparent)]
    Storage(#[from] ProjectionError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItemResult {
    pub order_item_id: String,
    pub menu_item_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub status: String,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderResult {
    pub order_id: String,
    pub table_number: u32,
    pub status: String,
    pub items: Vec<OrderItemResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItemResult {
    pub menu_item_id: String,
    pub name: String,
    pub price: Decimal,
    pub available: bool,
}

pub struct GetOrderHandler {
    orders: Arc<dyn OrderReadModelRepository>,
}

impl GetOrderHandler {
    pub fn new(orders: Arc<dyn OrderReadModelRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(&self, order_id: &str) -> Result<OrderResult, QueryError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| QueryError::OrderNotFound(order_id.to_string()))?;

        Ok(OrderResult {
            order_id: order.order_id,
            table_number: order.table_number,
            status: order.status,
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemResult {
                    order_item_id: item.order_item_id,
                    menu_item_id: item.menu_item_id,
                    name: item.name,
                    unit_price: item.unit_price,
                    quantity: item.quantity,
                    status: item.status,
                    total_price: item.total_price,
                })
                .collect(),
        })
    }
}

pub struct GetAvailableMenuItemsHandler {
    menu_items: Arc<dyn MenuItemReadModelRepository>,
}

impl GetAvailableMenuItemsHandler {
    pub fn new(menu_items: Arc<dyn MenuItemReadModelRepository>) -> Self {
        Self { menu_items }
    }

    /// Sorted by menu item id
    pub async fn handle(&self) -> Result<Vec<MenuItemResult>, QueryError> {
        Ok(self
            .menu_items
            .find_all_available()
            .await?
            .into_iter()
            .map(|m| MenuItemResult {
                menu_item_id: m.menu_item_id,
                name: m.name,
                price: m.price,
                available: m.available,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projections::read_models::{
        InMemoryMenuItemReadModelRepository, InMemoryOrderReadModelRepository, MenuItemReadModel,
    };

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let handler = GetOrderHandler::new(Arc::new(InMemoryOrderReadModelRepository::new()));
        let err = handler.handle("o-1").await.unwrap_err();
        assert!(matches!(err, QueryError::OrderNotFound(id) if id == "o-1"));
    }

    #[tokio::test]
    async fn test_available_items_only() {
        let repo = InMemoryMenuItemReadModelRepository::new();
        for (id, available) in [("m-2", true), ("m-1", true), ("m-3", false)] {
            repo.save(MenuItemReadModel {
                menu_item_id: id.to_string(),
                name: "Dish".to_string(),
                price: Decimal::ONE,
                available,
            })
            .await
            .unwrap();
        }

        let handler = GetAvailableMenuItemsHandler::new(Arc::new(repo));
        let ids: Vec<String> = handler
            .handle()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.menu_item_id)
            .collect();
        assert_eq!(ids, vec!["m-1", "m-2"]);
    }
}
