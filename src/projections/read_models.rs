use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::projector::ProjectionResult;

// ============================================================================
// Read Models - Denormalized query-side views
// ============================================================================
//
// Written only by projectors, never by command handlers. Repositories hand
// out owned copies so callers can never mutate stored state in place.
//
// ============================================================================

pub mod status {
    pub const OPEN: &str = "open";
    pub const COMPLETED: &str = "completed";
    pub const CANCELLED: &str = "cancelled";

    pub const ITEM_PENDING: &str = "pending";
    pub const ITEM_READY: &str = "ready";
    pub const ITEM_CANCELLED: &str = "cancelled";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemReadModel {
    pub menu_item_id: String,
    pub name: String,
    pub price: Decimal,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemReadModel {
    pub order_item_id: String,
    pub menu_item_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub status: String,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReadModel {
    pub order_id: String,
    pub table_number: u32,
    pub status: String,
    pub items: Vec<OrderItemReadModel>,
}

impl OrderReadModel {
    pub fn has_item(&self, order_item_id: &str) -> bool {
        self.items.iter().any(|i| i.order_item_id == order_item_id)
    }

    pub fn item_mut(&mut self, order_item_id: &str) -> Option<&mut OrderItemReadModel> {
        self.items
            .iter_mut()
            .find(|i| i.order_item_id == order_item_id)
    }
}

// ============================================================================
// Repository Ports
// ============================================================================

#[async_trait]
pub trait MenuItemReadModelRepository: Send + Sync {
    async fn find_by_id(&self, menu_item_id: &str) -> ProjectionResult<Option<MenuItemReadModel>>;

    /// Available items sorted by id
    async fn find_all_available(&self) -> ProjectionResult<Vec<MenuItemReadModel>>;

    async fn save(&self, read_model: MenuItemReadModel) -> ProjectionResult<()>;
}

#[async_trait]
pub trait OrderReadModelRepository: Send + Sync {
    async fn find_by_id(&self, order_id: &str) -> ProjectionResult<Option<OrderReadModel>>;

    async fn save(&self, read_model: OrderReadModel) -> ProjectionResult<()>;

    async fn delete(&self, order_id: &str) -> ProjectionResult<()>;
}

// ============================================================================
// In-memory Adapters
// ============================================================================

#[derive(Clone, Default)]
pub struct InMemoryMenuItemReadModelRepository {
    store: Arc<RwLock<HashMap<String, MenuItemReadModel>>>,
}

impl InMemoryMenuItemReadModelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl MenuItemReadModelRepository for InMemoryMenuItemReadModelRepository {
    async fn find_by_id(&self, menu_item_id: &str) -> ProjectionResult<Option<MenuItemReadModel>> {
        Ok(self.store.read().await.get(menu_item_id).cloned())
    }

    async fn find_all_available(&self) -> ProjectionResult<Vec<MenuItemReadModel>> {
        let store = self.store.read().await;
        let mut items: Vec<MenuItemReadModel> =
            store.values().filter(|m| m.available).cloned().collect();
        items.sort_by(|a, b| a.menu_item_id.cmp(&b.menu_item_id));
        Ok(items)
    }

    async fn save(&self, read_model: MenuItemReadModel) -> ProjectionResult<()> {
        self.store
            .write()
            .await
            .insert(read_model.menu_item_id.clone(), read_model);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryOrderReadModelRepository {
    store: Arc<RwLock<HashMap<String, OrderReadModel>>>,
}

impl InMemoryOrderReadModelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl OrderReadModelRepository for InMemoryOrderReadModelRepository {
    async fn find_by_id(&self, order_id: &str) -> ProjectionResult<Option<OrderReadModel>> {
        Ok(self.store.read().await.get(order_id).cloned())
    }

    async fn save(&self, read_model: OrderReadModel) -> ProjectionResult<()> {
        self.store
            .write()
            .await
            .insert(read_model.order_id.clone(), read_model);
        Ok(())
    }

    async fn delete(&self, order_id: &str) -> ProjectionResult<()> {
        self.store.write().await.remove(order_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu_item(id: &str, available: bool) -> MenuItemReadModel {
        MenuItemReadModel {
            menu_item_id: id.to_string(),
            name: format!("Dish {id}"),
            price: Decimal::new(500, 2),
            available,
        }
    }

    #[tokio::test]
    async fn test_find_all_available_filters_and_sorts() {
        let repo = InMemoryMenuItemReadModelRepository::new();
        repo.save(menu_item("m-2", true)).await.unwrap();
        repo.save(menu_item("m-3", false)).await.unwrap();
        repo.save(menu_item("m-1", true)).await.unwrap();

        let ids: Vec<String> = repo
            .find_all_available()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.menu_item_id)
            .collect();
        assert_eq!(ids, vec!["m-1", "m-2"]);
    }

    #[tokio::test]
    async fn test_returned_models_are_copies() {
        let repo = InMemoryOrderReadModelRepository::new();
        repo.save(OrderReadModel {
            order_id: "o-1".to_string(),
            table_number: 4,
            status: status::OPEN.to_string(),
            items: vec![],
        })
        .await
        .unwrap();

        let mut copy = repo.find_by_id("o-1").await.unwrap().unwrap();
        copy.status = status::CANCELLED.to_string();

        let stored = repo.find_by_id("o-1").await.unwrap().unwrap();
        assert_eq!(stored.status, status::OPEN);
    }

    #[tokio::test]
    async fn test_delete_order() {
        let repo = InMemoryOrderReadModelRepository::new();
        repo.save(OrderReadModel {
            order_id: "o-1".to_string(),
            table_number: 1,
            status: status::OPEN.to_string(),
            items: vec![],
        })
        .await
        .unwrap();

        repo.delete("o-1").await.unwrap();
        assert!(repo.find_by_id("o-1").await.unwrap().is_none());
        assert!(repo.is_empty().await);
    }
}
