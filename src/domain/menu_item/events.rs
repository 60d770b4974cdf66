use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::event_sourcing::core::DomainEvent;

// ============================================================================
// MenuItem Events
// ============================================================================

pub const MENU_ITEM_CREATED: &str = "MenuItemCreated";
pub const MENU_ITEM_SOLD_OUT: &str = "MenuItemSoldOut";
pub const MENU_ITEM_AVAILABLE: &str = "MenuItemAvailable";

/// Serializes to the bare fields of the wrapped event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MenuItemEvent {
    Created(MenuItemCreated),
    SoldOut(MenuItemSoldOut),
    Available(MenuItemAvailable),
}

impl DomainEvent for MenuItemEvent {
    fn event_name(&self) -> &'static str {
        match self {
            MenuItemEvent::Created(_) => MENU_ITEM_CREATED,
            MenuItemEvent::SoldOut(_) => MENU_ITEM_SOLD_OUT,
            MenuItemEvent::Available(_) => MENU_ITEM_AVAILABLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemCreated {
    pub menu_item_id: String,
    pub name: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemSoldOut {
    pub menu_item_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemAvailable {
    pub menu_item_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_created_flattens_with_price_as_string() {
        let event = MenuItemEvent::Created(MenuItemCreated {
            menu_item_id: "m-1".to_string(),
            name: "Burger".to_string(),
            price: Decimal::new(999, 2),
        });

        assert_eq!(event.event_name(), "MenuItemCreated");
        let data = event.to_event_data().unwrap();
        let keys: Vec<&str> = data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["menu_item_id", "name", "price"]);
        assert_eq!(data["price"], json!("9.99"));
    }
}
