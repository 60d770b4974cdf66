use crate::domain::errors::ValidationError;
use crate::domain::value_objects::{required_text, Money};
use crate::event_sourcing::core::AggregateRoot;

use super::events::*;

// ============================================================================
// MenuItem Aggregate
// ============================================================================

#[derive(Debug, Clone)]
pub struct MenuItem {
    id: String,
    name: String,
    price: Money,
    available: bool,
    pending_events: Vec<MenuItemEvent>,
}

impl MenuItem {
    /// Factory: a new menu item starts out available
    pub fn create(id: &str, name: &str, price: Money) -> Result<Self, ValidationError> {
        let id = required_text("MenuItem", "id", id)?;
        let name = required_text("MenuItem", "name", name)?;

        let mut item = Self {
            id: id.clone(),
            name: name.clone(),
            price,
            available: true,
            pending_events: Vec::new(),
        };
        item.record(MenuItemEvent::Created(MenuItemCreated {
            menu_item_id: id,
            name,
            price: price.amount(),
        }));
        Ok(item)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// No-op when already sold out
    pub fn mark_sold_out(&mut self) {
        if !self.available {
            return;
        }
        self.available = false;
        self.record(MenuItemEvent::SoldOut(MenuItemSoldOut {
            menu_item_id: self.id.clone(),
        }));
    }

    /// No-op when already available
    pub fn mark_available(&mut self) {
        if self.available {
            return;
        }
        self.available = true;
        self.record(MenuItemEvent::Available(MenuItemAvailable {
            menu_item_id: self.id.clone(),
        }));
    }

    fn record(&mut self, event: MenuItemEvent) {
        self.pending_events.push(event);
    }
}

impl AggregateRoot for MenuItem {
    type Event = MenuItemEvent;

    const AGGREGATE_TYPE: &'static str = "MenuItem";

    fn aggregate_id(&self) -> &str {
        &self.id
    }

    fn take_events(&mut self) -> Vec<Self::Event> {
        std::mem::take(&mut self.pending_events)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sourcing::core::DomainEvent;
    use rust_decimal::Decimal;

    fn burger() -> MenuItem {
        MenuItem::create("m-1", "Burger", Money::new(Decimal::new(999, 2)).unwrap()).unwrap()
    }

    #[test]
    fn test_create_records_created_event() {
        let mut item = burger();
        assert!(item.is_available());
        assert_eq!(item.name(), "Burger");

        let events = item.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name(), MENU_ITEM_CREATED);
        assert!(item.take_events().is_empty());
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let err = MenuItem::create("m-1", " ", Money::new(Decimal::ONE).unwrap()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::RequiredField {
                entity: "MenuItem",
                field: "name"
            }
        );
    }

    #[test]
    fn test_sold_out_and_back_are_idempotent() {
        let mut item = burger();
        item.take_events();

        item.mark_sold_out();
        item.mark_sold_out();
        assert!(!item.is_available());

        item.mark_available();
        item.mark_available();
        assert!(item.is_available());

        let names: Vec<&str> = item.take_events().iter().map(|e| e.event_name()).collect();
        assert_eq!(names, vec![MENU_ITEM_SOLD_OUT, MENU_ITEM_AVAILABLE]);
    }
}
