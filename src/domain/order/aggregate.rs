use crate::domain::value_objects::{required_text, Money, Quantity, TableNumber};
use crate::event_sourcing::core::AggregateRoot;

use super::errors::OrderError;
use super::events::*;
use super::value_objects::{OrderItem, OrderItemStatus, OrderStatus};

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================
//
// Lifecycle: OPEN → COMPLETED | CANCELLED
// Items:     PENDING → READY, or CANCELLED from any non-READY state
//
// Only OPEN orders accept commands. Every successful mutation records the
// events describing it; the command handler drains them into the outbox.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct Order {
    id: String,
    table: TableNumber,
    items: Vec<OrderItem>,
    status: OrderStatus,
    pending_events: Vec<OrderEvent>,
}

impl Order {
    /// Factory: open a new, empty order for a table
    pub fn place(order_id: &str, table: TableNumber) -> Result<Self, OrderError> {
        let id = required_text("Order", "id", order_id)?;

        let mut order = Self {
            id: id.clone(),
            table,
            items: Vec::new(),
            status: OrderStatus::Open,
            pending_events: Vec::new(),
        };
        order.record(OrderEvent::Placed(OrderPlaced {
            order_id: id,
            table_number: table.value(),
        }));
        Ok(order)
    }

    pub fn table(&self) -> TableNumber {
        self.table
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn active_items(&self) -> impl Iterator<Item = &OrderItem> {
        self.items.iter().filter(|i| i.is_active())
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub fn add_item(
        &mut self,
        order_item_id: &str,
        menu_item_id: &str,
        name: &str,
        unit_price: Money,
        quantity: Quantity,
    ) -> Result<(), OrderError> {
        self.assert_open()?;

        let item = OrderItem {
            id: required_text("OrderItem", "id", order_item_id)?,
            menu_item_id: required_text("OrderItem", "menu_item_id", menu_item_id)?,
            name: required_text("OrderItem", "name", name)?,
            unit_price,
            quantity,
            status: OrderItemStatus::Pending,
        };

        self.record(OrderEvent::ItemAdded(OrderItemAdded {
            order_id: self.id.clone(),
            order_item_id: item.id.clone(),
            menu_item_id: item.menu_item_id.clone(),
            name: item.name.clone(),
            unit_price: unit_price.amount(),
            quantity: quantity.value(),
        }));
        self.items.push(item);
        Ok(())
    }

    pub fn mark_item_ready(&mut self, order_item_id: &str) -> Result<(), OrderError> {
        self.assert_open()?;
        let item = self.find_item_mut(order_item_id)?;
        if item.status != OrderItemStatus::Pending {
            return Err(OrderError::InvalidItemState {
                item_id: item.id.clone(),
                status: item.status,
                action: "mark as ready",
            });
        }
        item.status = OrderItemStatus::Ready;

        self.record(OrderEvent::DishReady(DishMarkedReady {
            order_id: self.id.clone(),
            order_item_id: order_item_id.to_string(),
        }));
        Ok(())
    }

    /// Cancel one item. When no active item remains the order is cancelled too.
    pub fn cancel_item(&mut self, order_item_id: &str) -> Result<(), OrderError> {
        self.assert_open()?;
        let item = self.find_item_mut(order_item_id)?;
        match item.status {
            OrderItemStatus::Cancelled => return Ok(()),
            OrderItemStatus::Ready => {
                return Err(OrderError::InvalidItemState {
                    item_id: item.id.clone(),
                    status: item.status,
                    action: "cancel",
                })
            }
            OrderItemStatus::Pending => item.status = OrderItemStatus::Cancelled,
        }

        self.record(OrderEvent::ItemCancelled(OrderItemCancelled {
            order_id: self.id.clone(),
            order_item_id: order_item_id.to_string(),
        }));

        if self.active_items().next().is_none() {
            self.status = OrderStatus::Cancelled;
            self.record(OrderEvent::Cancelled(OrderCancelled {
                order_id: self.id.clone(),
            }));
        }
        Ok(())
    }

    /// Every active item must be READY, and there must be at least one
    pub fn complete(&mut self) -> Result<(), OrderError> {
        self.assert_open()?;
        let ready = {
            let mut active = self.active_items().peekable();
            active.peek().is_some() && active.all(|i| i.status == OrderItemStatus::Ready)
        };
        if !ready {
            return Err(OrderError::NotFullyReady(self.id.clone()));
        }

        self.status = OrderStatus::Completed;
        self.record(OrderEvent::Completed(OrderCompleted {
            order_id: self.id.clone(),
        }));
        Ok(())
    }

    /// Cancel the whole order. Items already READY stay READY.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        self.assert_open()?;

        let mut cancelled = Vec::new();
        for item in self
            .items
            .iter_mut()
            .filter(|i| i.status == OrderItemStatus::Pending)
        {
            item.status = OrderItemStatus::Cancelled;
            cancelled.push(item.id.clone());
        }
        for order_item_id in cancelled {
            self.record(OrderEvent::ItemCancelled(OrderItemCancelled {
                order_id: self.id.clone(),
                order_item_id,
            }));
        }

        self.status = OrderStatus::Cancelled;
        self.record(OrderEvent::Cancelled(OrderCancelled {
            order_id: self.id.clone(),
        }));
        Ok(())
    }

    // ========================================================================
    // Invariant guards
    // ========================================================================

    fn assert_open(&self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Open {
            return Err(OrderError::NotOpen {
                order_id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    fn find_item_mut(&mut self, order_item_id: &str) -> Result<&mut OrderItem, OrderError> {
        let order_id = &self.id;
        self.items
            .iter_mut()
            .find(|i| i.id == order_item_id)
            .ok_or_else(|| OrderError::ItemNotFound {
                order_id: order_id.clone(),
                item_id: order_item_id.to_string(),
            })
    }

    fn record(&mut self, event: OrderEvent) {
        self.pending_events.push(event);
    }
}

impl AggregateRoot for Order {
    type Event = OrderEvent;

    const AGGREGATE_TYPE: &'static str = "Order";

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

    fn order_with_items(item_ids: &[&str]) -> Order {
        let mut order = Order::place("o-1", TableNumber::new(5).unwrap()).unwrap();
        for id in item_ids {
            order
                .add_item(
                    id,
                    "m-1",
                    "Burger",
                    Money::new(Decimal::new(999, 2)).unwrap(),
                    Quantity::new(2).unwrap(),
                )
                .unwrap();
        }
        order.take_events();
        order
    }

    fn event_names(order: &mut Order) -> Vec<&'static str> {
        order.take_events().iter().map(|e| e.event_name()).collect()
    }

    #[test]
    fn test_place_and_add_item_record_events_in_order() {
        let mut order = Order::place("o-1", TableNumber::new(5).unwrap()).unwrap();
        order
            .add_item(
                "i-1",
                "m-1",
                "Burger",
                Money::new(Decimal::new(999, 2)).unwrap(),
                Quantity::new(2).unwrap(),
            )
            .unwrap();

        assert_eq!(event_names(&mut order), vec![ORDER_PLACED, ORDER_ITEM_ADDED]);
        assert_eq!(order.status(), OrderStatus::Open);
        assert_eq!(order.items()[0].status, OrderItemStatus::Pending);
    }

    #[test]
    fn test_mark_ready_twice_is_rejected() {
        let mut order = order_with_items(&["i-1"]);
        order.mark_item_ready("i-1").unwrap();
        let err = order.mark_item_ready("i-1").unwrap_err();
        assert!(matches!(err, OrderError::InvalidItemState { action: "mark as ready", .. }));
    }

    #[test]
    fn test_unknown_item_is_reported() {
        let mut order = order_with_items(&["i-1"]);
        assert_eq!(
            order.mark_item_ready("nope"),
            Err(OrderError::ItemNotFound {
                order_id: "o-1".to_string(),
                item_id: "nope".to_string()
            })
        );
    }

    #[test]
    fn test_complete_requires_all_active_items_ready() {
        let mut order = order_with_items(&["i-1", "i-2"]);
        order.mark_item_ready("i-1").unwrap();
        assert_eq!(order.complete(), Err(OrderError::NotFullyReady("o-1".to_string())));

        order.cancel_item("i-2").unwrap();
        order.take_events();
        order.complete().unwrap();
        assert_eq!(order.status(), OrderStatus::Completed);
        assert_eq!(event_names(&mut order), vec![ORDER_COMPLETED]);
    }

    #[test]
    fn test_complete_empty_order_is_rejected() {
        let mut order = order_with_items(&[]);
        assert!(order.complete().is_err());
    }

    #[test]
    fn test_cancelling_last_item_cancels_order() {
        let mut order = order_with_items(&["i-1", "i-2"]);
        order.cancel_item("i-1").unwrap();
        assert_eq!(order.status(), OrderStatus::Open);

        order.cancel_item("i-2").unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(
            event_names(&mut order),
            vec![ORDER_ITEM_CANCELLED, ORDER_ITEM_CANCELLED, ORDER_CANCELLED]
        );
    }

    #[test]
    fn test_cancel_keeps_ready_items() {
        let mut order = order_with_items(&["i-1", "i-2"]);
        order.mark_item_ready("i-1").unwrap();
        order.take_events();

        order.cancel().unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.items()[0].status, OrderItemStatus::Ready);
        assert_eq!(order.items()[1].status, OrderItemStatus::Cancelled);
        assert_eq!(event_names(&mut order), vec![ORDER_ITEM_CANCELLED, ORDER_CANCELLED]);
    }

    #[test]
    fn test_closed_order_rejects_commands() {
        let mut order = order_with_items(&["i-1"]);
        order.cancel().unwrap();

        let err = order.cancel().unwrap_err();
        assert_eq!(
            err,
            OrderError::NotOpen {
                order_id: "o-1".to_string(),
                status: OrderStatus::Cancelled
            }
        );
        assert!(order.mark_item_ready("i-1").is_err());
    }

    #[test]
    fn test_ready_item_cannot_be_cancelled() {
        let mut order = order_with_items(&["i-1"]);
        order.mark_item_ready("i-1").unwrap();
        assert!(matches!(
            order.cancel_item("i-1"),
            Err(OrderError::InvalidItemState { action: "cancel", .. })
        ));
    }
}
