use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::sync::Arc;

use super::projector::{Fields, HandlerTable, ProjectionResult, Projector};
use super::read_models::{status, OrderItemReadModel, OrderReadModel, OrderReadModelRepository};
use crate::domain::order::events::*;
use crate::event_sourcing::core::EventData;

// ============================================================================
// Order Projector - Order events → OrderReadModel
// ============================================================================

pub struct OrderProjector {
    orders: Arc<dyn OrderReadModelRepository>,
    handlers: HandlerTable<OrderProjector>,
}

impl OrderProjector {
    pub fn new(orders: Arc<dyn OrderReadModelRepository>) -> Self {
        let handlers = HandlerTable::new("OrderProjector")
            .on(ORDER_PLACED, Self::on_order_placed)
            .on(ORDER_ITEM_ADDED, Self::on_item_added)
            .on(DISH_MARKED_READY, Self::on_dish_ready)
            .on(ORDER_ITEM_CANCELLED, Self::on_item_cancelled)
            .on(ORDER_COMPLETED, Self::on_order_completed)
            .on(ORDER_CANCELLED, Self::on_order_cancelled);

        Self { orders, handlers }
    }

    /// Creation: no-op if the order read model already exists
    fn on_order_placed<'a>(&'a self, data: &'a EventData) -> BoxFuture<'a, ProjectionResult<()>> {
        Box::pin(async move {
            let fields = Fields::new(ORDER_PLACED, data);
            let order_id = fields.string("order_id")?;
            if self.orders.find_by_id(&order_id).await?.is_some() {
                tracing::debug!(order_id = %order_id, "Order read model already exists, skipping");
                return Ok(());
            }

            self.orders
                .save(OrderReadModel {
                    order_id,
                    table_number: fields.u32("table_number")?,
                    status: status::OPEN.to_string(),
                    items: Vec::new(),
                })
                .await
        })
    }

    /// Incremental: no-op if the item is already on the read model
    fn on_item_added<'a>(&'a self, data: &'a EventData) -> BoxFuture<'a, ProjectionResult<()>> {
        Box::pin(async move {
            let fields = Fields::new(ORDER_ITEM_ADDED, data);
            let order_id = fields.string("order_id")?;
            let order_item_id = fields.string("order_item_id")?;

            let Some(mut order) = self.orders.find_by_id(&order_id).await? else {
                tracing::debug!(order_id = %order_id, "Order not projected yet, skipping item");
                return Ok(());
            };
            if order.has_item(&order_item_id) {
                return Ok(());
            }

            let unit_price = fields.decimal("unit_price")?;
            let quantity = fields.u32("quantity")?;
            order.items.push(OrderItemReadModel {
                order_item_id,
                menu_item_id: fields.string("menu_item_id")?,
                name: fields.string("name")?,
                unit_price,
                quantity,
                status: status::ITEM_PENDING.to_string(),
                total_price: unit_price * rust_decimal::Decimal::from(quantity),
            });
            self.orders.save(order).await
        })
    }

    fn on_dish_ready<'a>(&'a self, data: &'a EventData) -> BoxFuture<'a, ProjectionResult<()>> {
        Box::pin(self.set_item_status(DISH_MARKED_READY, data, status::ITEM_READY))
    }

    fn on_item_cancelled<'a>(&'a self, data: &'a EventData) -> BoxFuture<'a, ProjectionResult<()>> {
        Box::pin(self.set_item_status(ORDER_ITEM_CANCELLED, data, status::ITEM_CANCELLED))
    }

    fn on_order_completed<'a>(&'a self, data: &'a EventData) -> BoxFuture<'a, ProjectionResult<()>> {
        Box::pin(self.set_order_status(ORDER_COMPLETED, data, status::COMPLETED))
    }

    fn on_order_cancelled<'a>(&'a self, data: &'a EventData) -> BoxFuture<'a, ProjectionResult<()>> {
        Box::pin(self.set_order_status(ORDER_CANCELLED, data, status::CANCELLED))
    }

    // ========================================================================
    // State transitions: set unconditionally, skip when not projected yet
    // ========================================================================

    async fn set_order_status(
        &self,
        event_type: &'static str,
        data: &EventData,
        new_status: &'static str,
    ) -> ProjectionResult<()> {
        let order_id = Fields::new(event_type, data).string("order_id")?;
        let Some(mut order) = self.orders.find_by_id(&order_id).await? else {
            tracing::debug!(order_id = %order_id, event_type, "Order not projected yet, skipping");
            return Ok(());
        };
        order.status = new_status.to_string();
        self.orders.save(order).await
    }

    async fn set_item_status(
        &self,
        event_type: &'static str,
        data: &EventData,
        new_status: &'static str,
    ) -> ProjectionResult<()> {
        let fields = Fields::new(event_type, data);
        let order_id = fields.string("order_id")?;
        let order_item_id = fields.string("order_item_id")?;

        let Some(mut order) = self.orders.find_by_id(&order_id).await? else {
            tracing::debug!(order_id = %order_id, event_type, "Order not projected yet, skipping");
            return Ok(());
        };
        let Some(item) = order.item_mut(&order_item_id) else {
            tracing::debug!(order_item_id = %order_item_id, event_type, "Item not projected yet, skipping");
            return Ok(());
        };
        item.status = new_status.to_string();
        self.orders.save(order).await
    }
}

#[async_trait]
impl Projector for OrderProjector {
    fn name(&self) -> &'static str {
        "OrderProjector"
    }

    fn handled_event_types(&self) -> Vec<&'static str> {
        self.handlers.event_types()
    }

    async fn project(&self, event_type: &str, event_data: &EventData) -> ProjectionResult<()> {
        self.handlers.dispatch(self, event_type, event_data).await
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
