use crate::domain::context::CommandContext;
use crate::domain::errors::CommandError;
use crate::domain::services::verify_items_available;
use crate::domain::value_objects::{Money, Quantity, TableNumber};
use crate::persistence::UnitOfWork;

use super::aggregate::Order;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::value_objects::OrderItemRequest;

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate → Events → Outbox
//
// Placing an order checks menu availability inside the same transaction, so
// the availability read and the order write share one consistent view.
//
// ============================================================================

pub struct OrderCommandHandler {
    context: CommandContext,
}

impl OrderCommandHandler {
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }

    /// Handle a command; returns the number of outbox entries written
    pub async fn handle(&self, command: OrderCommand) -> Result<usize, CommandError> {
        let context = self.context.clone();
        let order_id = command.order_id().to_string();
        let mut uow = context.unit_of_work();

        let staged = uow
            .scoped(move |uow| {
                Box::pin(async move {
                    let mut order = match command {
                        OrderCommand::PlaceOrder {
                            order_id,
                            table_number,
                            items,
                        } => place(&context, uow, &order_id, table_number, items).await?,
                        OrderCommand::MarkItemReady {
                            order_id,
                            order_item_id,
                        } => {
                            let mut order = load(uow, &order_id).await?;
                            order.mark_item_ready(&order_item_id)?;
                            order
                        }
                        OrderCommand::CancelItem {
                            order_id,
                            order_item_id,
                        } => {
                            let mut order = load(uow, &order_id).await?;
                            order.cancel_item(&order_item_id)?;
                            order
                        }
                        OrderCommand::CompleteOrder { order_id } => {
                            let mut order = load(uow, &order_id).await?;
                            order.complete()?;
                            order
                        }
                        OrderCommand::CancelOrder { order_id } => {
                            let mut order = load(uow, &order_id).await?;
                            order.cancel()?;
                            order
                        }
                    };

                    let staged = context.stage_events(uow, &mut order).await?;
                    uow.orders()?.save(order).await;
                    uow.commit().await?;
                    Ok::<_, CommandError>(staged)
                })
            })
            .await?;

        tracing::info!(order_id = %order_id, events = staged, "🧾 Order command handled");
        Ok(staged)
    }
}

async fn place(
    context: &CommandContext,
    uow: &mut UnitOfWork,
    order_id: &str,
    table_number: i64,
    items: Vec<OrderItemRequest>,
) -> Result<Order, CommandError> {
    if items.is_empty() {
        return Err(OrderError::EmptyOrder.into());
    }
    if uow.orders()?.find_by_id(order_id).await.is_some() {
        return Err(CommandError::OrderAlreadyExists(order_id.to_string()));
    }

    let requested: Vec<String> = items.iter().map(|i| i.menu_item_id.clone()).collect();
    let mut menu_items = Vec::with_capacity(requested.len());
    for menu_item_id in &requested {
        if let Some(item) = uow.menu_items()?.find_by_id(menu_item_id).await {
            menu_items.push(item);
        }
    }
    verify_items_available(&requested, &menu_items)?;

    let mut order = Order::place(order_id, TableNumber::new(table_number)?)?;
    for item in items {
        order.add_item(
            &context.next_id(),
            &item.menu_item_id,
            &item.name,
            Money::new(item.unit_price)?,
            Quantity::new(item.quantity)?,
        )?;
    }
    Ok(order)
}

async fn load(uow: &mut UnitOfWork, order_id: &str) -> Result<Order, CommandError> {
    uow.orders()?
        .find_by_id(order_id)
        .await
        .ok_or_else(|| CommandError::OrderNotFound(order_id.to_string()))
}

// ============================================================================
// Unit Tests
// ============================================================================
