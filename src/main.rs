use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tabb::clock::SystemClock;
use tabb::config::OutboxConfig;
use tabb::domain::menu_item::{MenuItemCommand, MenuItemCommandHandler};
use tabb::domain::order::{OrderCommand, OrderCommandHandler, OrderItemRequest};
use tabb::domain::CommandContext;
use tabb::ids::UuidIdGenerator;
use tabb::metrics::OutboxMetrics;
use tabb::outbox::{InMemoryOutboxRepository, OutboxProcessor, OutboxRepository, OutboxWorker};
use tabb::persistence::CommittedStores;
use tabb::projections::{
    GetAvailableMenuItemsHandler, GetOrderHandler, InMemoryMenuItemReadModelRepository,
    InMemoryOrderReadModelRepository, MenuItemProjector, OrderProjector, Projector,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO, overridable with RUST_LOG
    // Example: RUST_LOG=tabb=trace cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tabb=debug")),
        )
        .init();

    tracing::info!("🚀 Starting tabb outbox pipeline demo");

    // === 1. Configuration ===
    let config = OutboxConfig::from_env()?;
    tracing::info!(
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        batch_size = config.batch_size,
        max_retries = config.retry_policy.max_retries(),
        "Loaded outbox configuration"
    );

    // === 2. Committed stores and command side ===
    let stores = CommittedStores::new();
    let clock = Arc::new(SystemClock);
    let context = CommandContext::new(stores.clone(), Arc::new(UuidIdGenerator), clock.clone())
        .with_retry_policy(config.retry_policy);
    let menu_commands = MenuItemCommandHandler::new(context.clone());
    let order_commands = OrderCommandHandler::new(context);

    // === 3. Read models, projectors and the outbox processor ===
    let menu_read_models = Arc::new(InMemoryMenuItemReadModelRepository::new());
    let order_read_models = Arc::new(InMemoryOrderReadModelRepository::new());
    let projectors: Vec<Arc<dyn Projector>> = vec![
        Arc::new(MenuItemProjector::new(menu_read_models.clone())),
        Arc::new(OrderProjector::new(order_read_models.clone())),
    ];

    let metrics = Arc::new(OutboxMetrics::new()?);
    let outbox: Arc<dyn OutboxRepository> =
        Arc::new(InMemoryOutboxRepository::new(stores.outbox.clone(), clock));
    let processor = Arc::new(
        OutboxProcessor::new(outbox.clone(), projectors)?
            .with_batch_size(config.batch_size)
            .with_metrics(metrics.clone()),
    );

    // === 4. Background worker ===
    let worker = OutboxWorker::new(processor, config.poll_interval).with_metrics(metrics.clone());
    worker.start().await;

    // === 5. Drive a few commands ===
    menu_commands
        .handle(MenuItemCommand::CreateMenuItem {
            menu_item_id: "m-1".to_string(),
            name: "Burger".to_string(),
            price: Decimal::new(999, 2),
        })
        .await?;

    order_commands
        .handle(OrderCommand::PlaceOrder {
            order_id: "o-1".to_string(),
            table_number: 5,
            items: vec![OrderItemRequest {
                menu_item_id: "m-1".to_string(),
                name: "Burger".to_string(),
                unit_price: Decimal::new(999, 2),
                quantity: 2,
            }],
        })
        .await?;

    let get_order = GetOrderHandler::new(order_read_models);
    match get_order.handle("o-1").await {
        Ok(order) => tracing::info!(status = %order.status, "Order already projected"),
        Err(e) => tracing::info!(error = %e, "⏳ Order not projected yet (eventual consistency)"),
    }

    // === 6. Let the worker catch up ===
    tokio::time::sleep(config.poll_interval + Duration::from_millis(200)).await;

    let order = get_order.handle("o-1").await?;
    tracing::info!(
        order_id = %order.order_id,
        table = order.table_number,
        status = %order.status,
        items = order.items.len(),
        "📖 Order read model"
    );

    let menu = GetAvailableMenuItemsHandler::new(menu_read_models).handle().await?;
    for item in &menu {
        tracing::info!(menu_item_id = %item.menu_item_id, name = %item.name, price = %item.price, "📖 Available menu item");
    }

    let stats = outbox.stats().await?;
    tracing::info!(
        total = stats.total,
        dead_lettered = stats.dead_lettered_by_event_type.len(),
        "📊 Outbox statistics"
    );
    tracing::debug!("Metrics:\n{}", metrics.render()?);

    // === 7. Graceful shutdown ===
    worker.stop().await;
    tracing::info!("👋 Shutdown complete");

    Ok(())
}
