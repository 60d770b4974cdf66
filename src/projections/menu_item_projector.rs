use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::sync::Arc;

use super::projector::{Fields, HandlerTable, ProjectionResult, Projector};
use super::read_models::{MenuItemReadModel, MenuItemReadModelRepository};
use crate::domain::menu_item::events::*;
use crate::event_sourcing::core::EventData;

// ============================================================================
// MenuItem Projector - MenuItem events → MenuItemReadModel
// ============================================================================

pub struct MenuItemProjector {
    menu_items: Arc<dyn MenuItemReadModelRepository>,
    handlers: HandlerTable<MenuItemProjector>,
}

impl MenuItemProjector {
    pub fn new(menu_items: Arc<dyn MenuItemReadModelRepository>) -> Self {
        let handlers = HandlerTable::new("MenuItemProjector")
            .on(MENU_ITEM_CREATED, Self::on_created)
            .on(MENU_ITEM_SOLD_OUT, Self::on_sold_out)
            .on(MENU_ITEM_AVAILABLE, Self::on_available);

        Self {
            menu_items,
            handlers,
        }
    }

    fn on_created<'a>(&'a self, data: &'a EventData) -> BoxFuture<'a, ProjectionResult<()>> {
        Box::pin(async move {
            let fields = Fields::new(MENU_ITEM_CREATED, data);
            let menu_item_id = fields.string("menu_item_id")?;
            if self.menu_items.find_by_id(&menu_item_id).await?.is_some() {
                tracing::debug!(menu_item_id = %menu_item_id, "Menu item read model already exists, skipping");
                return Ok(());
            }

            self.menu_items
                .save(MenuItemReadModel {
                    menu_item_id,
                    name: fields.string("name")?,
                    price: fields.decimal("price")?,
                    available: true,
                })
                .await
        })
    }

    fn on_sold_out<'a>(&'a self, data: &'a EventData) -> BoxFuture<'a, ProjectionResult<()>> {
        Box::pin(self.set_available(MENU_ITEM_SOLD_OUT, data, false))
    }

    fn on_available<'a>(&'a self, data: &'a EventData) -> BoxFuture<'a, ProjectionResult<()>> {
        Box::pin(self.set_available(MENU_ITEM_AVAILABLE, data, true))
    }

    async fn set_available(
        &self,
        event_type: &'static str,
        data: &EventData,
        available: bool,
    ) -> ProjectionResult<()> {
        let menu_item_id = Fields::new(event_type, data).string("menu_item_id")?;
        let Some(mut item) = self.menu_items.find_by_id(&menu_item_id).await? else {
            tracing::debug!(menu_item_id = %menu_item_id, event_type, "Menu item not projected yet, skipping");
            return Ok(());
        };
        item.available = available;
        self.menu_items.save(item).await
    }
}

#[async_trait]
impl Projector for MenuItemProjector {
    fn name(&self) -> &'static str {
        "MenuItemProjector"
    }

    fn handled_event_types(&self) -> Vec<&'static str> {
        self.handlers.event_types()
    }

    async fn project(&self, event_type: &str, event_data: &EventData) -> ProjectionResult<()> {
        self.handlers.dispatch(self, event_type, event_data).await
    }
}
