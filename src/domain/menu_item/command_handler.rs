use crate::domain::context::CommandContext;
use crate::domain::errors::CommandError;
use crate::domain::value_objects::Money;

use super::aggregate::MenuItem;
use super::commands::MenuItemCommand;

// ============================================================================
// MenuItem Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate → Events → Outbox, in one staged
// transaction committed explicitly at the end.
//
// ============================================================================

pub struct MenuItemCommandHandler {
    context: CommandContext,
}

impl MenuItemCommandHandler {
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }

    /// Handle a command; returns the number of outbox entries written
    pub async fn handle(&self, command: MenuItemCommand) -> Result<usize, CommandError> {
        let context = self.context.clone();
        let menu_item_id = command.menu_item_id().to_string();
        let mut uow = context.unit_of_work();

        let staged = uow
            .scoped(move |uow| {
                Box::pin(async move {
                    let mut item = match command {
                        MenuItemCommand::CreateMenuItem {
                            menu_item_id,
                            name,
                            price,
                        } => {
                            if uow.menu_items()?.find_by_id(&menu_item_id).await.is_some() {
                                return Err(CommandError::MenuItemAlreadyExists(menu_item_id));
                            }
                            MenuItem::create(&menu_item_id, &name, Money::new(price)?)?
                        }
                        MenuItemCommand::MarkSoldOut { menu_item_id } => {
                            let mut item = load(uow, &menu_item_id).await?;
                            item.mark_sold_out();
                            item
                        }
                        MenuItemCommand::MarkAvailable { menu_item_id } => {
                            let mut item = load(uow, &menu_item_id).await?;
                            item.mark_available();
                            item
                        }
                    };

                    let staged = context.stage_events(uow, &mut item).await?;
                    uow.menu_items()?.save(item).await;
                    uow.commit().await?;
                    Ok::<_, CommandError>(staged)
                })
            })
            .await?;

        tracing::info!(
            menu_item_id = %menu_item_id,
            events = staged,
            "🍔 Menu item command handled"
        );
        Ok(staged)
    }
}

async fn load(
    uow: &mut crate::persistence::UnitOfWork,
    menu_item_id: &str,
) -> Result<MenuItem, CommandError> {
    uow.menu_items()?
        .find_by_id(menu_item_id)
        .await
        .ok_or_else(|| CommandError::MenuItemNotFound(menu_item_id.to_string()))
}

// ============================================================================
// Unit Tests
// ============================================================================
