use rust_decimal::Decimal;

// ============================================================================
// MenuItem Commands
// ============================================================================

#[derive(Debug, Clone)]
pub enum MenuItemCommand {
    CreateMenuItem {
        menu_item_id: String,
        name: String,
        price: Decimal,
    },
    MarkSoldOut {
        menu_item_id: String,
    },
    MarkAvailable {
        menu_item_id: String,
    },
}

impl MenuItemCommand {
    pub fn menu_item_id(&self) -> &str {
        match self {
            MenuItemCommand::CreateMenuItem { menu_item_id, .. }
            | MenuItemCommand::MarkSoldOut { menu_item_id }
            | MenuItemCommand::MarkAvailable { menu_item_id } => menu_item_id,
        }
    }
}
