use super::value_objects::OrderItemRequest;

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    PlaceOrder {
        order_id: String,
        table_number: i64,
        items: Vec<OrderItemRequest>,
    },
    MarkItemReady {
        order_id: String,
        order_item_id: String,
    },
    CancelItem {
        order_id: String,
        order_item_id: String,
    },
    CompleteOrder {
        order_id: String,
    },
    CancelOrder {
        order_id: String,
    },
}

impl OrderCommand {
    pub fn order_id(&self) -> &str {
        match self {
            OrderCommand::PlaceOrder { order_id, .. }
            | OrderCommand::MarkItemReady { order_id, .. }
            | OrderCommand::CancelItem { order_id, .. }
            | OrderCommand::CompleteOrder { order_id }
            | OrderCommand::CancelOrder { order_id } => order_id,
        }
    }
}
