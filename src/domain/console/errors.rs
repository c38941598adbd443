use crate::domain::order::{LinkId, LinkStatus, OrderId};

// ============================================================================
// Selection Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    #[error("Order {0} is not on the current page")]
    UnknownOrder(OrderId),

    #[error("Link {link_id} does not belong to order {order_id}")]
    UnknownLink { order_id: OrderId, link_id: LinkId },

    #[error("Link {link_id} cannot be selected in status {status:?}")]
    Ineligible { link_id: LinkId, status: LinkStatus },
}
