use chrono::{DateTime, Utc};

use crate::domain::order::{LinkId, Order, OrderId, Page, PageQuery};

// ============================================================================
// Console Actions - the only way state in the console store changes
// ============================================================================

#[derive(Debug, Clone)]
pub enum ConsoleAction {
    Toggle {
        order_id: OrderId,
        link_id: LinkId,
    },
    SelectAll {
        order_id: OrderId,
        on: bool,
    },
    Clear {
        order_id: OrderId,
    },
    /// A freshly fetched page replaces the snapshot
    ReplacePage(Page<Order>),
    SetPinned {
        order_id: OrderId,
        pinned_at: Option<DateTime<Utc>>,
    },
    /// Page, page size or filter changed; the caller fetches next
    SetQuery(PageQuery),
}

impl ConsoleAction {
    pub fn name(&self) -> &'static str {
        match self {
            ConsoleAction::Toggle { .. } => "Toggle",
            ConsoleAction::SelectAll { .. } => "SelectAll",
            ConsoleAction::Clear { .. } => "Clear",
            ConsoleAction::ReplacePage(_) => "ReplacePage",
            ConsoleAction::SetPinned { .. } => "SetPinned",
            ConsoleAction::SetQuery(_) => "SetQuery",
        }
    }
}
