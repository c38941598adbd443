use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Server-assigned order identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

/// Server-assigned line item identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub i64);

/// Identity of a recorded purchase batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseId(pub i64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    ProxyPurchase,
    Shipping,
    Auction,
    Consignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    WaitingPurchase,
    Purchasing,
    Purchased,
    InWarehouse,
    Shipping,
    Delivered,
    Cancelled,
}

/// Line item status as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkStatus {
    PendingPurchase,
    Purchasing,
    Purchased,
    BuyLater,
    Cancelled,
    CancelledDuplicate,
    AwaitingWarehouse,
    InWarehouse,
    Shipping,
    Delivered,
}

impl LinkStatus {
    /// Statuses that permanently exclude a link from selection.
    pub const TERMINAL: [LinkStatus; 3] = [
        LinkStatus::Purchased,
        LinkStatus::Cancelled,
        LinkStatus::CancelledDuplicate,
    ];

    pub fn is_terminal(&self) -> bool {
        Self::TERMINAL.contains(self)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(LinkStatus::Purchased.is_terminal());
        assert!(LinkStatus::Cancelled.is_terminal());
        assert!(LinkStatus::CancelledDuplicate.is_terminal());
    }

    #[test]
    fn test_non_terminal_statuses() {
        let statuses = vec![
            LinkStatus::PendingPurchase,
            LinkStatus::Purchasing,
            LinkStatus::BuyLater,
            LinkStatus::AwaitingWarehouse,
            LinkStatus::InWarehouse,
            LinkStatus::Shipping,
            LinkStatus::Delivered,
        ];

        for status in statuses {
            assert!(!status.is_terminal(), "{:?} should not be terminal", status);
        }
    }

    #[test]
    fn test_link_status_wire_format() {
        let json = serde_json::to_string(&LinkStatus::CancelledDuplicate).unwrap();
        assert_eq!(json, "\"CANCELLED_DUPLICATE\"");

        let status: LinkStatus = serde_json::from_str("\"PENDING_PURCHASE\"").unwrap();
        assert_eq!(status, LinkStatus::PendingPurchase);
    }

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        assert_eq!(serde_json::to_string(&OrderId(42)).unwrap(), "42");
        let link: LinkId = serde_json::from_str("7").unwrap();
        assert_eq!(link, LinkId(7));
    }
}
