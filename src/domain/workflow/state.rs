use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::order::{LinkId, OrderId, PurchaseId};
use crate::services::PurchaseReceipt;

use super::commands::MutationRequest;

// ============================================================================
// Workflow State Machine Types
// ============================================================================
//
// Idle -> Validating -> Submitting -> Succeeded | Failed
//
// One state machine instance per (WorkflowKind, TargetKey).
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    BatchPurchase,
    CancelLink,
    BuyLater,
    Pin,
    UpdateShipment,
}

impl WorkflowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowKind::BatchPurchase => "batch_purchase",
            WorkflowKind::CancelLink => "cancel_link",
            WorkflowKind::BuyLater => "buy_later",
            WorkflowKind::Pin => "pin",
            WorkflowKind::UpdateShipment => "update_shipment",
        }
    }

    /// The pin endpoint takes no bearer token; every other mutation does.
    pub fn requires_credential(&self) -> bool {
        !matches!(self, WorkflowKind::Pin)
    }
}

/// The entity a workflow instance is gated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetKey {
    Order { order_id: OrderId },
    Link { order_id: OrderId, link_id: LinkId },
    Purchase { purchase_id: PurchaseId },
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKey::Order { order_id } => write!(f, "order:{}", order_id),
            TargetKey::Link { order_id, link_id } => write!(f, "link:{}/{}", order_id, link_id),
            TargetKey::Purchase { purchase_id } => write!(f, "purchase:{}", purchase_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

impl WorkflowPhase {
    /// Phases during which another submit for the same target is ignored
    pub fn is_busy(&self) -> bool {
        matches!(self, WorkflowPhase::Validating | WorkflowPhase::Submitting)
    }
}

/// A mutation the server accepted
#[derive(Debug, Clone)]
pub struct Completed {
    pub request: MutationRequest,
    pub receipt: Option<PurchaseReceipt>,
    /// Whether the follow-up page refetch landed
    pub refetched: bool,
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Completed(Completed),
    /// Another submission for the same target is still in flight
    AlreadyInFlight,
}

impl SubmitOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SubmitOutcome::Completed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pin_skips_credentials() {
        assert!(!WorkflowKind::Pin.requires_credential());
        assert!(WorkflowKind::BatchPurchase.requires_credential());
        assert!(WorkflowKind::CancelLink.requires_credential());
        assert!(WorkflowKind::BuyLater.requires_credential());
        assert!(WorkflowKind::UpdateShipment.requires_credential());
    }

    #[test]
    fn test_busy_phases() {
        assert!(WorkflowPhase::Validating.is_busy());
        assert!(WorkflowPhase::Submitting.is_busy());
        assert!(!WorkflowPhase::Idle.is_busy());
        assert!(!WorkflowPhase::Succeeded.is_busy());
        assert!(!WorkflowPhase::Failed.is_busy());
    }

    #[test]
    fn test_target_display() {
        let target = TargetKey::Link { order_id: OrderId(3), link_id: LinkId(9) };
        assert_eq!(target.to_string(), "link:3/9");
    }
}
