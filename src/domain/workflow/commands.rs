use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::console::ConsoleAction;
use crate::domain::order::{LinkId, OrderId};
use crate::services::{CreatePurchaseRequest, ShipmentTarget, ShipmentUpdate};

use super::state::{TargetKey, WorkflowKind, WorkflowPhase};

// ============================================================================
// Workflow Commands - represent staff intent
// ============================================================================

/// Form fields of the purchase dialog, as typed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseDraft {
    /// Typed total; `None` uses the aggregated selection total
    pub total: Option<String>,
    pub image: Option<String>,
    pub note: Option<String>,
    pub shipment_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowIntent {
    BatchPurchase {
        order_id: OrderId,
        draft: PurchaseDraft,
    },
    CancelLink {
        order_id: OrderId,
        link_id: LinkId,
    },
    BuyLater {
        order_id: OrderId,
        link_id: LinkId,
    },
    Pin {
        order_id: OrderId,
        pinned: bool,
    },
    UpdateShipment {
        target: ShipmentTarget,
        code: String,
        fee: Option<Decimal>,
    },
}

impl WorkflowIntent {
    pub fn kind(&self) -> WorkflowKind {
        match self {
            WorkflowIntent::BatchPurchase { .. } => WorkflowKind::BatchPurchase,
            WorkflowIntent::CancelLink { .. } => WorkflowKind::CancelLink,
            WorkflowIntent::BuyLater { .. } => WorkflowKind::BuyLater,
            WorkflowIntent::Pin { .. } => WorkflowKind::Pin,
            WorkflowIntent::UpdateShipment { .. } => WorkflowKind::UpdateShipment,
        }
    }

    pub fn target(&self) -> TargetKey {
        match self {
            WorkflowIntent::BatchPurchase { order_id, .. } | WorkflowIntent::Pin { order_id, .. } => {
                TargetKey::Order { order_id: *order_id }
            }
            WorkflowIntent::CancelLink { order_id, link_id } | WorkflowIntent::BuyLater { order_id, link_id } => {
                TargetKey::Link {
                    order_id: *order_id,
                    link_id: *link_id,
                }
            }
            WorkflowIntent::UpdateShipment { target, .. } => match target {
                ShipmentTarget::Purchase { purchase_id } => TargetKey::Purchase {
                    purchase_id: *purchase_id,
                },
                ShipmentTarget::Link { order_id, link_id } => TargetKey::Link {
                    order_id: *order_id,
                    link_id: *link_id,
                },
            },
        }
    }
}

/// Validated body of one network mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MutationPayload {
    Purchase(CreatePurchaseRequest),
    Cancel { order_id: OrderId, link_id: LinkId },
    BuyLater { order_id: OrderId, link_id: LinkId },
    Pin { order_id: OrderId, pinned: bool },
    Shipment(ShipmentUpdate),
}

/// Transient value assembled at submission time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRequest {
    pub request_id: Uuid,
    pub kind: WorkflowKind,
    pub target: TargetKey,
    pub payload: MutationPayload,
    pub phase: WorkflowPhase,
    pub created_at: DateTime<Utc>,
}

impl MutationRequest {
    pub fn new(kind: WorkflowKind, target: TargetKey, payload: MutationPayload) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            kind,
            target,
            payload,
            phase: WorkflowPhase::Validating,
            created_at: Utc::now(),
        }
    }

    pub fn with_phase(mut self, phase: WorkflowPhase) -> Self {
        self.phase = phase;
        self
    }
}

/// Local change shown before the server confirms, with its compensation
#[derive(Debug, Clone)]
pub struct OptimisticPatch {
    pub apply: ConsoleAction,
    pub rollback: ConsoleAction,
}
