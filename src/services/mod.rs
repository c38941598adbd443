// ============================================================================
// Collaborators - everything the engine calls but does not implement
// ============================================================================
//
// Transport, authentication storage and the server itself live behind these
// traits. `InMemoryBackend` implements them for the demo binary and tests.
//
// ============================================================================

mod credentials;
mod errors;
mod in_memory;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order::{LinkId, Order, OrderId, OrderLink, Page, PageQuery, PurchaseId};

pub use credentials::{AuthToken, CredentialStore, StaticCredentials};
pub use errors::{ErrorBody, ServiceError, GENERIC_FAILURE_MESSAGE};
pub use in_memory::InMemoryBackend;

// ============================================================================
// Request / Response Shapes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasePayload {
    pub total: Decimal,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_code: Option<String>,
    pub tracking_codes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseRequest {
    pub target_order_code: String,
    pub payload: PurchasePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub purchase_id: PurchaseId,
    pub order_code: String,
    pub total: Decimal,
    pub purchased_links: usize,
}

/// What a shipment code is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ShipmentTarget {
    Purchase { purchase_id: PurchaseId },
    Link { order_id: OrderId, link_id: LinkId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentUpdate {
    pub target: ShipmentTarget,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<Decimal>,
}

// ============================================================================
// Collaborator Traits
// ============================================================================

#[async_trait]
pub trait OrderQueries: Send + Sync {
    async fn fetch_orders(&self, query: &PageQuery) -> Result<Page<Order>, ServiceError>;

    async fn fetch_order(&self, order_id: OrderId) -> Result<Order, ServiceError>;

    async fn fetch_link(&self, order_id: OrderId, link_id: LinkId) -> Result<OrderLink, ServiceError>;
}

#[async_trait]
pub trait MutationGateway: Send + Sync {
    async fn create_purchase(
        &self,
        request: &CreatePurchaseRequest,
        token: &AuthToken,
    ) -> Result<PurchaseReceipt, ServiceError>;

    async fn cancel_link(&self, order_id: OrderId, link_id: LinkId, token: &AuthToken) -> Result<(), ServiceError>;

    async fn mark_buy_later(&self, order_id: OrderId, link_id: LinkId, token: &AuthToken) -> Result<(), ServiceError>;

    async fn set_pinned(&self, order_id: OrderId, pinned: bool) -> Result<(), ServiceError>;

    async fn update_shipment(&self, update: &ShipmentUpdate, token: &AuthToken) -> Result<(), ServiceError>;
}
