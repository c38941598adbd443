use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::order::{LinkId, LinkStatus, Order, OrderId, OrderLink, Page, PageQuery, PurchaseId};

use super::{
    AuthToken, CreatePurchaseRequest, MutationGateway, OrderQueries, PurchaseReceipt, ServiceError,
    ShipmentTarget, ShipmentUpdate,
};

// ============================================================================
// In-Memory Backend
// ============================================================================
//
// Plays the server for the demo binary and the workflow tests: paging and
// filtering over a seeded order list, the status transitions each mutation
// causes, token checks, optional latency and one-shot fault injection.
//
// ============================================================================

struct RecordedPurchase {
    request: CreatePurchaseRequest,
    shipment_code: Option<String>,
    fee: Option<rust_decimal::Decimal>,
}

struct BackendState {
    orders: Vec<Order>,
    purchases: HashMap<PurchaseId, RecordedPurchase>,
    next_purchase_id: i64,
    fail_next: Option<ServiceError>,
}

pub struct InMemoryBackend {
    state: Mutex<BackendState>,
    accepted_token: Option<AuthToken>,
    latency: Duration,
    mutation_calls: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new(orders: Vec<Order>) -> Self {
        Self {
            state: Mutex::new(BackendState {
                orders,
                purchases: HashMap::new(),
                next_purchase_id: 1,
                fail_next: None,
            }),
            accepted_token: None,
            latency: Duration::ZERO,
            mutation_calls: AtomicUsize::new(0),
        }
    }

    /// Only accept this token on authenticated mutations
    pub fn with_accepted_token(mut self, token: AuthToken) -> Self {
        self.accepted_token = Some(token);
        self
    }

    /// Delay every mutation by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The next mutation fails with `error` instead of applying
    pub async fn fail_next(&self, error: ServiceError) {
        self.state.lock().await.fail_next = Some(error);
    }

    pub fn mutation_calls(&self) -> usize {
        self.mutation_calls.load(Ordering::SeqCst)
    }

    pub async fn purchase_count(&self) -> usize {
        self.state.lock().await.purchases.len()
    }

    pub async fn purchase_shipment(&self, purchase_id: PurchaseId) -> Option<(Option<String>, Option<rust_decimal::Decimal>)> {
        self.state
            .lock()
            .await
            .purchases
            .get(&purchase_id)
            .map(|recorded| (recorded.shipment_code.clone(), recorded.fee))
    }

    pub async fn purchase_request(&self, purchase_id: PurchaseId) -> Option<CreatePurchaseRequest> {
        self.state
            .lock()
            .await
            .purchases
            .get(&purchase_id)
            .map(|recorded| recorded.request.clone())
    }

    /// Change a link behind the console's back, as another staff member would
    pub async fn set_link_status(&self, order_id: OrderId, link_id: LinkId, status: LinkStatus) {
        let mut state = self.state.lock().await;
        if let Some(link) = find_link_mut(&mut state.orders, order_id, link_id) {
            link.status = status;
        }
    }

    pub async fn remove_order(&self, order_id: OrderId) {
        self.state.lock().await.orders.retain(|order| order.order_id != order_id);
    }

    /// Shared preamble of every mutation: count, wait, check auth, take injected fault
    async fn begin_mutation(&self, token: Option<&AuthToken>) -> Result<(), ServiceError> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let (Some(accepted), Some(token)) = (&self.accepted_token, token) {
            if accepted != token {
                return Err(ServiceError::Unauthorized);
            }
        }

        match self.state.lock().await.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn find_link_mut(orders: &mut [Order], order_id: OrderId, link_id: LinkId) -> Option<&mut OrderLink> {
    orders
        .iter_mut()
        .find(|order| order.order_id == order_id)?
        .links
        .iter_mut()
        .find(|link| link.link_id == link_id)
}

fn transition_link(
    orders: &mut [Order],
    order_id: OrderId,
    link_id: LinkId,
    status: LinkStatus,
) -> Result<(), ServiceError> {
    let link = find_link_mut(orders, order_id, link_id)
        .ok_or_else(|| ServiceError::NotFound(format!("link {} of order {}", link_id, order_id)))?;

    if link.status.is_terminal() {
        return Err(ServiceError::rejected(
            409,
            json!({"message": format!("Link {} is already {:?}", link_id, link.status)}),
        ));
    }

    link.status = status;
    Ok(())
}

#[async_trait]
impl OrderQueries for InMemoryBackend {
    async fn fetch_orders(&self, query: &PageQuery) -> Result<Page<Order>, ServiceError> {
        let state = self.state.lock().await;

        let mut matching: Vec<Order> = state
            .orders
            .iter()
            .filter(|order| query.order_type.map_or(true, |t| order.order_type == t))
            .filter(|order| query.status.map_or(true, |s| order.status == s))
            .cloned()
            .collect();

        // Pinned orders first, most recently pinned on top
        matching.sort_by(|a, b| b.pinned_at.cmp(&a.pinned_at));

        Ok(Page::from_slice(&matching, query))
    }

    async fn fetch_order(&self, order_id: OrderId) -> Result<Order, ServiceError> {
        self.state
            .lock()
            .await
            .orders
            .iter()
            .find(|order| order.order_id == order_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))
    }

    async fn fetch_link(&self, order_id: OrderId, link_id: LinkId) -> Result<OrderLink, ServiceError> {
        let order = self.fetch_order(order_id).await?;
        order
            .link(link_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("link {} of order {}", link_id, order_id)))
    }
}

#[async_trait]
impl MutationGateway for InMemoryBackend {
    async fn create_purchase(
        &self,
        request: &CreatePurchaseRequest,
        token: &AuthToken,
    ) -> Result<PurchaseReceipt, ServiceError> {
        self.begin_mutation(Some(token)).await?;
        let mut state = self.state.lock().await;

        let order = state
            .orders
            .iter_mut()
            .find(|order| order.order_code == request.target_order_code)
            .ok_or_else(|| {
                ServiceError::rejected(404, json!({"message": format!("Order {} not found", request.target_order_code)}))
            })?;

        for code in &request.payload.tracking_codes {
            let open = order
                .links
                .iter()
                .any(|link| &link.tracking_code == code && !link.status.is_terminal());
            if !open {
                return Err(ServiceError::rejected(
                    400,
                    json!({"error": format!("Tracking code {} cannot be purchased", code)}),
                ));
            }
        }

        let mut purchased_links = 0;
        for link in order.links.iter_mut() {
            if request.payload.tracking_codes.contains(&link.tracking_code) {
                link.status = LinkStatus::Purchased;
                link.shipment_code = request.payload.shipment_code.clone();
                purchased_links += 1;
            }
        }
        let order_code = order.order_code.clone();

        let purchase_id = PurchaseId(state.next_purchase_id);
        state.next_purchase_id += 1;
        state.purchases.insert(
            purchase_id,
            RecordedPurchase {
                request: request.clone(),
                shipment_code: request.payload.shipment_code.clone(),
                fee: None,
            },
        );

        tracing::debug!(
            purchase_id = %purchase_id,
            order_code = %order_code,
            purchased_links,
            "Recorded purchase"
        );

        Ok(PurchaseReceipt {
            purchase_id,
            order_code,
            total: request.payload.total,
            purchased_links,
        })
    }

    async fn cancel_link(&self, order_id: OrderId, link_id: LinkId, token: &AuthToken) -> Result<(), ServiceError> {
        self.begin_mutation(Some(token)).await?;
        let mut state = self.state.lock().await;
        transition_link(&mut state.orders, order_id, link_id, LinkStatus::Cancelled)
    }

    async fn mark_buy_later(&self, order_id: OrderId, link_id: LinkId, token: &AuthToken) -> Result<(), ServiceError> {
        self.begin_mutation(Some(token)).await?;
        let mut state = self.state.lock().await;
        transition_link(&mut state.orders, order_id, link_id, LinkStatus::BuyLater)
    }

    async fn set_pinned(&self, order_id: OrderId, pinned: bool) -> Result<(), ServiceError> {
        self.begin_mutation(None).await?;
        let mut state = self.state.lock().await;

        let order = state
            .orders
            .iter_mut()
            .find(|order| order.order_id == order_id)
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;
        order.pinned_at = pinned.then(Utc::now);
        Ok(())
    }

    async fn update_shipment(&self, update: &ShipmentUpdate, token: &AuthToken) -> Result<(), ServiceError> {
        self.begin_mutation(Some(token)).await?;
        let mut state = self.state.lock().await;

        match update.target {
            ShipmentTarget::Purchase { purchase_id } => {
                let recorded = state
                    .purchases
                    .get_mut(&purchase_id)
                    .ok_or_else(|| ServiceError::NotFound(format!("purchase {}", purchase_id)))?;
                recorded.shipment_code = Some(update.code.clone());
                recorded.fee = update.fee;
            }
            ShipmentTarget::Link { order_id, link_id } => {
                let link = find_link_mut(&mut state.orders, order_id, link_id)
                    .ok_or_else(|| ServiceError::NotFound(format!("link {} of order {}", link_id, order_id)))?;
                link.shipment_code = Some(update.code.clone());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderType;
    use crate::domain::selection::store::tests::{link, order};

    fn backend() -> InMemoryBackend {
        let mut shipping = order(2, vec![link(20, LinkStatus::PendingPurchase, Some(5))]);
        shipping.order_type = OrderType::Shipping;

        InMemoryBackend::new(vec![
            order(
                1,
                vec![
                    link(10, LinkStatus::PendingPurchase, Some(100)),
                    link(11, LinkStatus::PendingPurchase, Some(250)),
                ],
            ),
            shipping,
        ])
        .with_accepted_token(AuthToken::new("good"))
    }

    #[tokio::test]
    async fn test_fetch_orders_filters_by_type() {
        let backend = backend();
        let page = backend
            .fetch_orders(&PageQuery::new(10).with_order_type(OrderType::Shipping))
            .await
            .unwrap();

        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].order_id, OrderId(2));
    }

    #[tokio::test]
    async fn test_pinned_orders_listed_first() {
        let backend = backend();
        backend.set_pinned(OrderId(2), true).await.unwrap();

        let page = backend.fetch_orders(&PageQuery::new(10)).await.unwrap();
        assert_eq!(page.content[0].order_id, OrderId(2));
        assert!(page.content[0].is_pinned());
    }

    #[tokio::test]
    async fn test_create_purchase_marks_links_purchased() {
        let backend = backend();
        let request = CreatePurchaseRequest {
            target_order_code: "ORD-1".to_string(),
            payload: crate::services::PurchasePayload {
                total: rust_decimal::Decimal::from(350),
                image: "receipt.jpg".to_string(),
                note: None,
                shipment_code: Some("SHIP-1".to_string()),
                tracking_codes: vec!["TRK-10".to_string(), "TRK-11".to_string()],
            },
        };

        let receipt = backend.create_purchase(&request, &AuthToken::new("good")).await.unwrap();
        assert_eq!(receipt.purchased_links, 2);

        let link = backend.fetch_link(OrderId(1), LinkId(10)).await.unwrap();
        assert_eq!(link.status, LinkStatus::Purchased);
        assert_eq!(link.shipment_code.as_deref(), Some("SHIP-1"));
        assert_eq!(backend.purchase_count().await, 1);
    }

    #[tokio::test]
    async fn test_wrong_token_is_unauthorized() {
        let backend = backend();
        let result = backend.cancel_link(OrderId(1), LinkId(10), &AuthToken::new("stale")).await;

        assert_eq!(result, Err(ServiceError::Unauthorized));
        assert_eq!(backend.mutation_calls(), 1);
    }

    #[tokio::test]
    async fn test_cancel_terminal_link_is_rejected() {
        let backend = backend();
        let token = AuthToken::new("good");
        backend.cancel_link(OrderId(1), LinkId(10), &token).await.unwrap();

        let result = backend.cancel_link(OrderId(1), LinkId(10), &token).await;
        assert!(matches!(result, Err(ServiceError::Rejected { status: 409, .. })));
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let backend = backend();
        backend.fail_next(ServiceError::Transport("connection reset".to_string())).await;

        assert!(backend.set_pinned(OrderId(1), true).await.is_err());
        assert!(backend.set_pinned(OrderId(1), true).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_shipment_on_link() {
        let backend = backend();
        let update = ShipmentUpdate {
            target: ShipmentTarget::Link { order_id: OrderId(1), link_id: LinkId(11) },
            code: "FL-2201".to_string(),
            fee: None,
        };

        backend.update_shipment(&update, &AuthToken::new("good")).await.unwrap();
        let link = backend.fetch_link(OrderId(1), LinkId(11)).await.unwrap();
        assert_eq!(link.shipment_code.as_deref(), Some("FL-2201"));
    }
}
