use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::value_objects::{LinkId, LinkStatus, OrderId, OrderStatus, OrderType};

// ============================================================================
// Order Snapshot - server-owned, read-only on the client
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub order_code: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    #[serde(default)]
    pub final_price_order: Option<Decimal>,
    #[serde(default)]
    pub pinned_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "orderLinks")]
    pub links: Vec<OrderLink>,
}

impl Order {
    pub fn link(&self, link_id: LinkId) -> Option<&OrderLink> {
        self.links.iter().find(|link| link.link_id == link_id)
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned_at.is_some()
    }
}

/// A single product line item within an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLink {
    pub link_id: LinkId,
    #[serde(default)]
    pub tracking_code: String,
    pub product_name: String,
    pub status: LinkStatus,
    #[serde(default)]
    pub price_web: Option<Decimal>,
    #[serde(default)]
    pub ship_web: Option<Decimal>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub final_price_vnd: Option<i64>,
    #[serde(default)]
    pub shipment_code: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_deserializes_from_server_payload() {
        let json = r#"{
            "orderId": 10,
            "orderCode": "ORD-10",
            "orderType": "AUCTION",
            "status": "WAITING_PURCHASE",
            "finalPriceOrder": "1250.50",
            "pinnedAt": null,
            "orderLinks": [
                {
                    "linkId": 1,
                    "trackingCode": "TRK-1",
                    "productName": "Camera lens",
                    "status": "PENDING_PURCHASE",
                    "priceWeb": 100,
                    "quantity": 2
                },
                {
                    "linkId": 2,
                    "productName": "Strap",
                    "status": "CANCELLED"
                }
            ]
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.order_id, OrderId(10));
        assert_eq!(order.order_type, OrderType::Auction);
        assert_eq!(order.links.len(), 2);
        assert_eq!(order.links[0].price_web, Some(Decimal::from(100)));
        assert_eq!(order.links[0].quantity, 2);
        assert_eq!(order.links[1].tracking_code, "");
        assert_eq!(order.links[1].price_web, None);
        assert_eq!(order.links[1].quantity, 1);
        assert!(!order.is_pinned());
    }

    #[test]
    fn test_link_lookup() {
        let order = Order {
            order_id: OrderId(1),
            order_code: "ORD-1".to_string(),
            order_type: OrderType::ProxyPurchase,
            status: OrderStatus::Purchasing,
            final_price_order: None,
            pinned_at: None,
            links: vec![OrderLink {
                link_id: LinkId(5),
                tracking_code: "TRK-5".to_string(),
                product_name: "Shoes".to_string(),
                status: LinkStatus::Purchasing,
                price_web: None,
                ship_web: None,
                quantity: 1,
                final_price_vnd: None,
                shipment_code: None,
            }],
        };

        assert!(order.link(LinkId(5)).is_some());
        assert!(order.link(LinkId(6)).is_none());
    }
}
