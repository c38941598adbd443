use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::order::{Order, OrderId, OrderLink};

use super::eligibility::SelectionPolicy;
use super::store::SelectionStore;

// ============================================================================
// Aggregation Engine
// ============================================================================
//
// Totals are recomputed on every call. They feed submission validation, so
// nothing here is memoized across selection changes.
//
// ============================================================================

/// Which money field of a link a workflow sums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    PriceWeb,
    ShipWeb,
    /// price_web * quantity + ship_web
    LineTotal,
    FinalPriceVnd,
}

impl PriceField {
    /// Amount contributed by `link`; missing fields count as zero
    pub fn amount(&self, link: &OrderLink) -> Decimal {
        match self {
            PriceField::PriceWeb => link.price_web.unwrap_or_default(),
            PriceField::ShipWeb => link.ship_web.unwrap_or_default(),
            PriceField::LineTotal => {
                link.price_web.unwrap_or_default() * Decimal::from(link.quantity)
                    + link.ship_web.unwrap_or_default()
            }
            PriceField::FinalPriceVnd => link.final_price_vnd.map(Decimal::from).unwrap_or_default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::PriceWeb => "price_web",
            PriceField::ShipWeb => "ship_web",
            PriceField::LineTotal => "line_total",
            PriceField::FinalPriceVnd => "final_price_vnd",
        }
    }
}

impl FromStr for PriceField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price_web" => Ok(PriceField::PriceWeb),
            "ship_web" => Ok(PriceField::ShipWeb),
            "line_total" => Ok(PriceField::LineTotal),
            "final_price_vnd" => Ok(PriceField::FinalPriceVnd),
            other => Err(format!("unknown price field: {}", other)),
        }
    }
}

/// Sum of `field` over exactly the selected links of `order_id`
pub fn total(selection: &SelectionStore, order_id: OrderId, links: &[OrderLink], field: PriceField) -> Decimal {
    let Some(entry) = selection.entry(order_id) else {
        return Decimal::ZERO;
    };

    links
        .iter()
        .filter(|link| entry.contains_key(&link.link_id))
        .map(|link| field.amount(link))
        .sum()
}

/// Sum of per-order totals over every order on the current page
pub fn grand_total(selection: &SelectionStore, orders: &[Order], field: PriceField) -> Decimal {
    orders
        .iter()
        .map(|order| total(selection, order.order_id, &order.links, field))
        .sum()
}

/// Display-oriented view of one order's selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionSummary {
    pub order_id: OrderId,
    pub selected: usize,
    pub eligible: usize,
    pub total: Decimal,
    pub all_selected: bool,
}

pub fn summary(selection: &SelectionStore, order: &Order, policy: &SelectionPolicy) -> SelectionSummary {
    SelectionSummary {
        order_id: order.order_id,
        selected: selection.count(order.order_id),
        eligible: order.links.iter().filter(|link| policy.is_eligible(link)).count(),
        total: total(selection, order.order_id, &order.links, policy.price),
        all_selected: selection.is_all_selected(order),
    }
}
