use std::collections::BTreeMap;

use crate::domain::order::{LinkId, Order, OrderId};

use super::eligibility::{is_eligible, EligibilityFn};

// ============================================================================
// Selection Store
// ============================================================================
//
// orderId -> (linkId -> trackingCode)
//
// The store trusts its callers on eligibility for single toggles; the console
// store checks the current snapshot before forwarding a toggle, and the list
// synchronizer prunes anything that stops being eligible.
//
// An order key is never kept with an empty link map.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct SelectionStore {
    entries: BTreeMap<OrderId, BTreeMap<LinkId, String>>,
    eligible: EligibilityFn,
}

impl SelectionStore {
    pub fn new(eligible: EligibilityFn) -> Self {
        Self {
            entries: BTreeMap::new(),
            eligible,
        }
    }

    /// Insert the pair if absent, remove it if present.
    /// Returns whether the link is selected afterwards.
    pub fn toggle(&mut self, order_id: OrderId, link_id: LinkId, tracking_code: impl Into<String>) -> bool {
        let entry = self.entries.entry(order_id).or_default();

        let selected = if entry.remove(&link_id).is_some() {
            false
        } else {
            entry.insert(link_id, tracking_code.into());
            true
        };

        if entry.is_empty() {
            self.entries.remove(&order_id);
        }

        selected
    }

    /// Reset the order's entry to exactly its eligible links (`on`), or drop it.
    pub fn select_all(&mut self, order: &Order, on: bool) {
        if !on {
            self.entries.remove(&order.order_id);
            return;
        }

        let selected: BTreeMap<LinkId, String> = order
            .links
            .iter()
            .filter(|link| (self.eligible)(link))
            .map(|link| (link.link_id, link.tracking_code.clone()))
            .collect();

        if selected.is_empty() {
            self.entries.remove(&order.order_id);
        } else {
            self.entries.insert(order.order_id, selected);
        }
    }

    pub fn clear(&mut self, order_id: OrderId) -> bool {
        self.entries.remove(&order_id).is_some()
    }

    pub fn count(&self, order_id: OrderId) -> usize {
        self.entries.get(&order_id).map_or(0, BTreeMap::len)
    }

    pub fn contains(&self, order_id: OrderId, link_id: LinkId) -> bool {
        self.entries
            .get(&order_id)
            .is_some_and(|links| links.contains_key(&link_id))
    }

    /// True iff every eligible link of `order` is selected. Orders without
    /// eligible links are never "all selected".
    pub fn is_all_selected(&self, order: &Order) -> bool {
        let mut eligible = order.links.iter().filter(|link| (self.eligible)(link)).peekable();
        if eligible.peek().is_none() {
            return false;
        }

        eligible.all(|link| self.contains(order.order_id, link.link_id))
    }

    pub fn selected_ids(&self, order_id: OrderId) -> Vec<LinkId> {
        self.entries
            .get(&order_id)
            .map(|links| links.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Tracking codes of the order's selected links, ordered by link id
    pub fn tracking_codes(&self, order_id: OrderId) -> Vec<String> {
        self.entries
            .get(&order_id)
            .map(|links| links.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn entry(&self, order_id: OrderId) -> Option<&BTreeMap<LinkId, String>> {
        self.entries.get(&order_id)
    }

    pub fn order_ids(&self) -> Vec<OrderId> {
        self.entries.keys().copied().collect()
    }

    pub fn total_selected(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn replace_entry(&mut self, order_id: OrderId, links: BTreeMap<LinkId, String>) {
        if links.is_empty() {
            self.entries.remove(&order_id);
        } else {
            self.entries.insert(order_id, links);
        }
    }
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new(is_eligible)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::order::{LinkStatus, OrderLink, OrderStatus, OrderType};
    use rust_decimal::Decimal;

    pub(crate) fn link(id: i64, status: LinkStatus, price_web: Option<i64>) -> OrderLink {
        OrderLink {
            link_id: LinkId(id),
            tracking_code: format!("TRK-{}", id),
            product_name: format!("Product {}", id),
            status,
            price_web: price_web.map(Decimal::from),
            ship_web: None,
            quantity: 1,
            final_price_vnd: None,
            shipment_code: None,
        }
    }

    pub(crate) fn order(id: i64, links: Vec<OrderLink>) -> Order {
        Order {
            order_id: OrderId(id),
            order_code: format!("ORD-{}", id),
            order_type: OrderType::Auction,
            status: OrderStatus::WaitingPurchase,
            final_price_order: None,
            pinned_at: None,
            links,
        }
    }

    fn sample_order() -> Order {
        order(
            1,
            vec![
                link(1, LinkStatus::PendingPurchase, Some(100)),
                link(2, LinkStatus::PendingPurchase, Some(250)),
                link(3, LinkStatus::Purchased, Some(999)),
            ],
        )
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut store = SelectionStore::default();
        store.toggle(OrderId(1), LinkId(2), "TRK-2");
        let before = store.entries.clone();

        assert!(store.toggle(OrderId(1), LinkId(1), "TRK-1"));
        assert!(!store.toggle(OrderId(1), LinkId(1), "TRK-1"));

        assert_eq!(store.entries, before);
    }

    #[test]
    fn test_toggle_removes_empty_order_entry() {
        let mut store = SelectionStore::default();
        store.toggle(OrderId(1), LinkId(1), "TRK-1");
        store.toggle(OrderId(1), LinkId(1), "TRK-1");

        assert!(store.is_empty());
        assert!(store.entry(OrderId(1)).is_none());
    }

    #[test]
    fn test_select_all_is_a_reset_not_additive() {
        let order = sample_order();
        let mut store = SelectionStore::default();

        store.select_all(&order, true);
        let first = store.selected_ids(OrderId(1));

        store.toggle(OrderId(1), LinkId(1), "TRK-1");
        store.toggle(OrderId(1), LinkId(42), "TRK-42");
        store.select_all(&order, true);

        assert_eq!(store.selected_ids(OrderId(1)), first);
        assert_eq!(first, vec![LinkId(1), LinkId(2)]);
    }

    #[test]
    fn test_select_all_off_drops_entry() {
        let order = sample_order();
        let mut store = SelectionStore::default();
        store.select_all(&order, true);
        store.select_all(&order, false);

        assert_eq!(store.count(OrderId(1)), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_select_all_skips_terminal_links() {
        let order = sample_order();
        let mut store = SelectionStore::default();
        store.select_all(&order, true);

        assert!(!store.contains(OrderId(1), LinkId(3)));
        assert!(store.is_all_selected(&order));
    }

    #[test]
    fn test_select_all_on_order_without_eligible_links() {
        let order = order(2, vec![link(7, LinkStatus::Cancelled, Some(10))]);
        let mut store = SelectionStore::default();
        store.select_all(&order, true);

        assert!(store.is_empty());
        assert!(!store.is_all_selected(&order));
    }

    #[test]
    fn test_is_all_selected_is_computed() {
        let order = sample_order();
        let mut store = SelectionStore::default();
        store.toggle(OrderId(1), LinkId(1), "TRK-1");
        assert!(!store.is_all_selected(&order));

        store.toggle(OrderId(1), LinkId(2), "TRK-2");
        assert!(store.is_all_selected(&order));
    }

    #[test]
    fn test_clear_and_counts() {
        let mut store = SelectionStore::default();
        store.toggle(OrderId(1), LinkId(1), "TRK-1");
        store.toggle(OrderId(1), LinkId(2), "TRK-2");
        store.toggle(OrderId(2), LinkId(9), "TRK-9");

        assert_eq!(store.count(OrderId(1)), 2);
        assert_eq!(store.total_selected(), 3);
        assert_eq!(store.tracking_codes(OrderId(1)), vec!["TRK-1", "TRK-2"]);

        assert!(store.clear(OrderId(1)));
        assert!(!store.clear(OrderId(1)));
        assert_eq!(store.order_ids(), vec![OrderId(2)]);
    }
}
