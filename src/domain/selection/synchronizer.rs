use std::collections::{BTreeMap, HashMap};

use crate::domain::order::{LinkId, Order, OrderId};

use super::eligibility::EligibilityFn;
use super::store::SelectionStore;

// ============================================================================
// List Synchronizer
// ============================================================================
//
// Runs every time the order collection is replaced (paging, filters, page size,
// refetch after a mutation). Keeps, per selected order, the intersection of the
// selected ids with the eligible ids of the fresh snapshot. Orders that vanished
// from the page lose their entry. Pruning is expected and never an error.
//
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PruneReport {
    pub dropped_links: Vec<(OrderId, LinkId)>,
    pub dropped_orders: Vec<OrderId>,
}

impl PruneReport {
    pub fn is_empty(&self) -> bool {
        self.dropped_links.is_empty() && self.dropped_orders.is_empty()
    }

    pub fn pruned_link_count(&self) -> usize {
        self.dropped_links.len()
    }
}

pub fn reconcile(selection: &mut SelectionStore, orders: &[Order], eligible: EligibilityFn) -> PruneReport {
    let fresh: HashMap<OrderId, &Order> = orders.iter().map(|order| (order.order_id, order)).collect();
    let mut report = PruneReport::default();

    for order_id in selection.order_ids() {
        let previous: Vec<LinkId> = selection.selected_ids(order_id);

        let Some(order) = fresh.get(&order_id) else {
            report
                .dropped_links
                .extend(previous.iter().map(|link_id| (order_id, *link_id)));
            report.dropped_orders.push(order_id);
            selection.clear(order_id);
            continue;
        };

        let mut kept = BTreeMap::new();
        for link_id in previous {
            match order.link(link_id) {
                Some(link) if eligible(link) => {
                    kept.insert(link_id, link.tracking_code.clone());
                }
                _ => report.dropped_links.push((order_id, link_id)),
            }
        }

        if kept.is_empty() {
            report.dropped_orders.push(order_id);
        }
        selection.replace_entry(order_id, kept);
    }

    if !report.is_empty() {
        tracing::debug!(
            dropped_links = report.dropped_links.len(),
            dropped_orders = report.dropped_orders.len(),
            "Pruned selection after list refresh"
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::LinkStatus;
    use crate::domain::selection::eligibility::is_eligible;
    use crate::domain::selection::store::tests::{link, order};

    #[test]
    fn test_prunes_to_intersection_with_eligible_links() {
        let mut store = SelectionStore::default();
        for id in 1..=3 {
            store.toggle(OrderId(1), LinkId(id), format!("TRK-{}", id));
        }

        let refreshed = order(
            1,
            vec![
                link(1, LinkStatus::Purchased, Some(1)),
                link(2, LinkStatus::PendingPurchase, Some(1)),
                link(4, LinkStatus::PendingPurchase, Some(1)),
            ],
        );

        let report = reconcile(&mut store, &[refreshed], is_eligible);

        assert_eq!(store.selected_ids(OrderId(1)), vec![LinkId(2)]);
        assert_eq!(report.pruned_link_count(), 2);
        assert!(report.dropped_orders.is_empty());
    }

    #[test]
    fn test_missing_order_drops_whole_entry() {
        let mut store = SelectionStore::default();
        store.toggle(OrderId(1), LinkId(1), "TRK-1");
        store.toggle(OrderId(2), LinkId(5), "TRK-5");

        let other_page = order(2, vec![link(5, LinkStatus::PendingPurchase, Some(1))]);
        let report = reconcile(&mut store, &[other_page], is_eligible);

        assert_eq!(store.order_ids(), vec![OrderId(2)]);
        assert_eq!(report.dropped_orders, vec![OrderId(1)]);
        assert_eq!(report.dropped_links, vec![(OrderId(1), LinkId(1))]);
    }

    #[test]
    fn test_entry_removed_when_nothing_survives() {
        let mut store = SelectionStore::default();
        store.toggle(OrderId(1), LinkId(1), "TRK-1");

        let refreshed = order(1, vec![link(1, LinkStatus::Cancelled, Some(1))]);
        reconcile(&mut store, &[refreshed], is_eligible);

        assert!(store.is_empty());
    }

    #[test]
    fn test_refreshes_tracking_codes() {
        let mut store = SelectionStore::default();
        store.toggle(OrderId(1), LinkId(1), "");

        let mut refreshed_link = link(1, LinkStatus::PendingPurchase, Some(1));
        refreshed_link.tracking_code = "TRK-NEW".to_string();
        reconcile(&mut store, &[order(1, vec![refreshed_link])], is_eligible);

        assert_eq!(store.tracking_codes(OrderId(1)), vec!["TRK-NEW"]);
    }

    #[test]
    fn test_unchanged_page_produces_empty_report() {
        let current = order(1, vec![link(1, LinkStatus::PendingPurchase, Some(1))]);
        let mut store = SelectionStore::default();
        store.select_all(&current, true);

        let report = reconcile(&mut store, &[current], is_eligible);
        assert!(report.is_empty());
        assert_eq!(store.count(OrderId(1)), 1);
    }
}
