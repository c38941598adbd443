use std::sync::Arc;

use crate::domain::order::{Order, OrderId, Page, PageQuery};
use crate::domain::selection::{self, PruneReport, SelectionPolicy, SelectionStore, SelectionSummary};
use crate::metrics::Metrics;

use rust_decimal::Decimal;

use super::actions::ConsoleAction;
use super::errors::SelectionError;

// ============================================================================
// Console Store - explicit state container for one console screen
// ============================================================================
//
// Holds the current page snapshot, the query that produced it and the
// selection. Every change goes through `dispatch`, which takes `&mut self`:
// a synchronizer pass and a toggle for the same order can never interleave.
//
// ============================================================================

pub struct ConsoleStore {
    policy: SelectionPolicy,
    query: PageQuery,
    page: Page<Order>,
    selection: SelectionStore,
    refetch_pending: bool,
    last_prune: PruneReport,
    metrics: Option<Arc<Metrics>>,
}

impl ConsoleStore {
    pub fn new(policy: SelectionPolicy, query: PageQuery) -> Self {
        let page = Page::empty(query.size);
        Self {
            policy,
            query,
            page,
            selection: SelectionStore::new(policy.eligible),
            refetch_pending: true,
            last_prune: PruneReport::default(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn dispatch(&mut self, action: ConsoleAction) -> Result<(), SelectionError> {
        tracing::trace!(action = action.name(), "Dispatching console action");

        match action {
            ConsoleAction::Toggle { order_id, link_id } => {
                let order = self.order(order_id).ok_or(SelectionError::UnknownOrder(order_id))?;
                let link = order
                    .link(link_id)
                    .ok_or(SelectionError::UnknownLink { order_id, link_id })?;

                if !self.policy.is_eligible(link) {
                    tracing::debug!(
                        order_id = %order_id,
                        link_id = %link_id,
                        status = ?link.status,
                        "Rejected selection of ineligible link"
                    );
                    return Err(SelectionError::Ineligible {
                        link_id,
                        status: link.status,
                    });
                }

                let tracking_code = link.tracking_code.clone();
                self.selection.toggle(order_id, link_id, tracking_code);
            }
            ConsoleAction::SelectAll { order_id, on } => {
                let index = self
                    .page
                    .content
                    .iter()
                    .position(|order| order.order_id == order_id)
                    .ok_or(SelectionError::UnknownOrder(order_id))?;
                self.selection.select_all(&self.page.content[index], on);
            }
            ConsoleAction::Clear { order_id } => {
                self.selection.clear(order_id);
            }
            ConsoleAction::ReplacePage(page) => {
                self.page = page;
                self.last_prune = selection::reconcile(&mut self.selection, &self.page.content, self.policy.eligible);
                self.refetch_pending = false;

                if let Some(metrics) = &self.metrics {
                    metrics.record_pruned_links(self.last_prune.pruned_link_count());
                }
            }
            ConsoleAction::SetPinned { order_id, pinned_at } => {
                let order = self
                    .page
                    .content
                    .iter_mut()
                    .find(|order| order.order_id == order_id)
                    .ok_or(SelectionError::UnknownOrder(order_id))?;
                order.pinned_at = pinned_at;
            }
            ConsoleAction::SetQuery(query) => {
                self.query = query;
                self.refetch_pending = true;
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.set_selected_links(self.selection.total_selected());
        }

        Ok(())
    }

    /// Flag the current page as outdated without changing the query
    pub fn mark_stale(&mut self) {
        self.refetch_pending = true;
    }

    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.page.content.iter().find(|order| order.order_id == order_id)
    }

    pub fn orders(&self) -> &[Order] {
        &self.page.content
    }

    pub fn page(&self) -> &Page<Order> {
        &self.page
    }

    pub fn query(&self) -> &PageQuery {
        &self.query
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn refetch_pending(&self) -> bool {
        self.refetch_pending
    }

    pub fn last_prune(&self) -> &PruneReport {
        &self.last_prune
    }

    pub fn total(&self, order_id: OrderId) -> Decimal {
        self.order(order_id)
            .map(|order| selection::total(&self.selection, order_id, &order.links, self.policy.price))
            .unwrap_or_default()
    }

    pub fn grand_total(&self) -> Decimal {
        selection::grand_total(&self.selection, &self.page.content, self.policy.price)
    }

    pub fn summary(&self, order_id: OrderId) -> Option<SelectionSummary> {
        self.order(order_id)
            .map(|order| selection::summary(&self.selection, order, &self.policy))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
