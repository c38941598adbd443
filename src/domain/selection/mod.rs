// ============================================================================
// Selection - choosing eligible links across many orders
// ============================================================================
//
// - Eligibility filter and the per-workflow SelectionPolicy
// - SelectionStore (orderId -> linkId -> trackingCode)
// - Aggregation (counts, totals over a chosen price field)
// - List synchronizer (prunes the selection when the page is replaced)
//
// ============================================================================

pub mod eligibility;
pub mod store;
pub mod aggregation;
pub mod synchronizer;

pub use eligibility::{is_eligible, EligibilityFn, SelectionPolicy};
pub use store::SelectionStore;
pub use aggregation::{grand_total, summary, total, PriceField, SelectionSummary};
pub use synchronizer::{reconcile, PruneReport};
