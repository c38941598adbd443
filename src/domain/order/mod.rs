// ============================================================================
// Order Domain - server-owned order snapshots
// ============================================================================
//
// - Value objects (ids, OrderType, OrderStatus, LinkStatus)
// - Order / OrderLink snapshots as delivered by the listing endpoints
// - Page envelope and the query that produced it
//
// ============================================================================

pub mod value_objects;
pub mod model;
pub mod page;

pub use value_objects::*;
pub use model::*;
pub use page::*;
