// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// - order:     orders, links and paging as the server reports them
// - selection: which links the staff member has ticked, and their totals
// - console:   the single state container the UI dispatches into
// - workflow:  validated, single-flight mutations against the server
//
// Nothing here performs I/O directly; the workflow controller reaches the
// server through the traits in `services`.
//
// ============================================================================

pub mod order;
pub mod selection;
pub mod console;
pub mod workflow;
