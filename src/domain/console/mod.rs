// ============================================================================
// Console - state container shared by the selection UI and the workflows
// ============================================================================

pub mod actions;
pub mod errors;
pub mod store;

pub use actions::ConsoleAction;
pub use errors::SelectionError;
pub use store::ConsoleStore;
