// ============================================================================
// Mutation Workflows - batch purchase, cancel, buy-later, pin, shipment code
// ============================================================================
//
// Each workflow runs Idle -> Validating -> Submitting -> Succeeded | Failed,
// gated per (WorkflowKind, TargetKey).
//
// ============================================================================

pub mod commands;
pub mod controller;
pub mod errors;
pub mod state;
mod validation;

pub use commands::{MutationPayload, MutationRequest, OptimisticPatch, PurchaseDraft, WorkflowIntent};
pub use controller::WorkflowController;
pub use errors::{ValidationError, WorkflowError};
pub use state::{Completed, SubmitOutcome, TargetKey, WorkflowKind, WorkflowPhase};
