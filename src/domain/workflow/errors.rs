use rust_decimal::Decimal;

use crate::domain::order::LinkId;
use crate::services::ServiceError;

// ============================================================================
// Workflow Errors
// ============================================================================

/// Problems caught before anything is sent to the server
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Select at least one item first")]
    EmptySelection,

    #[error("Total is not a valid amount: {0}")]
    InvalidAmount(String),

    #[error("Total must be greater than zero, got {0}")]
    NonPositiveTotal(Decimal),

    #[error("Order code is missing")]
    BlankOrderCode,

    #[error("A receipt image is required")]
    MissingImage,

    #[error("Upload a receipt image before submitting")]
    PlaceholderImage,

    #[error("Link {0} has no tracking code yet")]
    BlankTrackingCode(LinkId),

    #[error("Link {0} can no longer be changed")]
    LinkNotActionable(LinkId),

    #[error("Shipment code is required")]
    BlankShipmentCode,

    #[error("Shipping fee cannot be negative, got {0}")]
    NegativeFee(Decimal),
}

impl ValidationError {
    pub fn rule(&self) -> &'static str {
        match self {
            ValidationError::EmptySelection => "empty_selection",
            ValidationError::InvalidAmount(_) => "invalid_amount",
            ValidationError::NonPositiveTotal(_) => "non_positive_total",
            ValidationError::BlankOrderCode => "blank_order_code",
            ValidationError::MissingImage => "missing_image",
            ValidationError::PlaceholderImage => "placeholder_image",
            ValidationError::BlankTrackingCode(_) => "blank_tracking_code",
            ValidationError::LinkNotActionable(_) => "link_not_actionable",
            ValidationError::BlankShipmentCode => "blank_shipment_code",
            ValidationError::NegativeFee(_) => "negative_fee",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("You are not signed in")]
    MissingCredential,

    #[error("Your session has expired, sign in again")]
    SessionExpired,

    #[error("{0}")]
    Rejected(String),

    #[error("Cannot reach server: {0}")]
    Unreachable(String),

    #[error("{0} no longer exists, the list has been refreshed")]
    StaleReference(String),

    #[error("Submission aborted: {0}")]
    Aborted(String),
}

impl WorkflowError {
    /// Label used for metrics and logs
    pub fn reason(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "validation",
            WorkflowError::MissingCredential => "missing_credential",
            WorkflowError::SessionExpired => "session_expired",
            WorkflowError::Rejected(_) => "rejected",
            WorkflowError::Unreachable(_) => "unreachable",
            WorkflowError::StaleReference(_) => "stale_reference",
            WorkflowError::Aborted(_) => "aborted",
        }
    }

    /// Detected before any network call
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            WorkflowError::Validation(_) | WorkflowError::MissingCredential | WorkflowError::StaleReference(_)
        )
    }

    /// Retrying the same request right away is reasonable
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkflowError::Unreachable(_))
    }
}

impl From<ServiceError> for WorkflowError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Unauthorized => WorkflowError::SessionExpired,
            ServiceError::Rejected { body, .. } => WorkflowError::Rejected(body.user_message()),
            ServiceError::NotFound(what) => WorkflowError::StaleReference(what),
            ServiceError::Transport(detail) => WorkflowError::Unreachable(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ErrorBody;
    use serde_json::json;

    #[test]
    fn test_rejection_uses_server_message() {
        let error: WorkflowError = ServiceError::rejected(422, json!({"error": "Image too large"})).into();
        assert_eq!(error, WorkflowError::Rejected("Image too large".to_string()));
        assert!(!error.is_client_side());
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_transport_error_is_distinct_and_retryable() {
        let error: WorkflowError = ServiceError::Transport("connection refused".to_string()).into();
        assert_eq!(error.to_string(), "Cannot reach server: connection refused");
        assert!(error.is_retryable());
        assert_eq!(error.reason(), "unreachable");
    }

    #[test]
    fn test_unauthorized_maps_to_session_expired() {
        let error: WorkflowError = ServiceError::Unauthorized.into();
        assert_eq!(error, WorkflowError::SessionExpired);
    }

    #[test]
    fn test_empty_rejection_body_gets_generic_message() {
        let error: WorkflowError = ServiceError::Rejected {
            status: 500,
            body: ErrorBody::Empty,
        }
        .into();
        assert_eq!(error.to_string(), crate::services::GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_validation_errors_are_client_side() {
        let error = WorkflowError::from(ValidationError::MissingImage);
        assert!(error.is_client_side());
        assert_eq!(error.to_string(), "A receipt image is required");
    }
}
