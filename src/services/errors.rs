use serde_json::Value;

// ============================================================================
// Collaborator Errors
// ============================================================================

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Body of a rejected response, as far as the transport could decode it
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Json(Value),
    Text(String),
    Empty,
}

impl ErrorBody {
    /// Decode a raw response body: JSON if it parses, text otherwise
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return ErrorBody::Empty;
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::String(text)) => ErrorBody::Text(text),
            Ok(value) => ErrorBody::Json(value),
            Err(_) => ErrorBody::Text(trimmed.to_string()),
        }
    }

    /// Message shown to staff.
    ///
    /// `message` field, then `error` field, then the raw text body, then a
    /// generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            ErrorBody::Json(value) => ["message", "error"]
                .iter()
                .filter_map(|key| value.get(key).and_then(Value::as_str))
                .map(str::trim)
                .find(|text| !text.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            ErrorBody::Text(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("Unauthorized: credential missing or expired")]
    Unauthorized,

    #[error("Server rejected request with status {status}: {}", body.user_message())]
    Rejected { status: u16, body: ErrorBody },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl ServiceError {
    pub fn rejected(status: u16, body: Value) -> Self {
        ServiceError::Rejected {
            status,
            body: ErrorBody::Json(body),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Unauthorized => "unauthorized",
            ServiceError::Rejected { .. } => "rejected",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Transport(_) => "transport",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_field_wins() {
        let body = ErrorBody::Json(json!({"message": "Order locked", "error": "Conflict"}));
        assert_eq!(body.user_message(), "Order locked");
    }

    #[test]
    fn test_error_field_is_second_choice() {
        let body = ErrorBody::Json(json!({"error": "Bad Request", "status": 400}));
        assert_eq!(body.user_message(), "Bad Request");
    }

    #[test]
    fn test_blank_message_falls_through_to_error() {
        let body = ErrorBody::Json(json!({"message": "  ", "error": "Invalid image"}));
        assert_eq!(body.user_message(), "Invalid image");
    }

    #[test]
    fn test_raw_text_body() {
        let body = ErrorBody::from_raw("Tracking code already used");
        assert_eq!(body, ErrorBody::Text("Tracking code already used".to_string()));
        assert_eq!(body.user_message(), "Tracking code already used");
    }

    #[test]
    fn test_json_string_body_is_text() {
        let body = ErrorBody::from_raw("\"Duplicate purchase\"");
        assert_eq!(body.user_message(), "Duplicate purchase");
    }

    #[test]
    fn test_generic_fallback() {
        assert_eq!(ErrorBody::Empty.user_message(), GENERIC_FAILURE_MESSAGE);
        assert_eq!(ErrorBody::from_raw("   ").user_message(), GENERIC_FAILURE_MESSAGE);
        assert_eq!(ErrorBody::Json(json!({"code": 17})).user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_rejected_display_uses_user_message() {
        let err = ServiceError::rejected(409, json!({"message": "Already purchased"}));
        assert_eq!(err.to_string(), "Server rejected request with status 409: Already purchased");
        assert_eq!(err.kind(), "rejected");
    }
}
