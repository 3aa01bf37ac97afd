//! API error types

use haggle_core::CoreError;
use miette::{Diagnostic, JSONReportHandler};
use serde::{Deserialize, Serialize};

/// API error response
#[derive(Debug, thiserror::Error, Diagnostic, Serialize, Deserialize)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation failed: {message}")]
    #[diagnostic(
        code(api::validation_error),
        help("Check the request body against the endpoint's expected shape")
    )]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Authentication required
    #[error("{}", .message.as_deref().unwrap_or("Authentication required"))]
    #[diagnostic(
        code(api::unauthorized),
        help("Send a valid bearer token in the Authorization header")
    )]
    Unauthorized { message: Option<String> },

    /// Resource not found
    #[error("{resource_type} not found")]
    #[diagnostic(
        code(api::not_found),
        help("The {resource_type} with ID '{resource_id}' does not exist")
    )]
    NotFound {
        resource_type: String,
        resource_id: String,
    },

    /// The session is no longer accepting changes
    #[error("{message}")]
    #[diagnostic(
        code(api::invalid_state),
        help("Completed and cancelled sessions cannot be modified")
    )]
    InvalidState { message: String },

    /// Another request changed the session first
    #[error("{message}")]
    #[diagnostic(code(api::conflict), help("Reload the session and retry the request"))]
    Conflict { message: String },

    /// Storage did not answer in time
    #[error("{message}")]
    #[diagnostic(code(api::timeout), help("The request can be retried"))]
    Timeout { message: String },

    /// Anything the client cannot act on
    #[error("Internal server error")]
    #[diagnostic(code(api::internal_error))]
    Internal { message: String, json: String },
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation { .. } => 400,
            ApiError::InvalidState { .. } => 400,
            ApiError::Unauthorized { .. } => 401,
            ApiError::NotFound { .. } => 404,
            ApiError::Conflict { .. } => 409,
            ApiError::Timeout { .. } => 503,
            ApiError::Internal { .. } => 500,
        }
    }

    /// Stable machine-readable code for the response body
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::InvalidState { .. } => "session_not_active",
            ApiError::Unauthorized { .. } => "unauthorized",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Conflict { .. } => "concurrent_modification",
            ApiError::Timeout { .. } => "timeout",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    /// Whether the same request may succeed if sent again
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Conflict { .. } | ApiError::Timeout { .. })
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: Some(message.into()),
        }
    }

    pub fn not_found(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    /// JSON body sent to the client
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
            "retryable": self.is_retryable(),
        })
    }
}

fn render_json(err: &dyn Diagnostic) -> String {
    let mut json = String::new();
    JSONReportHandler::new()
        .render_report(&mut json, err)
        .unwrap_or_default();
    json
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound { id } => Self::not_found("Product", id),
            CoreError::UserNotFound { id } => Self::not_found("User", id),
            CoreError::SessionNotFound { id } => Self::not_found("Session", id),
            err @ CoreError::SessionNotActive { .. } => Self::InvalidState {
                message: err.to_string(),
            },
            CoreError::Validation { field, message } => Self::Validation {
                message,
                field: Some(field.to_string()),
            },
            err @ CoreError::ConcurrentModification { .. } => Self::Conflict {
                message: err.to_string(),
            },
            err @ CoreError::Timeout { .. } => Self::Timeout {
                message: err.to_string(),
            },
            err @ (CoreError::Database(_) | CoreError::Configuration { .. }) => Self::Internal {
                message: err.to_string(),
                json: render_json(&err),
            },
        }
    }
}

#[cfg(feature = "server")]
impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

#[cfg(feature = "server")]
impl From<axum::extract::rejection::PathRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::PathRejection) -> Self {
        Self::Validation {
            message: rejection.body_text(),
            field: Some("sessionId".to_string()),
        }
    }
}

// Server-side response conversion
#[cfg(feature = "server")]
impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &self {
            ApiError::Internal { message, json } => {
                tracing::error!(detail = %json, "{}", message);
            }
            other => tracing::debug!(code = other.code(), "request failed: {}", other),
        }

        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haggle_core::{SessionId, SessionStatus};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_core_errors_map_to_statuses() {
        let cases = [
            (CoreError::product_not_found("p"), 404, "not_found"),
            (CoreError::user_not_found("u"), 404, "not_found"),
            (CoreError::session_not_found("s"), 404, "not_found"),
            (
                CoreError::SessionNotActive {
                    id: "s".into(),
                    status: SessionStatus::Completed,
                },
                400,
                "session_not_active",
            ),
            (
                CoreError::validation("content", "empty"),
                400,
                "validation_error",
            ),
            (
                CoreError::ConcurrentModification {
                    id: "s".into(),
                    expected_version: 3,
                },
                409,
                "concurrent_modification",
            ),
            (
                CoreError::Timeout {
                    operation: "load session",
                    after_ms: 10,
                },
                503,
                "timeout",
            ),
        ];

        for (core, status, code) in cases {
            let api = ApiError::from(core);
            assert_eq!(api.status_code(), status);
            assert_eq!(api.code(), code);
        }
    }

    #[test]
    fn test_body_shape_and_retryable_flag() {
        let conflict = ApiError::from(CoreError::ConcurrentModification {
            id: SessionId::nil().to_string(),
            expected_version: 1,
        });
        let body = conflict.body();
        assert_eq!(body["code"], "concurrent_modification");
        assert_eq!(body["retryable"], true);
        assert!(body["error"].as_str().unwrap().contains("modified"));

        let missing = ApiError::not_found("Session", "abc");
        assert_eq!(missing.body()["retryable"], false);
        assert_eq!(missing.body()["error"], "Session not found");
    }

    #[test]
    fn test_unauthorized_message_defaults() {
        assert_eq!(
            ApiError::Unauthorized { message: None }.to_string(),
            "Authentication required"
        );
        assert_eq!(
            ApiError::unauthorized("Invalid or expired token").to_string(),
            "Invalid or expired token"
        );
    }
}
