use miette::Diagnostic;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::session::SessionStatus;

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Product not found")]
    #[diagnostic(
        code(haggle_core::product_not_found),
        help("Product '{id}' does not exist or is no longer offered")
    )]
    ProductNotFound { id: String },

    #[error("User not found")]
    #[diagnostic(
        code(haggle_core::user_not_found),
        help("No account exists for '{id}'")
    )]
    UserNotFound { id: String },

    #[error("Chat session not found")]
    #[diagnostic(
        code(haggle_core::session_not_found),
        help("Session '{id}' does not exist for this user")
    )]
    SessionNotFound { id: String },

    #[error("Chat session is not active")]
    #[diagnostic(
        code(haggle_core::session_not_active),
        help("Session '{id}' is {status}; finished sessions accept no further changes")
    )]
    SessionNotActive { id: String, status: SessionStatus },

    #[error("Invalid {field}: {message}")]
    #[diagnostic(code(haggle_core::validation))]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Session was modified concurrently")]
    #[diagnostic(
        code(haggle_core::concurrent_modification),
        help("Session '{id}' changed since it was read (expected version {expected_version}); reload and retry")
    )]
    ConcurrentModification { id: String, expected_version: u64 },

    #[error("Storage did not respond in time")]
    #[diagnostic(
        code(haggle_core::timeout),
        help("'{operation}' exceeded {after_ms}ms; the request can be retried")
    )]
    Timeout { operation: &'static str, after_ms: u64 },

    #[error("Database error: {0}")]
    #[diagnostic(code(haggle_core::database))]
    Database(#[source] DatabaseError),

    #[error("Configuration error in {path}")]
    #[diagnostic(
        code(haggle_core::configuration),
        help("Check that {path} exists and is valid TOML: {message}")
    )]
    Configuration { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl From<DatabaseError> for CoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::VersionConflict {
                id,
                expected_version,
            } => Self::ConcurrentModification {
                id,
                expected_version,
            },
            other => Self::Database(other),
        }
    }
}

impl CoreError {
    pub fn product_not_found(id: impl ToString) -> Self {
        Self::ProductNotFound { id: id.to_string() }
    }

    pub fn user_not_found(id: impl ToString) -> Self {
        Self::UserNotFound { id: id.to_string() }
    }

    pub fn session_not_found(id: impl ToString) -> Self {
        Self::SessionNotFound { id: id.to_string() }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Whether repeating the same request could succeed.
    ///
    /// Only lost races and storage timeouts qualify; every other failure is a
    /// precondition that stays false until the caller changes the request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrentModification { .. } | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;

    #[test]
    fn test_session_not_active_report() {
        let error = CoreError::SessionNotActive {
            id: "negotiation_abc".to_string(),
            status: SessionStatus::Completed,
        };
        let output = format!("{:?}", Report::new(error));
        assert!(output.contains("session_not_active"));
        assert!(output.contains("completed"));
    }

    #[test]
    fn test_version_conflict_becomes_concurrent_modification() {
        let err: CoreError = DatabaseError::VersionConflict {
            id: "negotiation_abc".to_string(),
            expected_version: 3,
        }
        .into();
        assert!(matches!(
            err,
            CoreError::ConcurrentModification {
                expected_version: 3,
                ..
            }
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_precondition_failures_are_not_retryable() {
        assert!(!CoreError::session_not_found("x").is_retryable());
        assert!(!CoreError::validation("content", "empty").is_retryable());
        assert!(
            CoreError::Timeout {
                operation: "load session",
                after_ms: 10
            }
            .is_retryable()
        );
    }
}
