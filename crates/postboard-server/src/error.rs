//! Server error types.

use serde::Serialize;
use thiserror::Error;

/// Server errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] postboard_core::Error),
}

/// Stable error classification exposed to the query layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    Conflict,
    Internal,
}

/// Error returned by a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct ResolverError {
    /// Error code.
    pub code: ErrorCode,
    /// Error message.
    pub message: String,
}

impl ResolverError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }
}

impl From<postboard_core::Error> for ResolverError {
    fn from(err: postboard_core::Error) -> Self {
        use postboard_core::Error as CoreError;

        let code = match &err {
            CoreError::NotFound(_) => ErrorCode::NotFound,
            CoreError::Conflict(_) => ErrorCode::Conflict,
            CoreError::Storage(_)
            | CoreError::Io(_)
            | CoreError::Serialization(_)
            | CoreError::Corrupt(_) => {
                tracing::error!(error = %err, "store failure");
                ErrorCode::Internal
            }
        };

        let message = match &err {
            CoreError::NotFound(inner) => inner.to_string(),
            CoreError::Conflict(inner) => inner.to_string(),
            _ => "internal error".to_string(),
        };

        Self { code, message }
    }
}
