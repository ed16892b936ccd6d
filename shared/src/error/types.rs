//! Error types

use super::codes::ErrorCode;
use thiserror::Error;

/// Application error with structured error code
///
/// The primary error type at the relay's API boundary. Component-internal
/// errors (store, cache, engine) carry their own `thiserror` enums and are
/// converted into an `AppError` where they cross into a handler.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NotFound, format!("{} not found", resource.into()))
    }

    /// Create a transport error (store unreachable)
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::Transport, msg)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }
}

/// Result type for operations surfacing an [`AppError`]
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message() {
        let err = AppError::new(ErrorCode::ValidationFailed);
        assert_eq!(err.message, "Validation failed");
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_custom_message() {
        let err = AppError::validation("cart is empty");
        assert_eq!(err.to_string(), "cart is empty");
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
