//! Unified error system for the relay
//!
//! - [`ErrorCode`]: standardized numeric error codes
//! - [`AppError`]: error type carrying a code and a message
//! - HTTP status mapping and an axum `IntoResponse` impl
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 9xxx: System / transport errors

mod codes;
mod http;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
