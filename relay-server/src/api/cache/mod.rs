//! Cache API module
//!
//! The explicit "activate now" signal for the cache manager.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/cache/activate", post(handler::activate_now))
}
