//! Orders API module
//!
//! The surface both terminal UIs drive: create an order, advance its
//! status, read the board, and follow the realtime event stream.

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/stream", get(handler::stream))
        .route("/{id}/status", post(handler::set_status))
}
