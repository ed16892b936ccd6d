//! Cache API handlers

use axum::Json;
use axum::extract::State;

use crate::core::ServerState;

/// POST /api/cache/activate - force a waiting update live immediately
///
/// Refreshes the shell precache and prunes stale caches without waiting for
/// a process restart.
pub async fn activate_now(State(state): State<ServerState>) -> Json<bool> {
    state.cache.activate_now().await;
    Json(true)
}
