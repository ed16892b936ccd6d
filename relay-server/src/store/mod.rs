//! Order store client — the contract over the shared realtime collection
//!
//! Both terminals read and write one flat collection of order documents
//! through this trait. The store is the only shared mutable resource:
//! there is no locking, and concurrent merge-patches resolve last-write-wins
//! inside the store itself.
//!
//! # Contract
//!
//! - `ensure_identity` must resolve before any other call on a cold entry
//!   point (subscription setup, order send, status patch, cleanup pass).
//! - `subscribe` yields *full* ordered snapshots: every emission replaces
//!   the previous one entirely, sorted by `placedAt` descending. The initial
//!   snapshot is delivered promptly, then one per underlying change.
//! - `merge_patch` applies only the fields present in the patch; there is no
//!   full-overwrite write path.
//!
//! Two implementations:
//! - [`SurrealOrderStore`]: embedded SurrealDB, the production store
//! - [`MemoryOrderStore`]: in-process store for tests and single-terminal use

pub mod memory;
pub mod surreal;

pub use memory::MemoryOrderStore;
pub use surreal::SurrealOrderStore;

use async_trait::async_trait;
use serde_json::Value;
use shared::error::AppError;
use shared::order::{Order, OrderDraft, OrderPatch};
use thiserror::Error;
use tokio::sync::broadcast;

/// Name of the single shared collection
pub const ORDERS_COLLECTION: &str = "orders";

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unreachable: {0}")]
    Transport(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::not_found(what),
            StoreError::Transport(msg) => AppError::transport(msg),
            StoreError::Serialization(msg) => AppError::internal(msg),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Snapshot sort order, applied by the store's query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A live subscription to the collection
///
/// Wraps a broadcast receiver so that a consumer that falls behind skips
/// straight to the newest snapshot — each snapshot fully replaces the last,
/// so intermediate ones carry no information worth catching up on.
///
/// The consuming context must call [`Subscription::unsubscribe`] exactly
/// once on teardown.
pub struct Subscription {
    /// Initial snapshot, handed over at subscribe time
    pending: Option<Vec<Order>>,
    rx: broadcast::Receiver<Vec<Order>>,
}

impl Subscription {
    pub(crate) fn new(initial: Vec<Order>, rx: broadcast::Receiver<Vec<Order>>) -> Self {
        Self {
            pending: Some(initial),
            rx,
        }
    }

    /// Receive the next snapshot, or `None` once the store has shut down
    pub async fn recv(&mut self) -> Option<Vec<Order>> {
        if let Some(initial) = self.pending.take() {
            return Some(initial);
        }
        loop {
            match self.rx.recv().await {
                Ok(snapshot) => return Some(snapshot),
                // Lagged: older snapshots were dropped; the next recv
                // returns a newer one, which supersedes them anyway.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "subscription lagged, skipping to latest snapshot");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Tear down the subscription
    pub fn unsubscribe(self) {
        // Dropping the receiver detaches from the broadcast channel.
    }
}

/// Client contract over the shared realtime order collection
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Resolve an identity recognized by the store's access policy
    ///
    /// Must complete before any read or write on a cold entry point.
    /// Idempotent: subsequent calls are cheap no-ops.
    async fn ensure_identity(&self) -> StoreResult<()>;

    /// Subscribe to full snapshots of the collection, sorted by `placedAt`
    async fn subscribe(&self, direction: SortDirection) -> StoreResult<Subscription>;

    /// Create a new document, returning the store-assigned id
    async fn create(&self, draft: OrderDraft) -> StoreResult<String>;

    /// Merge-patch an existing document; only the given fields change
    async fn merge_patch(&self, id: &str, patch: OrderPatch) -> StoreResult<()>;

    /// Query documents where `field == equals`
    async fn query_where(&self, field: &str, equals: Value) -> StoreResult<Vec<Order>>;

    /// Delete a document by id
    async fn delete(&self, id: &str) -> StoreResult<()>;
}
