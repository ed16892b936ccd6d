//! Realtime sync reducer
//!
//! Folds the store's snapshot stream into the single in-memory order list
//! both terminal UIs render from. Each snapshot replaces the previous list
//! entirely — the last snapshot wins, with no speculative merging of local
//! writes. Store-side ordering (`placedAt` descending) is preserved as-is;
//! the reducer never re-sorts, because the active/completed split relies on
//! stable relative order.

use std::collections::HashSet;

use parking_lot::RwLock;
use serde::Serialize;
use shared::order::Order;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::store::Subscription;

/// The canonical in-memory order list
///
/// Owned by the reducer task and read by the API handlers. Holds the last
/// applied snapshot verbatim; the partitions are derived from scratch on
/// every read, never cached, so they cannot diverge after a merge-patch.
#[derive(Clone, Default)]
pub struct OrderBoard {
    orders: Arc<RwLock<Vec<Order>>>,
}

impl OrderBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with a new snapshot
    pub fn apply(&self, snapshot: Vec<Order>) {
        *self.orders.write() = snapshot;
    }

    /// The full list, in store order
    pub fn all(&self) -> Vec<Order> {
        self.orders.read().clone()
    }

    /// Orders still being worked: everything not `DONE`
    pub fn active(&self) -> Vec<Order> {
        self.orders
            .read()
            .iter()
            .filter(|o| !o.status.is_done())
            .cloned()
            .collect()
    }

    /// Completed orders
    pub fn completed(&self) -> Vec<Order> {
        self.orders
            .read()
            .iter()
            .filter(|o| o.status.is_done())
            .cloned()
            .collect()
    }
}

/// Events fanned out to the terminal UIs
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BoardEvent {
    /// The board changed; carries the fresh partitions
    #[serde(rename_all = "camelCase")]
    Snapshot {
        active: Vec<Order>,
        completed: Vec<Order>,
    },
    /// An order appeared that this terminal had not seen before
    ///
    /// Drives the audible alert at the receiving terminal. Emitted on
    /// snapshot arrival, never on the local send call.
    #[serde(rename_all = "camelCase")]
    NewOrder { id: String, number: i64 },
}

impl BoardEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Snapshot { .. } => "snapshot",
            Self::NewOrder { .. } => "newOrder",
        }
    }
}

/// Folds snapshots into the board and emits [`BoardEvent`]s
pub struct SyncReducer {
    board: OrderBoard,
    events: broadcast::Sender<BoardEvent>,
    /// Order ids already observed, for new-order detection
    seen: HashSet<String>,
    /// The first snapshot seeds `seen` silently, so a terminal coming up
    /// mid-shift does not chime for every order already on the board
    seeded: bool,
}

impl SyncReducer {
    pub fn new(board: OrderBoard, events: broadcast::Sender<BoardEvent>) -> Self {
        Self {
            board,
            events,
            seen: HashSet::new(),
            seeded: false,
        }
    }

    /// Consume the subscription until shutdown or stream end
    ///
    /// Owns the subscription for its whole life and tears it down exactly
    /// once on the way out. If the stream ends because the store became
    /// unreachable, the board keeps its last snapshot — stale but present.
    pub async fn run(mut self, mut subscription: Subscription, shutdown: CancellationToken) {
        tracing::info!("sync reducer started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("sync reducer received shutdown signal");
                    break;
                }
                snapshot = subscription.recv() => {
                    match snapshot {
                        Some(orders) => self.apply(orders),
                        None => {
                            tracing::warn!("order subscription ended, board frozen on last snapshot");
                            break;
                        }
                    }
                }
            }
        }
        subscription.unsubscribe();
        tracing::info!("sync reducer stopped");
    }

    /// Apply one snapshot: replace the board, emit events
    pub fn apply(&mut self, orders: Vec<Order>) {
        let fresh: Vec<(String, i64)> = orders
            .iter()
            .filter(|o| !self.seen.contains(&o.id))
            .map(|o| (o.id.clone(), o.number))
            .collect();

        for (id, _) in &fresh {
            self.seen.insert(id.clone());
        }

        self.board.apply(orders);

        let (active, completed) = (self.board.active(), self.board.completed());
        tracing::debug!(
            active = active.len(),
            completed = completed.len(),
            "snapshot applied"
        );
        let _ = self.events.send(BoardEvent::Snapshot { active, completed });

        if !self.seeded {
            self.seeded = true;
            return;
        }
        for (id, number) in fresh {
            let _ = self.events.send(BoardEvent::NewOrder { id, number });
        }
    }
}
