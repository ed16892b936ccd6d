//! In-process order store
//!
//! Backs tests and single-terminal development. Mirrors the contract of the
//! embedded store exactly: every mutation publishes a fresh full snapshot to
//! all subscribers, sorted by `placedAt` descending.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use shared::order::{Order, OrderDraft, OrderPatch, OrderStatus};
use tokio::sync::broadcast;

use super::{OrderStore, SortDirection, StoreError, StoreResult, Subscription};

/// Capacity of the snapshot fan-out channel
const CHANNEL_CAPACITY: usize = 64;

/// In-memory order store
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<String, Order>>,
    changes: broadcast::Sender<Vec<Order>>,
    /// Test hook: when set, every operation fails with a transport error
    offline: AtomicBool,
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            orders: RwLock::new(HashMap::new()),
            changes,
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate the store becoming unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("store offline".to_string()));
        }
        Ok(())
    }

    /// Full collection snapshot, newest first
    fn snapshot(&self) -> Vec<Order> {
        let orders = self.orders.read();
        let mut list: Vec<Order> = orders.values().cloned().collect();
        list.sort_by(|a, b| b.placed_at.cmp(&a.placed_at).then(b.id.cmp(&a.id)));
        list
    }

    fn publish(&self) {
        // No receivers is fine; the snapshot is recomputed on subscribe.
        let _ = self.changes.send(self.snapshot());
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn ensure_identity(&self) -> StoreResult<()> {
        self.check_online()
    }

    async fn subscribe(&self, _direction: SortDirection) -> StoreResult<Subscription> {
        self.check_online()?;
        let rx = self.changes.subscribe();
        Ok(Subscription::new(self.snapshot(), rx))
    }

    async fn create(&self, draft: OrderDraft) -> StoreResult<String> {
        self.check_online()?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        let order = draft.into_order(id.clone());
        self.orders.write().insert(id.clone(), order);
        self.publish();
        Ok(id)
    }

    async fn merge_patch(&self, id: &str, patch: OrderPatch) -> StoreResult<()> {
        self.check_online()?;
        {
            let mut orders = self.orders.write();
            let order = orders
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;
            order.status = patch.status;
            if let Some(done_at) = patch.done_at {
                order.done_at = Some(done_at);
            }
        }
        self.publish();
        Ok(())
    }

    async fn query_where(&self, field: &str, equals: Value) -> StoreResult<Vec<Order>> {
        self.check_online()?;
        let mut matches: Vec<Order> = Vec::new();
        for order in self.snapshot() {
            let doc = serde_json::to_value(&order)?;
            if doc.get(field) == Some(&equals) {
                matches.push(order);
            }
        }
        Ok(matches)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.check_online()?;
        self.orders.write().remove(id);
        self.publish();
        Ok(())
    }
}

/// Convenience for tests: query by status through the generic contract
pub fn status_value(status: OrderStatus) -> Value {
    serde_json::to_value(status).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::order::ServiceType;
    use shared::util::order_number;

    fn draft() -> OrderDraft {
        OrderDraft {
            number: order_number(),
            items: vec![],
            placed_at: Utc::now(),
            status: OrderStatus::New,
            eta_mins: 10,
            service_type: ServiceType::Collection,
        }
    }

    #[tokio::test]
    async fn test_create_publishes_snapshot() {
        let store = MemoryOrderStore::new();
        let mut sub = store.subscribe(SortDirection::Desc).await.unwrap();

        // Initial snapshot is empty
        assert_eq!(sub.recv().await.unwrap().len(), 0);

        let id = store.create(draft()).await.unwrap();
        let snapshot = sub.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);
        sub.unsubscribe();
    }

    #[tokio::test]
    async fn test_snapshot_sorted_newest_first() {
        let store = MemoryOrderStore::new();

        let mut first = draft();
        first.placed_at = Utc::now() - chrono::Duration::minutes(5);
        let first_id = store.create(first).await.unwrap();

        let second_id = store.create(draft()).await.unwrap();

        let mut sub = store.subscribe(SortDirection::Desc).await.unwrap();
        let snapshot = sub.recv().await.unwrap();
        assert_eq!(snapshot[0].id, second_id);
        assert_eq!(snapshot[1].id, first_id);
        sub.unsubscribe();
    }

    #[tokio::test]
    async fn test_merge_patch_leaves_other_fields() {
        let store = MemoryOrderStore::new();
        let id = store.create(draft()).await.unwrap();

        store
            .merge_patch(
                &id,
                OrderPatch {
                    status: OrderStatus::Ready,
                    done_at: None,
                },
            )
            .await
            .unwrap();

        let all = store
            .query_where("status", status_value(OrderStatus::Ready))
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].eta_mins, 10);
        assert!(all[0].done_at.is_none());
    }

    #[tokio::test]
    async fn test_patch_missing_order_fails() {
        let store = MemoryOrderStore::new();
        let err = store
            .merge_patch(
                "missing",
                OrderPatch {
                    status: OrderStatus::Done,
                    done_at: Some(Utc::now()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_offline_store_fails_writes() {
        let store = MemoryOrderStore::new();
        store.set_offline(true);
        let err = store.create(draft()).await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }
}
