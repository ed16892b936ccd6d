//! Embedded SurrealDB order store
//!
//! The production implementation of [`OrderStore`]. Documents live in a
//! single `orders` table; every mutation re-queries the full ordered
//! collection and fans the snapshot out over a broadcast channel, so all
//! subscribers converge on the store's view after each change.
//!
//! Record keys are caller-generated UUIDs. Queries project the key back
//! into the document's `id` field so rows deserialize straight into
//! [`Order`].

use serde_json::Value;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};
use tokio::sync::{OnceCell, broadcast};

use async_trait::async_trait;
use shared::order::{Order, OrderDraft, OrderPatch};

use super::{
    ORDERS_COLLECTION, OrderStore, SortDirection, StoreError, StoreResult, Subscription,
};

const NAMESPACE: &str = "relay";
const DATABASE: &str = "relay";

/// Capacity of the snapshot fan-out channel
const CHANNEL_CAPACITY: usize = 64;

/// Embedded SurrealDB-backed order store
#[derive(Clone)]
pub struct SurrealOrderStore {
    db: Surreal<Db>,
    changes: broadcast::Sender<Vec<Order>>,
    identity: std::sync::Arc<OnceCell<()>>,
}

impl SurrealOrderStore {
    /// Open (or create) the store at the given path
    pub async fn open(path: &str) -> StoreResult<Self> {
        let db = Surreal::new::<RocksDb>(path).await?;
        Ok(Self::with_db(db))
    }

    /// Open an in-memory store (tests, throwaway environments)
    pub async fn open_in_memory() -> StoreResult<Self> {
        let db = Surreal::new::<Mem>(()).await?;
        Ok(Self::with_db(db))
    }

    fn with_db(db: Surreal<Db>) -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            db,
            changes,
            identity: std::sync::Arc::new(OnceCell::new()),
        }
    }

    /// Full collection snapshot, newest first
    async fn snapshot(&self) -> StoreResult<Vec<Order>> {
        self.query_ordered(None).await
    }

    async fn query_ordered(&self, filter: Option<(&str, Value)>) -> StoreResult<Vec<Order>> {
        let sql = match filter {
            Some((field, _)) => format!(
                "SELECT *, record::id(id) AS id FROM {ORDERS_COLLECTION} \
                 WHERE {field} = $value ORDER BY placedAt DESC"
            ),
            None => format!(
                "SELECT *, record::id(id) AS id FROM {ORDERS_COLLECTION} \
                 ORDER BY placedAt DESC"
            ),
        };

        let mut query = self.db.query(sql);
        if let Some((_, value)) = filter {
            query = query.bind(("value", value));
        }

        let mut response = query.await?;
        let rows: Vec<Order> = response.take(0)?;
        Ok(rows)
    }

    /// Re-query and broadcast the collection after a mutation
    ///
    /// A failed re-query only skips the emission; subscribers keep their
    /// last snapshot and converge on the next successful one.
    async fn publish(&self) {
        match self.snapshot().await {
            Ok(snapshot) => {
                let _ = self.changes.send(snapshot);
            }
            Err(e) => {
                tracing::warn!("failed to publish order snapshot: {}", e);
            }
        }
    }
}

#[async_trait]
impl OrderStore for SurrealOrderStore {
    async fn ensure_identity(&self) -> StoreResult<()> {
        self.identity
            .get_or_try_init(|| async {
                self.db.use_ns(NAMESPACE).use_db(DATABASE).await?;
                tracing::debug!(ns = NAMESPACE, db = DATABASE, "store identity established");
                Ok::<(), StoreError>(())
            })
            .await?;
        Ok(())
    }

    async fn subscribe(&self, _direction: SortDirection) -> StoreResult<Subscription> {
        let initial = self.snapshot().await?;
        let rx = self.changes.subscribe();
        Ok(Subscription::new(initial, rx))
    }

    async fn create(&self, draft: OrderDraft) -> StoreResult<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let _: Option<Value> = self
            .db
            .create((ORDERS_COLLECTION, id.as_str()))
            .content(draft)
            .await?;
        self.publish().await;
        Ok(id)
    }

    async fn merge_patch(&self, id: &str, patch: OrderPatch) -> StoreResult<()> {
        let updated: Option<Value> = self
            .db
            .update((ORDERS_COLLECTION, id))
            .merge(patch)
            .await?;
        if updated.is_none() {
            return Err(StoreError::NotFound(format!("order {id}")));
        }
        self.publish().await;
        Ok(())
    }

    async fn query_where(&self, field: &str, equals: Value) -> StoreResult<Vec<Order>> {
        // Field names come from internal callers, never from request input.
        self.query_ordered(Some((field, equals))).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let _: Option<Value> = self.db.delete((ORDERS_COLLECTION, id)).await?;
        self.publish().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::order::{OrderStatus, ServiceType};
    use shared::util::order_number;

    fn draft() -> OrderDraft {
        OrderDraft {
            number: order_number(),
            items: vec![],
            placed_at: Utc::now(),
            status: OrderStatus::New,
            eta_mins: 15,
            service_type: ServiceType::Waiting,
        }
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let store = SurrealOrderStore::open_in_memory().await.unwrap();
        store.ensure_identity().await.unwrap();

        let id = store.create(draft()).await.unwrap();

        let mut sub = store.subscribe(SortDirection::Desc).await.unwrap();
        let snapshot = sub.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);
        assert_eq!(snapshot[0].status, OrderStatus::New);
        assert!(snapshot[0].done_at.is_none());
        sub.unsubscribe();
    }

    #[tokio::test]
    async fn test_merge_patch_preserves_immutable_fields() {
        let store = SurrealOrderStore::open_in_memory().await.unwrap();
        store.ensure_identity().await.unwrap();

        let mut d = draft();
        d.eta_mins = 5;
        let id = store.create(d).await.unwrap();

        let done_at = Utc::now();
        store
            .merge_patch(
                &id,
                OrderPatch {
                    status: OrderStatus::Done,
                    done_at: Some(done_at),
                },
            )
            .await
            .unwrap();

        let done = store
            .query_where("status", serde_json::json!("DONE"))
            .await
            .unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].eta_mins, 5);
        assert_eq!(done[0].status, OrderStatus::Done);
        assert!(done[0].done_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_from_snapshot() {
        let store = SurrealOrderStore::open_in_memory().await.unwrap();
        store.ensure_identity().await.unwrap();

        let id = store.create(draft()).await.unwrap();
        store.delete(&id).await.unwrap();

        let mut sub = store.subscribe(SortDirection::Desc).await.unwrap();
        assert!(sub.recv().await.unwrap().is_empty());
        sub.unsubscribe();
    }
}
