//! Order lifecycle engine
//!
//! Produces the only two kinds of write the terminals issue: creating an
//! order and advancing its status. Validation happens here, before anything
//! reaches the store; the store itself accepts whatever it is given.
//!
//! The new-order chime at the receiving terminal is *not* triggered from
//! here. It fires when the created order comes back through the realtime
//! subscription, so the sender never alerts itself twice and a receiving
//! terminal hears every new order regardless of origin (see the reducer).

use std::sync::Arc;

use chrono::Utc;
use shared::error::AppError;
use shared::order::{Cart, OrderDraft, OrderPatch, OrderStatus, ServiceType};
use shared::util::order_number;

use crate::store::OrderStore;

/// Order lifecycle engine, shared by both terminal roles
#[derive(Clone)]
pub struct OrderEngine {
    store: Arc<dyn OrderStore>,
}

impl OrderEngine {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Create a new order from a built cart
    ///
    /// Rejected with a validation error before any write when the cart is
    /// empty or no service type was chosen. A non-empty note is applied
    /// uniformly to every line item.
    pub async fn create_order(
        &self,
        mut cart: Cart,
        service_type: Option<ServiceType>,
        eta_mins: u32,
        note: &str,
    ) -> Result<String, AppError> {
        if cart.is_empty() {
            return Err(AppError::validation("cart is empty"));
        }
        let service_type = service_type.ok_or_else(|| {
            AppError::validation("service type is required")
        })?;

        cart.apply_note(note);

        let draft = OrderDraft {
            number: order_number(),
            items: cart.into_items(),
            placed_at: Utc::now(),
            status: OrderStatus::New,
            eta_mins,
            service_type,
        };

        self.store.ensure_identity().await?;
        let id = self.store.create(draft).await?;
        tracing::info!(order_id = %id, "order sent");
        Ok(id)
    }

    /// Advance an order to the given status
    ///
    /// Any target status is accepted; skips such as `NEW` straight to
    /// `DONE` are allowed. When the target is `DONE`, the completion
    /// timestamp is set in the same merge-patch as the status. The patch
    /// touches nothing else — cart contents and creation metadata are not
    /// representable in it.
    pub async fn advance(&self, order_id: &str, target: OrderStatus) -> Result<(), AppError> {
        let patch = OrderPatch {
            status: target,
            done_at: target.is_done().then(Utc::now),
        };

        self.store.ensure_identity().await?;
        self.store.merge_patch(order_id, patch).await?;
        tracing::info!(order_id = %order_id, status = ?target, "order status advanced");
        Ok(())
    }
}
