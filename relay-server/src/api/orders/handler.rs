//! Orders API handlers

use std::convert::Infallible;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::core::ServerState;
use crate::orders::BoardEvent;
use crate::utils::AppResult;
use shared::order::{
    CakeSelection, Cart, IceCreamSelection, MilkshakeSelection, Order, OrderStatus, ServiceType,
};

/// One cart entry as submitted by the sending terminal
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CartItemRequest {
    Milkshake(MilkshakeSelection),
    Icecream(IceCreamSelection),
    Cake(CakeSelection),
}

/// Request body for creating an order
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<CartItemRequest>,
    pub service_type: Option<ServiceType>,
    pub eta_mins: u32,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub id: String,
}

/// Request body for advancing an order's status
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: OrderStatus,
}

/// The board as both terminals render it
#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub active: Vec<Order>,
    pub completed: Vec<Order>,
}

/// POST /api/orders - build the cart and send the order
pub async fn create(
    State(state): State<ServerState>,
    Json(request): Json<CreateOrderRequest>,
) -> AppResult<Json<CreateOrderResponse>> {
    let mut cart = Cart::new();
    for item in request.items {
        match item {
            CartItemRequest::Milkshake(sel) => cart.add_milkshake(sel)?,
            CartItemRequest::Icecream(sel) => cart.add_icecream(sel)?,
            CartItemRequest::Cake(sel) => cart.add_cake(sel)?,
        }
    }

    let id = state
        .engine
        .create_order(cart, request.service_type, request.eta_mins, &request.note)
        .await?;

    Ok(Json(CreateOrderResponse { id }))
}

/// GET /api/orders - the current active/completed partitions
pub async fn list(State(state): State<ServerState>) -> Json<BoardResponse> {
    Json(BoardResponse {
        active: state.board.active(),
        completed: state.board.completed(),
    })
}

/// POST /api/orders/:id/status - advance an order
pub async fn set_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(request): Json<SetStatusRequest>,
) -> AppResult<Json<bool>> {
    state.engine.advance(&id, request.status).await?;
    Ok(Json(true))
}

/// GET /api/orders/stream - realtime board events
///
/// Emits the current snapshot immediately, then every board change and
/// new-order alert as they arrive from the reducer.
pub async fn stream(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let initial = BoardEvent::Snapshot {
        active: state.board.active(),
        completed: state.board.completed(),
    };
    let rx = state.events.subscribe();

    let updates = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((event, rx)),
                // A lagged consumer only missed superseded snapshots.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    let stream = futures::stream::once(async move { initial })
        .chain(updates)
        .map(|event| {
            let sse = match serde_json::to_string(&event) {
                Ok(json) => Event::default().event(event.name()).data(json),
                Err(e) => Event::default().comment(format!("serialization failed: {e}")),
            };
            Ok::<_, Infallible>(sse)
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
