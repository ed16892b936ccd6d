//! Order data model and cart construction
//!
//! - `types`: the wire-level order documents shared by both terminals
//! - `cart`: selection → line-item construction used by the sending terminal

pub mod cart;
pub mod types;

pub use cart::{CakeSelection, Cart, IceCreamSelection, MilkshakeSelection, resize_flavours};
pub use types::{
    CakeSide, LineItem, LineItemKind, MilkshakeSize, Order, OrderDraft, OrderPatch, OrderStatus,
    ServiceType,
};
