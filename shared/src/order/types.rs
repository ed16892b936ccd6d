//! Wire-level order documents
//!
//! Field names and enum spellings match the documents persisted in the
//! shared store: camelCase keys, SCREAMING_SNAKE_CASE statuses, lowercase
//! line-item kind tags, RFC 3339 timestamps in UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Order Status
// ============================================================================

/// Order status, monotonic along `NEW → IN_PROGRESS → READY → DONE`
///
/// Monotonicity is a property of how the terminals drive the status, not of
/// the data model: the engine accepts any target status (see the lifecycle
/// engine), and nothing reverts `DONE`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    New,
    InProgress,
    Ready,
    Done,
}

impl OrderStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

// ============================================================================
// Service Type
// ============================================================================

/// How the customer takes the order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceType {
    Waiting,
    Delivery,
    Collection,
}

// ============================================================================
// Line Items
// ============================================================================

/// Milkshake cup size
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MilkshakeSize {
    #[default]
    Regular,
    Large,
}

/// Side served with a cake
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CakeSide {
    #[default]
    None,
    Custard,
    #[serde(rename = "Vanilla Ice Cream")]
    VanillaIceCream,
}

/// Variant-specific line item fields, tagged by `kind`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LineItemKind {
    Milkshake {
        size: MilkshakeSize,
        whipped: bool,
        /// Present only when the item quantity is 1
        #[serde(skip_serializing_if = "Option::is_none")]
        pack: Option<bool>,
    },
    Icecream {
        scoops: u8,
        /// One entry per scoop, in scoop order
        flavours: Vec<String>,
    },
    Cake {
        side: CakeSide,
    },
}

/// A single cart entry, frozen at add-time
///
/// `id` is client-generated and unique within one order's cart only.
/// `name` is derived from the selections when the item is added and never
/// recomputed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub id: String,
    pub name: String,
    pub qty: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub kind: LineItemKind,
}

// ============================================================================
// Order Documents
// ============================================================================

/// A stored order, as read back from the shared collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Store-assigned identifier, immutable
    pub id: String,
    /// Human-readable reference derived from creation time; practically
    /// distinguishing within a shift, not guaranteed unique
    pub number: i64,
    /// Cart contents in the order they were added; never mutated after send
    pub items: Vec<LineItem>,
    pub placed_at: DateTime<Utc>,
    /// Set exactly once, when the status transitions to `DONE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub eta_mins: u32,
    pub service_type: ServiceType,
}

/// A new order document, before the store assigns an id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub number: i64,
    pub items: Vec<LineItem>,
    pub placed_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub eta_mins: u32,
    pub service_type: ServiceType,
}

impl OrderDraft {
    /// Attach the store-assigned id, yielding the full document
    pub fn into_order(self, id: String) -> Order {
        Order {
            id,
            number: self.number,
            items: self.items,
            placed_at: self.placed_at,
            done_at: None,
            status: self.status,
            eta_mins: self.eta_mins,
            service_type: self.service_type,
        }
    }
}

/// Partial update applied as a merge-patch
///
/// Only status and completion time are patchable; the cart contents,
/// creation metadata and service fields have no representation here, so a
/// patch cannot overwrite them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"DONE\"").unwrap(),
            OrderStatus::Done
        );
    }

    #[test]
    fn test_line_item_kind_tag() {
        let item = LineItem {
            id: "a1b2c3d4".to_string(),
            name: "Vanilla Milkshake".to_string(),
            qty: 1,
            notes: None,
            kind: LineItemKind::Milkshake {
                size: MilkshakeSize::Regular,
                whipped: false,
                pack: Some(true),
            },
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "milkshake");
        assert_eq!(json["size"], "Regular");
        assert_eq!(json["pack"], true);
        // notes absent entirely, not null
        assert!(json.get("notes").is_none());

        let back: LineItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_cake_side_rename() {
        assert_eq!(
            serde_json::to_string(&CakeSide::VanillaIceCream).unwrap(),
            "\"Vanilla Ice Cream\""
        );
    }

    #[test]
    fn test_order_camel_case_fields() {
        let order = Order {
            id: "o1".to_string(),
            number: 42,
            items: vec![],
            placed_at: Utc::now(),
            done_at: None,
            status: OrderStatus::New,
            eta_mins: 10,
            service_type: ServiceType::Collection,
        };

        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("placedAt").is_some());
        assert!(json.get("etaMins").is_some());
        assert_eq!(json["serviceType"], "Collection");
        assert!(json.get("doneAt").is_none());
    }

    #[test]
    fn test_patch_serializes_only_given_fields() {
        let patch = OrderPatch {
            status: OrderStatus::Ready,
            done_at: None,
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["status"], "READY");
        assert!(json.get("doneAt").is_none());
        assert_eq!(json.as_object().unwrap().len(), 1);
    }
}
