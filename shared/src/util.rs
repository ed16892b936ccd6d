//! Small shared utilities

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a human-readable order reference
///
/// Derived from creation time modulo a fixed range. Not guaranteed unique,
/// but practically distinguishing within a shift.
pub fn order_number() -> i64 {
    now_millis() % 100_000
}

/// Generate a short id for cart-local use
///
/// Unique within one order's cart only, never used as a store key.
pub fn short_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
