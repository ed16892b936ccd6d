//! Order lifecycle, realtime sync and cleanup
//!
//! - **engine**: validates and produces order writes (create, status advance)
//! - **reducer**: folds the store's snapshot stream into the board both
//!   terminals render from
//! - **cleanup**: daily deletion of previous-day completed orders

pub mod cleanup;
pub mod engine;
pub mod reducer;

pub use cleanup::CleanupScheduler;
pub use engine::OrderEngine;
pub use reducer::{BoardEvent, OrderBoard, SyncReducer};
