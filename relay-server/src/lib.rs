//! Relay Server - terminal-side gateway for the dessert order relay
//!
//! One instance runs beside each physical terminal (the order-taking
//! counter and the fulfillment counter). It keeps the terminal's UI served
//! offline-first and mirrors the shared order collection in realtime.
//!
//! # Module structure
//!
//! ```text
//! relay-server/src/
//! ├── core/          # Configuration, state, server wiring
//! ├── api/           # HTTP routes and handlers
//! ├── cache/         # Versioned response cache + fetch strategies
//! ├── store/         # Order store client (embedded / in-process)
//! ├── orders/        # Lifecycle engine, sync reducer, cleanup scheduler
//! └── utils/         # Logging and time helpers
//! ```

pub mod api;
pub mod cache;
pub mod core;
pub mod orders;
pub mod store;
pub mod utils;

// Re-export public types
pub use cache::{CacheManager, CacheStorage, FetchRequest, FetchResponse, Fetcher, HttpFetcher};
pub use crate::core::{Config, Server, ServerState};
pub use orders::{BoardEvent, CleanupScheduler, OrderBoard, OrderEngine, SyncReducer};
pub use store::{MemoryOrderStore, OrderStore, SortDirection, StoreError, SurrealOrderStore};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
    ____       __
   / __ \___  / /___ ___  __
  / /_/ / _ \/ / __ `/ / / /
 / _, _/  __/ / /_/ / /_/ /
/_/ |_|\___/_/\__,_/\__, /
                   /____/
    "#
    );
}
