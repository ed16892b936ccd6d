//! Offline-resilient cache layer
//!
//! Keeps each terminal serving its UI shell and static assets through
//! network interruptions:
//!
//! - **storage**: named, versioned response caches persisted in redb
//! - **fetcher**: pluggable upstream HTTP access (real client or scripted)
//! - **manager**: install/activate lifecycle and per-route fetch strategies
//! - **gateway**: the axum fallback route that feeds every non-API request
//!   through the manager

pub mod fetcher;
pub mod gateway;
pub mod manager;
pub mod storage;

pub use fetcher::{FetchError, FetchRequest, FetchResponse, Fetcher, HttpFetcher};
pub use manager::CacheManager;
pub use storage::{CacheError, CacheStorage};
