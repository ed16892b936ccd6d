//! Server state — everything the handlers and background tasks share
//!
//! Mutable process-wide state (the board, the event channel, the cache
//! lifecycle flag) is owned here and passed explicitly to the components
//! that need it; there are no ambient singletons.

use std::sync::Arc;

use shared::error::AppError;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::config::Config;
use crate::cache::{CacheManager, CacheStorage, HttpFetcher};
use crate::orders::{BoardEvent, OrderBoard, OrderEngine};
use crate::store::{MemoryOrderStore, OrderStore, SurrealOrderStore};

/// Capacity of the board event fan-out channel
const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Shared server state, cheap to clone
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub store: Arc<dyn OrderStore>,
    pub engine: OrderEngine,
    pub board: OrderBoard,
    pub events: broadcast::Sender<BoardEvent>,
    pub cache: Arc<CacheManager>,
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// Initialize storage, the store client and the cache manager
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        std::fs::create_dir_all(&config.data_dir)
            .map_err(|e| AppError::internal(format!("cannot create data dir: {e}")))?;

        let store: Arc<dyn OrderStore> = match config.store_mode.as_str() {
            "memory" => Arc::new(MemoryOrderStore::new()),
            _ => Arc::new(
                SurrealOrderStore::open(&config.orders_db_path())
                    .await
                    .map_err(AppError::from)?,
            ),
        };

        let cache_storage = CacheStorage::open(config.cache_db_path())
            .map_err(|e| AppError::internal(format!("cannot open cache database: {e}")))?;
        let fetcher = Arc::new(HttpFetcher::new(config.upstream_origin.clone()));
        let cache = Arc::new(CacheManager::new(
            Arc::new(cache_storage),
            fetcher,
            &config.cache_version,
        ));

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config: Arc::new(config.clone()),
            engine: OrderEngine::new(store.clone()),
            store,
            board: OrderBoard::new(),
            events,
            cache,
            shutdown: CancellationToken::new(),
        })
    }
}
