//! Cache manager — lifecycle and per-route fetch strategies
//!
//! Exactly one named cache is live at a time; its name carries the deploy
//! version token. Per request:
//!
//! - **Shell routes** (`GET /` and `GET /index.html`): network-first, so new
//!   builds are picked up; the cached copy is the offline fallback.
//! - **Static assets** (`GET /assets/...`): stale-while-revalidate. A stale
//!   asset may be served for one cycle after a deploy and self-corrects on
//!   the next cache write.
//! - Everything else passes through untouched — never cached.
//!
//! Cache writes are best-effort and never fail the outer fetch; a lookup
//! miss (or a broken cache read) falls through to the network.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use http::Method;
use shared::error::AppError;

use super::fetcher::{FetchRequest, FetchResponse, Fetcher};
use super::storage::CacheStorage;

/// Cache names are `relay-app-shell-<version>`; bump the version on every
/// deploy that changes shell content or strategy logic
const CACHE_NAME_PREFIX: &str = "relay-app-shell-";

/// The application shell's canonical entry points
const APP_SHELL: [&str; 2] = ["/", "/index.html"];

/// Bundler output prefix for fingerprinted static assets
const ASSET_PREFIX: &str = "/assets/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Shell,
    StaticAsset,
    PassThrough,
}

/// Versioned response cache with install/activate lifecycle
///
/// The hosting runtime drives the lifecycle: `install` on startup,
/// `activate` once serving begins, and `activate_now` when an update must
/// roll out immediately without a restart.
pub struct CacheManager {
    storage: Arc<CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    cache_name: String,
    active: AtomicBool,
    /// Paths with a revalidation already in flight
    revalidating: Arc<DashMap<String, ()>>,
}

impl CacheManager {
    pub fn new(storage: Arc<CacheStorage>, fetcher: Arc<dyn Fetcher>, version: &str) -> Self {
        Self {
            storage,
            fetcher,
            cache_name: format!("{CACHE_NAME_PREFIX}{version}"),
            active: AtomicBool::new(false),
            revalidating: Arc::new(DashMap::new()),
        }
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Pre-populate the current cache with the application shell
    ///
    /// Best-effort: a terminal booting offline keeps whatever its previous
    /// run cached and installs nothing new.
    pub async fn install(&self) {
        for path in APP_SHELL {
            let request = FetchRequest::get(path);
            match self.fetcher.fetch(&request).await {
                Ok(response) if response.is_success() => {
                    self.put_best_effort(path, &response);
                }
                Ok(response) => {
                    tracing::warn!(path, status = response.status, "shell precache skipped");
                }
                Err(e) => {
                    tracing::warn!(path, "shell precache fetch failed: {}", e);
                }
            }
        }
        tracing::info!(cache = %self.cache_name, "cache install finished");
    }

    /// Delete every cache from older deploys and start intercepting
    ///
    /// Takes effect immediately for all requests — there is no waiting
    /// period once activation runs.
    pub async fn activate(&self) {
        match self.storage.cache_names() {
            Ok(names) => {
                for name in names.iter().filter(|n| **n != self.cache_name) {
                    match self.storage.delete_cache(name) {
                        Ok(_) => tracing::info!(cache = %name, "pruned stale cache"),
                        Err(e) => tracing::warn!(cache = %name, "failed to prune cache: {}", e),
                    }
                }
            }
            Err(e) => tracing::warn!("failed to enumerate caches: {}", e),
        }
        self.active.store(true, Ordering::SeqCst);
        tracing::info!(cache = %self.cache_name, "cache activated");
    }

    /// Force the waiting update live right now
    ///
    /// The explicit external signal: refreshes the shell precache and
    /// re-runs activation so a deploy rolls out without a restart.
    pub async fn activate_now(&self) {
        tracing::info!("immediate cache activation requested");
        self.install().await;
        self.activate().await;
    }

    /// Serve one request according to its route's strategy
    pub async fn handle(&self, request: FetchRequest) -> Result<FetchResponse, AppError> {
        if !self.is_active() {
            return self.pass_through(&request).await;
        }
        match self.route(&request) {
            Route::Shell => self.network_first(&request).await,
            Route::StaticAsset => self.stale_while_revalidate(&request).await,
            Route::PassThrough => self.pass_through(&request).await,
        }
    }

    fn route(&self, request: &FetchRequest) -> Route {
        if request.method != Method::GET {
            return Route::PassThrough;
        }
        let path = request.path();
        if APP_SHELL.contains(&path) {
            return Route::Shell;
        }
        if path.starts_with(ASSET_PREFIX) {
            return Route::StaticAsset;
        }
        Route::PassThrough
    }

    /// Network-first: live response wins, cache is the offline fallback
    async fn network_first(&self, request: &FetchRequest) -> Result<FetchResponse, AppError> {
        let path = request.path().to_string();
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    // Fire-and-forget: the caller gets the live response
                    // without waiting on the cache write.
                    self.spawn_put(path, response.clone());
                }
                Ok(response)
            }
            Err(e) => {
                tracing::debug!(path = %path, "shell fetch failed, trying cache: {}", e);
                match self.lookup(&path) {
                    Some(cached) => Ok(cached),
                    None => Err(AppError::transport(format!(
                        "upstream unreachable and no cached copy of {path}"
                    ))),
                }
            }
        }
    }

    /// Stale-while-revalidate: cached copy now, fresh copy for next time
    async fn stale_while_revalidate(&self, request: &FetchRequest) -> Result<FetchResponse, AppError> {
        let path = request.path().to_string();
        match self.lookup(&path) {
            Some(cached) => {
                self.spawn_revalidate(request.clone());
                Ok(cached)
            }
            None => {
                let response = self
                    .fetcher
                    .fetch(request)
                    .await
                    .map_err(|e| AppError::transport(e.to_string()))?;
                if response.is_success() {
                    self.put_best_effort(&path, &response);
                }
                Ok(response)
            }
        }
    }

    /// Untouched forwarding for everything the cache does not own
    async fn pass_through(&self, request: &FetchRequest) -> Result<FetchResponse, AppError> {
        self.fetcher
            .fetch(request)
            .await
            .map_err(|e| AppError::transport(e.to_string()))
    }

    /// A broken cache read is treated as a miss, never an error
    fn lookup(&self, path: &str) -> Option<FetchResponse> {
        match self.storage.lookup(&self.cache_name, path) {
            Ok(hit) => hit,
            Err(e) => {
                tracing::debug!(path, "cache lookup failed, treating as miss: {}", e);
                None
            }
        }
    }

    fn put_best_effort(&self, path: &str, response: &FetchResponse) {
        if let Err(e) = self.storage.put(&self.cache_name, path, response) {
            // Swallowed: a failed cache write must not fail the fetch.
            tracing::debug!(path, "cache write failed (ignored): {}", e);
        }
    }

    fn spawn_put(&self, path: String, response: FetchResponse) {
        let storage = self.storage.clone();
        let cache = self.cache_name.clone();
        tokio::spawn(async move {
            if let Err(e) = storage.put(&cache, &path, &response) {
                tracing::debug!(path = %path, "cache write failed (ignored): {}", e);
            }
        });
    }

    /// Refresh one asset in the background, at most one fetch in flight per
    /// path
    fn spawn_revalidate(&self, request: FetchRequest) {
        let path = request.path().to_string();
        if self.revalidating.insert(path.clone(), ()).is_some() {
            return;
        }
        let storage = self.storage.clone();
        let fetcher = self.fetcher.clone();
        let cache = self.cache_name.clone();
        let in_flight = self.revalidating.clone();
        tokio::spawn(async move {
            match fetcher.fetch(&request).await {
                Ok(response) if response.is_success() => {
                    if let Err(e) = storage.put(&cache, &path, &response) {
                        tracing::debug!(path = %path, "revalidation write failed (ignored): {}", e);
                    }
                }
                Ok(response) => {
                    tracing::debug!(path = %path, status = response.status, "revalidation skipped");
                }
                Err(e) => {
                    tracing::debug!(path = %path, "revalidation fetch failed: {}", e);
                }
            }
            in_flight.remove(&path);
        });
    }
}
