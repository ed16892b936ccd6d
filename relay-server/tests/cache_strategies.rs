//! Cache behavior across restarts and deploys, on a real on-disk database

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use relay_server::cache::{
    CacheManager, CacheStorage, FetchError, FetchRequest, FetchResponse, Fetcher,
};

/// Scripted upstream with an offline switch
#[derive(Default)]
struct ScriptedFetcher {
    responses: Mutex<HashMap<String, FetchResponse>>,
    offline: AtomicBool,
}

impl ScriptedFetcher {
    fn set(&self, path: &str, body: &str) {
        self.responses.lock().insert(
            path.to_string(),
            FetchResponse {
                status: 200,
                content_type: Some("text/html".to_string()),
                body: body.as_bytes().to_vec(),
            },
        );
    }

    fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Network("offline".to_string()));
        }
        self.responses
            .lock()
            .get(request.path())
            .cloned()
            .ok_or_else(|| FetchError::Network("no route".to_string()))
    }
}

#[tokio::test]
async fn test_shell_survives_restart_offline() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cache.redb");
    let fetcher = Arc::new(ScriptedFetcher::default());
    fetcher.set("/", "shell v1");
    fetcher.set("/index.html", "index v1");

    // First run: install while online
    {
        let storage = Arc::new(CacheStorage::open(&db_path).unwrap());
        let manager = CacheManager::new(storage, fetcher.clone(), "v1");
        manager.install().await;
        manager.activate().await;
    }

    // Second run: the terminal reboots with no connectivity
    fetcher.set_offline(true);
    let storage = Arc::new(CacheStorage::open(&db_path).unwrap());
    let manager = CacheManager::new(storage, fetcher.clone(), "v1");
    manager.activate().await;

    let res = manager.handle(FetchRequest::get("/")).await.unwrap();
    assert_eq!(res.body, b"shell v1");
    let res = manager.handle(FetchRequest::get("/index.html")).await.unwrap();
    assert_eq!(res.body, b"index v1");
}

#[tokio::test]
async fn test_deploy_bump_invalidates_old_cache() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cache.redb");
    let fetcher = Arc::new(ScriptedFetcher::default());
    fetcher.set("/", "shell v1");

    {
        let storage = Arc::new(CacheStorage::open(&db_path).unwrap());
        let manager = CacheManager::new(storage, fetcher.clone(), "v1");
        manager.install().await;
        manager.activate().await;
    }

    // New deploy: version token bumped, activation prunes the old cache
    fetcher.set("/", "shell v2");
    let storage = Arc::new(CacheStorage::open(&db_path).unwrap());
    let manager = CacheManager::new(storage.clone(), fetcher.clone(), "v2");
    manager.install().await;
    manager.activate().await;

    let names = storage.cache_names().unwrap();
    assert_eq!(names, vec![manager.cache_name().to_string()]);

    // Offline fallback now serves the new shell, not the stale one
    fetcher.set_offline(true);
    let res = manager.handle(FetchRequest::get("/")).await.unwrap();
    assert_eq!(res.body, b"shell v2");
}

#[tokio::test]
async fn test_activate_now_refreshes_without_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cache.redb");
    let fetcher = Arc::new(ScriptedFetcher::default());
    fetcher.set("/", "build 1");

    let storage = Arc::new(CacheStorage::open(&db_path).unwrap());
    let manager = CacheManager::new(storage, fetcher.clone(), "v1");
    manager.install().await;
    manager.activate().await;

    // A new build lands upstream; the explicit signal pulls it in
    fetcher.set("/", "build 2");
    manager.activate_now().await;

    fetcher.set_offline(true);
    let res = manager.handle(FetchRequest::get("/")).await.unwrap();
    assert_eq!(res.body, b"build 2");
}

#[tokio::test]
async fn test_asset_revalidation_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cache.redb");
    let fetcher = Arc::new(ScriptedFetcher::default());
    fetcher.set("/assets/index.js", "bundle 1");

    let storage = Arc::new(CacheStorage::open(&db_path).unwrap());
    let manager = CacheManager::new(storage.clone(), fetcher.clone(), "v1");
    manager.activate().await;

    let res = manager
        .handle(FetchRequest::get("/assets/index.js"))
        .await
        .unwrap();
    assert_eq!(res.body, b"bundle 1");

    fetcher.set("/assets/index.js", "bundle 2");

    // Stale copy served, revalidation replaces it in the background
    let res = manager
        .handle(FetchRequest::get("/assets/index.js"))
        .await
        .unwrap();
    assert_eq!(res.body, b"bundle 1");

    let cache_name = manager.cache_name().to_string();
    for _ in 0..200 {
        tokio::task::yield_now().await;
        if let Ok(Some(hit)) = storage.lookup(&cache_name, "/assets/index.js") {
            if hit.body == b"bundle 2" {
                return;
            }
        }
    }
    panic!("revalidation never landed");
}
