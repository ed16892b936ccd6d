//! redb-based cache storage
//!
//! Each named cache is one redb table: key = request path, value =
//! JSON-serialized [`FetchResponse`]. Cache names carry the deploy version
//! token, so pruning stale deploys is just dropping every table whose name
//! differs from the current one. There is no TTL anywhere — version bumps
//! are the only invalidation mechanism.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, TableDefinition};
use thiserror::Error;

use super::fetcher::FetchResponse;

/// Cache storage errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

fn table(cache: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(cache)
}

/// Response cache backed by redb
///
/// Persistent across restarts: a terminal that reboots offline still has
/// whatever its last deploy cached.
#[derive(Clone)]
pub struct CacheStorage {
    db: Arc<Database>,
}

impl CacheStorage {
    /// Open or create the cache database at the given path
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let db = Database::create(path)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory cache database (for testing)
    pub fn open_in_memory() -> CacheResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Store a response under `path` in the named cache
    pub fn put(&self, cache: &str, path: &str, response: &FetchResponse) -> CacheResult<()> {
        let bytes = serde_json::to_vec(response)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut tbl = write_txn.open_table(table(cache))?;
            tbl.insert(path, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a cached response; a cache that was never written is a miss
    pub fn lookup(&self, cache: &str, path: &str) -> CacheResult<Option<FetchResponse>> {
        let read_txn = self.db.begin_read()?;
        let tbl = match read_txn.open_table(table(cache)) {
            Ok(tbl) => tbl,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        use redb::ReadableTable;
        let Some(guard) = tbl.get(path)? else {
            return Ok(None);
        };
        let response = serde_json::from_slice(guard.value())?;
        Ok(Some(response))
    }

    /// List every cache name present in the database
    pub fn cache_names(&self) -> CacheResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let names = read_txn
            .list_tables()?
            .map(|handle| handle.name().to_string())
            .collect();
        Ok(names)
    }

    /// Drop an entire named cache; returns whether it existed
    pub fn delete_cache(&self, cache: &str) -> CacheResult<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = write_txn.delete_table(table(cache))?;
        write_txn.commit()?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> FetchResponse {
        FetchResponse {
            status: 200,
            content_type: Some("text/html".to_string()),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_put_then_lookup() {
        let storage = CacheStorage::open_in_memory().unwrap();
        storage.put("shell-v1", "/", &response("<html>")).unwrap();

        let hit = storage.lookup("shell-v1", "/").unwrap().unwrap();
        assert_eq!(hit.body, b"<html>");
        assert_eq!(hit.status, 200);
    }

    #[test]
    fn test_missing_cache_is_a_miss() {
        let storage = CacheStorage::open_in_memory().unwrap();
        assert!(storage.lookup("never-written", "/").unwrap().is_none());
    }

    #[test]
    fn test_put_replaces() {
        let storage = CacheStorage::open_in_memory().unwrap();
        storage.put("shell-v1", "/a.js", &response("old")).unwrap();
        storage.put("shell-v1", "/a.js", &response("new")).unwrap();

        let hit = storage.lookup("shell-v1", "/a.js").unwrap().unwrap();
        assert_eq!(hit.body, b"new");
    }

    #[test]
    fn test_delete_cache_and_names() {
        let storage = CacheStorage::open_in_memory().unwrap();
        storage.put("shell-v1", "/", &response("1")).unwrap();
        storage.put("shell-v2", "/", &response("2")).unwrap();

        let mut names = storage.cache_names().unwrap();
        names.sort();
        assert_eq!(names, vec!["shell-v1", "shell-v2"]);

        assert!(storage.delete_cache("shell-v1").unwrap());
        assert!(!storage.delete_cache("shell-v1").unwrap());
        assert_eq!(storage.cache_names().unwrap(), vec!["shell-v2"]);
        assert!(storage.lookup("shell-v1", "/").unwrap().is_none());
    }
}
