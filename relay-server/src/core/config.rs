//! Server configuration

/// Configuration for a terminal's relay gateway
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the gateway listens on
    pub listen_addr: String,
    /// Deployed web origin the cache manager fetches from
    pub upstream_origin: String,
    /// Directory holding the cache and order databases
    pub data_dir: String,
    /// Deploy version token; bumping it is the only cache invalidation
    pub cache_version: String,
    /// Order store backend: "embedded" or "memory"
    pub store_mode: String,
    /// Business timezone for wall-clock decisions
    pub timezone: String,
    /// Hour of day (local) at which previous-day completed orders clear
    pub clear_hour: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            upstream_origin: std::env::var("UPSTREAM_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "./relay-data".into()),
            cache_version: std::env::var("CACHE_VERSION").unwrap_or_else(|_| "v2".into()),
            store_mode: std::env::var("STORE_MODE").unwrap_or_else(|_| "embedded".into()),
            timezone: std::env::var("TIMEZONE").unwrap_or_else(|_| "Europe/London".into()),
            clear_hour: std::env::var("CLEAR_HOUR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
        }
    }

    pub fn cache_db_path(&self) -> String {
        format!("{}/cache.redb", self.data_dir)
    }

    pub fn orders_db_path(&self) -> String {
        format!("{}/orders.db", self.data_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
