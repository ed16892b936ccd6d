//! Upstream fetch abstraction
//!
//! The cache manager talks to the deployed web origin through this trait so
//! tests can substitute a scripted fetcher, the same way the message layer
//! swaps transports.

use async_trait::async_trait;
use http::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An outbound request seen by the cache manager
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    /// Path plus query string, e.g. `/assets/index-BjT9qYmF.js`
    pub path_and_query: String,
    /// Forwarded request body; empty for GETs
    pub body: Vec<u8>,
}

impl FetchRequest {
    /// A bodyless GET for the given path
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path_and_query: path.into(),
            body: Vec::new(),
        }
    }

    /// The path without the query string
    pub fn path(&self) -> &str {
        self.path_and_query
            .split_once('?')
            .map(|(path, _)| path)
            .unwrap_or(&self.path_and_query)
    }
}

/// An upstream response, also the unit stored in the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetch errors — the network was unreachable or the connection died
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
}

/// Upstream HTTP access
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// Production fetcher backed by reqwest
pub struct HttpFetcher {
    client: reqwest::Client,
    /// Upstream origin, e.g. `https://relay.example.app`
    upstream: String,
}

impl HttpFetcher {
    pub fn new(upstream: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            upstream: upstream.into(),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let url = format!("{}{}", self.upstream, request.path_and_query);
        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?
            .to_vec();

        Ok(FetchResponse {
            status,
            content_type,
            body,
        })
    }
}
