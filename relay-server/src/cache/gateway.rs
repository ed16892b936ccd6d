//! Gateway fallback route
//!
//! Every request that no API route claims lands here and goes through the
//! cache manager, which decides per route whether the network, the cache,
//! or both get involved. Invoked by the router, never called directly by
//! application code.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use shared::error::AppError;

use super::fetcher::{FetchRequest, FetchResponse};
use crate::core::ServerState;

/// Upper bound on forwarded request bodies
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub async fn handle(State(state): State<ServerState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            return AppError::validation(format!("unreadable request body: {e}")).into_response();
        }
    };

    let fetch = FetchRequest {
        method: parts.method,
        path_and_query,
        body,
    };

    match state.cache.handle(fetch).await {
        Ok(response) => into_http(response),
        Err(err) => err.into_response(),
    }
}

fn into_http(response: FetchResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = Response::builder().status(status);
    if let Some(content_type) = &response.content_type {
        builder = builder.header(http::header::CONTENT_TYPE, content_type);
    }
    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
