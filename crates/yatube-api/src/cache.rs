//! Whole-response cache for listing pages.
//!
//! Entries live for a fixed time-to-live and are never invalidated by
//! writes, so a page may lag behind new posts for up to one TTL.

use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use moka::future::Cache;
use tracing::{debug, error};

use crate::error::ApiError;
use crate::state::AppState;

const MAX_ENTRIES: u64 = 1_000;

/// A rendered response kept as opaque bytes.
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl IntoResponse for CachedPage {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        if let Some(content_type) = self.content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type);
        }
        response
    }
}

#[derive(Clone)]
pub struct PageCache {
    pages: Cache<String, CachedPage>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        let pages = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .build();
        Self { pages }
    }

    pub async fn get(&self, key: &str) -> Option<CachedPage> {
        self.pages.get(key).await
    }

    pub async fn insert(&self, key: String, page: CachedPage) {
        self.pages.insert(key, page).await;
    }
}

fn cache_key(req: &Request) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string())
}

/// Serves GET requests from `index_cache` when possible and stores
/// successful responses on a miss.
pub async fn cache_page(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }

    let key = cache_key(&req);
    if let Some(page) = state.index_cache.get(&key).await {
        debug!("Page cache hit for {}", key);
        return page.into_response();
    }

    let response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to buffer response for {}: {}", key, e);
            return ApiError::Internal(anyhow::anyhow!("buffering response: {}", e)).into_response();
        }
    };

    let page = CachedPage {
        content_type: parts.headers.get(header::CONTENT_TYPE).cloned(),
        body: body.clone(),
    };
    debug!("Page cache store for {} ({} bytes)", key, body.len());
    state.index_cache.insert(key, page).await;

    Response::from_parts(parts, Body::from(body))
}
