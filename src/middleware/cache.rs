use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Clone, Debug)]
pub struct CachedResponse {
    content_type: Option<HeaderValue>,
    body: Bytes,
    stored_at: Instant,
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, self.body).into_response();
        if let Some(content_type) = self.content_type {
            response.headers_mut().insert(CONTENT_TYPE, content_type);
        }
        response
    }
}

/// In-process TTL cache of successful GET responses, keyed on path and query
#[derive(Clone)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, CachedResponse>>,
    enabled: bool,
    ttl: Duration,
    max_entries: usize,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            enabled: config.enabled,
            ttl: Duration::from_secs(config.ttl_secs),
            max_entries: config.max_entries,
        }
    }

    pub fn key_for(uri: &Uri) -> String {
        let mut hasher = Sha256::new();
        hasher.update(uri.path().as_bytes());
        hasher.update(b"?");
        hasher.update(uri.query().unwrap_or("").as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        let entry = self.entries.get(key)?;
        if entry.stored_at.elapsed() < self.ttl {
            return Some(entry.value().clone());
        }
        // Release the shard lock before removing
        drop(entry);
        self.entries.remove(key);
        None
    }

    pub fn insert(&self, key: String, content_type: Option<HeaderValue>, body: Bytes) {
        if self.entries.len() >= self.max_entries {
            let ttl = self.ttl;
            self.entries.retain(|_, v| v.stored_at.elapsed() < ttl);
            if self.entries.len() >= self.max_entries {
                tracing::warn!("Response cache full ({} entries), not caching", self.entries.len());
                return;
            }
        }
        self.entries.insert(
            key,
            CachedResponse {
                content_type,
                body,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serves repeated GETs from the cache; populates it from 200 responses only
pub async fn cache_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let cache = &state.cache;
    if !cache.enabled || request.method() != Method::GET {
        return Ok(next.run(request).await);
    }

    let key = ResponseCache::key_for(request.uri());
    if let Some(hit) = cache.get(&key) {
        tracing::debug!("Cache hit for {}", request.uri());
        return Ok(hit.into_response());
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return Ok(response);
    }

    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.map_err(|e| {
        tracing::error!("Failed to buffer response for caching: {}", e);
        ApiError::internal_server_error("Failed to read response body")
    })?;
    cache.insert(key, parts.headers.get(CONTENT_TYPE).cloned(), bytes.clone());

    Ok(Response::from_parts(parts, Body::from(bytes)))
}
