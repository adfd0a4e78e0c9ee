//! Named response caches.
//!
//! The worker keeps whole HTTP responses in named caches so a request can be
//! replayed offline. The trait mirrors the durable-store seams in
//! `bridge-traits`: platforms back it with whatever persistence they have,
//! and [`MemoryResponseStore`] covers hosts (and tests) that only need the
//! current session.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::HttpResponse;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// A cached response, detached from any live connection.
#[derive(Debug, Clone)]
pub struct StoredResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
    pub stored_at: DateTime<Utc>,
}

impl StoredResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<&HttpResponse> for StoredResponse {
    fn from(response: &HttpResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            stored_at: Utc::now(),
        }
    }
}

impl From<StoredResponse> for HttpResponse {
    fn from(stored: StoredResponse) -> Self {
        Self {
            status: stored.status,
            headers: stored.headers,
            body: stored.body,
        }
    }
}

/// Named collections of cached responses, keyed by request.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Store a response under `key` in the named cache, creating the cache
    /// if it does not exist.
    async fn put(
        &self,
        cache: &str,
        key: &str,
        response: StoredResponse,
    ) -> bridge_traits::Result<()>;

    /// Look up a response in the named cache.
    async fn get(&self, cache: &str, key: &str) -> bridge_traits::Result<Option<StoredResponse>>;

    /// Delete an entire named cache. Returns whether it existed.
    async fn delete_cache(&self, cache: &str) -> bridge_traits::Result<bool>;

    /// Names of all caches currently present.
    async fn cache_names(&self) -> bridge_traits::Result<Vec<String>>;

    /// Number of responses in the named cache, zero if absent.
    async fn len(&self, cache: &str) -> bridge_traits::Result<usize>;
}

/// Session-scoped [`ResponseStore`] over nested hash maps.
#[derive(Default)]
pub struct MemoryResponseStore {
    caches: Mutex<HashMap<String, HashMap<String, StoredResponse>>>,
}

impl MemoryResponseStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl ResponseStore for MemoryResponseStore {
    async fn put(
        &self,
        cache: &str,
        key: &str,
        response: StoredResponse,
    ) -> bridge_traits::Result<()> {
        self.caches
            .lock()
            .entry(cache.to_string())
            .or_default()
            .insert(key.to_string(), response);
        Ok(())
    }

    async fn get(&self, cache: &str, key: &str) -> bridge_traits::Result<Option<StoredResponse>> {
        Ok(self
            .caches
            .lock()
            .get(cache)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn delete_cache(&self, cache: &str) -> bridge_traits::Result<bool> {
        Ok(self.caches.lock().remove(cache).is_some())
    }

    async fn cache_names(&self) -> bridge_traits::Result<Vec<String>> {
        Ok(self.caches.lock().keys().cloned().collect())
    }

    async fn len(&self, cache: &str) -> bridge_traits::Result<usize> {
        Ok(self
            .caches
            .lock()
            .get(cache)
            .map(|entries| entries.len())
            .unwrap_or(0))
    }
}
