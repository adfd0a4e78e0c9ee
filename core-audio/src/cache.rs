//! Bounded in-memory resource cache.
//!
//! Insertion-ordered map from [`CacheKey`] to a playable handle, bounded at a
//! fixed entry count. Eviction is strictly first-in-first-out by insertion
//! order, not LRU: a hot entry inserted first still goes first. That matches
//! the shipped behavior this cache replaces and is covered by tests; do not
//! "upgrade" it to recency-based eviction without a product decision.
//!
//! All operations are synchronous and never await, so callers on one task see
//! their own writes in issue order.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::key::CacheKey;

/// Invoked exactly once for every entry that leaves the cache (overwrite,
/// removal, eviction, clear). The host uses this to free the native resource
/// behind the handle, e.g. revoking an object URL.
pub type ReleaseHook = Arc<dyn Fn(&CacheKey) + Send + Sync>;

/// A playable audio handle.
#[derive(Debug, Clone)]
pub struct AudioResource {
    pub bytes: Bytes,
    pub content_type: String,
}

impl AudioResource {
    pub fn new(bytes: Bytes, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// MP3 handle, the format the TTS endpoint serves.
    pub fn mpeg(bytes: Bytes) -> Self {
        Self::new(bytes, "audio/mpeg")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Bounded, insertion-ordered audio cache.
pub struct ResourceCache {
    entries: HashMap<CacheKey, AudioResource>,
    order: VecDeque<CacheKey>,
    max_entries: usize,
    release_hook: Option<ReleaseHook>,
    evictions: u64,
}

impl ResourceCache {
    /// Create a cache bounded at `max_entries`.
    ///
    /// A bound of zero is coerced to one; an unbounded cache is never what a
    /// playback surface wants.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_entries: max_entries.max(1),
            release_hook: None,
            evictions: 0,
        }
    }

    /// Install a release hook for native resources.
    pub fn with_release_hook(mut self, hook: ReleaseHook) -> Self {
        self.release_hook = Some(hook);
        self
    }

    /// Replace the release hook after construction.
    pub fn set_release_hook(&mut self, hook: ReleaseHook) {
        self.release_hook = Some(hook);
    }

    /// Look up an entry. No side effects: a hit does not refresh the entry's
    /// position in eviction order.
    pub fn get(&self, key: &CacheKey) -> Option<&AudioResource> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or overwrite an entry, then evict oldest entries until the
    /// cache is back within its bound. Returns the keys evicted by this
    /// insertion, oldest first.
    ///
    /// Overwriting releases the previous handle but keeps the key's original
    /// insertion position, mirroring ordered-map semantics.
    pub fn put(&mut self, key: CacheKey, resource: AudioResource) -> Vec<CacheKey> {
        if self.entries.contains_key(&key) {
            // Release before the old handle is discarded
            self.release(&key);
            self.entries.insert(key, resource);
        } else {
            self.entries.insert(key.clone(), resource);
            self.order.push_back(key);
        }

        let mut evicted = Vec::new();
        while self.entries.len() > self.max_entries {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if self.entries.remove(&oldest).is_some() {
                self.release(&oldest);
                self.evictions += 1;
                debug!(key = %oldest, "Evicted oldest cache entry");
                evicted.push(oldest);
            }
        }
        evicted
    }

    /// Remove an entry, releasing its handle. Returns whether it was present.
    pub fn remove(&mut self, key: &CacheKey) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
            self.release(key);
            true
        } else {
            false
        }
    }

    /// Release and drop every entry.
    pub fn clear(&mut self) {
        let keys: Vec<CacheKey> = self.order.drain(..).collect();
        self.entries.clear();
        for key in &keys {
            self.release(key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Keys in insertion order, oldest first.
    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.order.iter()
    }

    /// Entries evicted over the cache's lifetime.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    fn release(&self, key: &CacheKey) {
        if let Some(hook) = &self.release_hook {
            hook(key);
        }
    }
}
