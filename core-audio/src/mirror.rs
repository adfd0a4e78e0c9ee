//! Durable mirror of small audio payloads.
//!
//! Best-effort second tier: audio worth keeping across sessions is serialized
//! into a quota-limited [`KeyValueStore`] under the same key the in-memory
//! cache uses. Writes never propagate failure; the explicit
//! [`PersistOutcome`] tells callers (and tests) which branch was taken while
//! the in-memory entry stays authoritative either way.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bridge_traits::{BridgeError, KeyValueStore};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{AudioResource, ResourceCache};
use crate::key::CacheKey;

/// Serialized form of a mirrored resource.
#[derive(Debug, Serialize, Deserialize)]
struct DurableEntry {
    /// Base64-encoded audio payload.
    payload: String,
    content_type: String,
    /// SHA-256 of the decoded payload, hex-encoded.
    sha256: String,
    created_at: DateTime<Utc>,
}

/// Result of a durable write. Never an `Err`: quota and serialization
/// problems are ordinary outcomes here, not failures to propagate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The entry is on disk.
    Persisted,
    /// Payload exceeds the per-entry size cap; skipped.
    TooLarge,
    /// The store refused the write for lack of space.
    QuotaExceeded,
    /// Serialization or store failure.
    Failed(String),
}

impl PersistOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, PersistOutcome::Persisted)
    }
}

/// Durable second cache tier over a [`KeyValueStore`].
pub struct DurableMirror {
    store: Arc<dyn KeyValueStore>,
    max_entry_bytes: usize,
    verify_integrity: bool,
}

impl DurableMirror {
    pub fn new(store: Arc<dyn KeyValueStore>, max_entry_bytes: usize) -> Self {
        Self {
            store,
            max_entry_bytes,
            verify_integrity: true,
        }
    }

    /// Disable integrity verification on reads.
    pub fn with_integrity_verification(mut self, enabled: bool) -> Self {
        self.verify_integrity = enabled;
        self
    }

    /// Persist a resource under the key's durable form.
    pub async fn write(&self, key: &CacheKey, resource: &AudioResource) -> PersistOutcome {
        if resource.len() > self.max_entry_bytes {
            debug!(key = %key, bytes = resource.len(), "Skipping durable write, payload too large");
            return PersistOutcome::TooLarge;
        }

        let entry = DurableEntry {
            payload: BASE64.encode(&resource.bytes),
            content_type: resource.content_type.clone(),
            sha256: hash_hex(&resource.bytes),
            created_at: Utc::now(),
        };

        let serialized = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize durable entry");
                return PersistOutcome::Failed(e.to_string());
            }
        };

        match self.store.set(&key.storage_key(), &serialized).await {
            Ok(()) => {
                debug!(key = %key, bytes = resource.len(), "Mirrored audio durably");
                PersistOutcome::Persisted
            }
            Err(BridgeError::QuotaExceeded(reason)) => {
                debug!(key = %key, %reason, "Durable store quota exhausted");
                PersistOutcome::QuotaExceeded
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Durable write failed");
                PersistOutcome::Failed(e.to_string())
            }
        }
    }

    /// Read a mirrored resource back, verifying integrity.
    ///
    /// Malformed or corrupted entries are treated as absent and removed
    /// best-effort so they do not poison future reads.
    pub async fn read(&self, key: &CacheKey) -> Option<AudioResource> {
        let storage_key = key.storage_key();

        let raw = match self.store.get(&storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Durable read failed");
                return None;
            }
        };

        let entry: DurableEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "Malformed durable entry, discarding");
                self.discard(&storage_key).await;
                return None;
            }
        };

        let bytes = match BASE64.decode(&entry.payload) {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                warn!(key = %key, error = %e, "Undecodable durable payload, discarding");
                self.discard(&storage_key).await;
                return None;
            }
        };

        if self.verify_integrity && hash_hex(&bytes) != entry.sha256 {
            warn!(key = %key, "Durable entry failed integrity check, discarding");
            self.discard(&storage_key).await;
            return None;
        }

        Some(AudioResource::new(bytes, entry.content_type))
    }

    /// Best-effort delete; absence and store errors are ignored.
    pub async fn remove(&self, key: &CacheKey) {
        self.discard(&key.storage_key()).await;
    }

    /// Whether a durable entry exists for the key (without decoding it).
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.store
            .contains(&key.storage_key())
            .await
            .unwrap_or(false)
    }

    /// Pull existing durable entries for the given texts into the in-memory
    /// cache. Pure population: an already-present in-memory entry is never
    /// overwritten, and no network traffic is issued. Returns the number of
    /// entries promoted.
    pub async fn hydrate(&self, texts: &[String], lang: &str, cache: &mut ResourceCache) -> usize {
        let mut promoted = 0;

        for text in texts {
            let key = CacheKey::new(lang, text.clone());
            if cache.contains(&key) {
                continue;
            }
            if let Some(resource) = self.read(&key).await {
                cache.put(key, resource);
                promoted += 1;
            }
        }

        if promoted > 0 {
            debug!(promoted, lang, "Hydrated audio cache from durable mirror");
        }
        promoted
    }

    async fn discard(&self, storage_key: &str) {
        if let Err(e) = self.store.remove(storage_key).await {
            debug!(key = storage_key, error = %e, "Best-effort durable delete failed");
        }
    }
}

fn hash_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
