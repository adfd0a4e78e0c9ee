//! Durable Key/Value Storage Abstraction
//!
//! Abstracts the browser-style origin storage the durable audio mirror writes
//! into:
//! - Web: localStorage / IndexedDB
//! - Desktop: SQLite-backed store (`bridge-desktop`)
//! - Tests: in-memory map with a configurable quota
//!
//! Stores are size-constrained. Writes that would exceed the quota fail with
//! [`BridgeError::QuotaExceeded`](crate::error::BridgeError); callers are
//! expected to treat that as a soft failure, not a fatal one.

use async_trait::async_trait;

use crate::error::Result;

/// String key/value storage with an origin-style quota.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::KeyValueStore;
///
/// async fn remember(store: &dyn KeyValueStore) -> Result<()> {
///     store.set("audio:de:Hund", "{\"payload\":\"...\"}").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Retrieve a value.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, overwriting any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::QuotaExceeded`](crate::error::BridgeError) when
    /// the write would push the store past its quota. The previous value for
    /// the key, if any, is left intact in that case.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key. Absence is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// List all stored keys.
    async fn keys(&self) -> Result<Vec<String>>;

    /// List keys starting with the given prefix.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = self.keys().await?;
        keys.retain(|k| k.starts_with(prefix));
        Ok(keys)
    }

    /// Check if a key exists without retrieving the value.
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Remove every stored key.
    async fn clear(&self) -> Result<()>;
}
