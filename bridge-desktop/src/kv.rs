//! Durable Key/Value Storage using SQLite
//!
//! Desktop counterpart of browser origin storage. Values are plain strings;
//! the store enforces a total-size quota the way a browser enforces the
//! localStorage limit, so core code exercises the same quota-exhaustion path
//! on every platform.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::KeyValueStore,
};
use sqlx::{sqlite::SqlitePool, Row};
use std::path::PathBuf;
use tracing::debug;

/// Default quota, loosely matching the common 5 MiB localStorage limit.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// SQLite-backed key/value store with a byte quota.
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
    quota_bytes: u64,
}

impl SqliteKeyValueStore {
    /// Create a new store with the given database path and default quota.
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        Self::with_quota(db_path, DEFAULT_QUOTA_BYTES).await
    }

    /// Create a new store with an explicit quota in bytes.
    pub async fn with_quota(db_path: PathBuf, quota_bytes: u64) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        // Backslashes are not valid in a SQLite URL
        let path_str = db_path.to_string_lossy().replace('\\', "/");
        let db_url = format!("sqlite://{}?mode=rwc", path_str);

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to connect to DB: {}", e)))?;

        Self::initialize(&pool).await?;

        debug!(path = ?db_path, quota_bytes, "Initialized key/value store");

        Ok(Self { pool, quota_bytes })
    }

    /// Create an in-memory store (for testing).
    pub async fn in_memory(quota_bytes: u64) -> Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to connect to DB: {}", e)))?;

        Self::initialize(&pool).await?;

        Ok(Self { pool, quota_bytes })
    }

    /// Store placed under the platform data directory.
    pub async fn in_data_dir(app_name: &str) -> Result<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| BridgeError::NotAvailable("No data directory on this host".into()))?;
        Self::new(base.join(app_name).join("kv.sqlite")).await
    }

    async fn initialize(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to create table: {}", e)))?;
        Ok(())
    }

    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    /// Total bytes currently stored (keys plus values).
    pub async fn used_bytes(&self) -> Result<u64> {
        let row =
            sqlx::query("SELECT COALESCE(SUM(LENGTH(key) + LENGTH(value)), 0) AS used FROM kv")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| BridgeError::OperationFailed(format!("Failed to query size: {}", e)))?;
        let used: i64 = row.get("used");
        Ok(used.max(0) as u64)
    }

    /// Bytes the given key currently occupies, zero if absent.
    async fn entry_bytes(&self, key: &str) -> Result<u64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(LENGTH(key) + LENGTH(value)), 0) AS used FROM kv WHERE key = ?",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to query entry: {}", e)))?;
        let used: i64 = row.get("used");
        Ok(used.max(0) as u64)
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to get value: {}", e)))?;

        Ok(row.map(|r| r.get("value")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let incoming = (key.len() + value.len()) as u64;
        let used = self.used_bytes().await?;
        let replaced = self.entry_bytes(key).await?;

        if used - replaced + incoming > self.quota_bytes {
            return Err(BridgeError::QuotaExceeded(format!(
                "write of {} bytes exceeds quota of {} bytes ({} in use)",
                incoming, self.quota_bytes, used
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Self::now())
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to set value: {}", e)))?;

        debug!(key = key, bytes = value.len(), "Stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to remove value: {}", e)))?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM kv ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to list keys: {}", e)))?;

        Ok(rows.iter().map(|r| r.get("key")).collect())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        // LIKE special characters in the prefix would change the match, so
        // filter in Rust instead of binding a LIKE pattern.
        let mut keys = self.keys().await?;
        keys.retain(|k| k.starts_with(prefix));
        Ok(keys)
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM kv")
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to clear store: {}", e)))?;
        Ok(())
    }
}
