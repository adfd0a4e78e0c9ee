//! Audio cache configuration.

use std::time::Duration;

/// Configuration for the fetch coordinator and its cache tiers.
#[derive(Debug, Clone)]
pub struct AudioCacheConfig {
    /// Base URL of the flashcard backend (default: `http://localhost:8000`).
    pub base_url: String,

    /// Maximum entries held in the in-memory cache (default: 100).
    pub max_entries: usize,

    /// Largest payload the durable mirror will persist, in bytes
    /// (default: 512 KiB). Larger audio stays memory-only.
    pub max_mirror_entry_bytes: usize,

    /// Verify the stored integrity hash when reading durable entries
    /// (default: true).
    pub verify_integrity: bool,

    /// Per-request timeout for audio fetches (default: 10s).
    pub request_timeout: Duration,

    /// Concurrent fetches allowed during a deck preload (default: 4).
    pub max_concurrent_fetches: usize,
}

impl Default for AudioCacheConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            max_entries: 100,
            max_mirror_entry_bytes: 512 * 1024,
            verify_integrity: true,
            request_timeout: Duration::from_secs(10),
            max_concurrent_fetches: 4,
        }
    }
}

impl AudioCacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the in-memory entry bound.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set the durable-mirror per-entry size cap.
    pub fn with_max_mirror_entry_bytes(mut self, bytes: usize) -> Self {
        self.max_mirror_entry_bytes = bytes;
        self
    }

    /// Enable or disable integrity verification on durable reads.
    pub fn with_integrity_verification(mut self, enabled: bool) -> Self {
        self.verify_integrity = enabled;
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the preload concurrency limit.
    pub fn with_max_concurrent_fetches(mut self, count: usize) -> Self {
        self.max_concurrent_fetches = count;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("base_url cannot be empty".to_string());
        }

        if self.max_entries == 0 {
            return Err("max_entries must be greater than 0".to_string());
        }

        if self.max_concurrent_fetches == 0 {
            return Err("max_concurrent_fetches must be at least 1".to_string());
        }

        Ok(())
    }

    /// Base URL without a trailing slash, for joining routes.
    pub(crate) fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
