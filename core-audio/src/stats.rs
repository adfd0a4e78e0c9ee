//! Cache statistics and preload reporting.

use serde::{Deserialize, Serialize};

/// Counters for resolution activity, snapshotted via
/// [`FetchCoordinator::stats`](crate::coordinator::FetchCoordinator::stats).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Resolutions answered from the in-memory cache.
    pub memory_hits: u64,
    /// Resolutions promoted from the durable mirror.
    pub mirror_promotions: u64,
    /// Resolutions that went to the network.
    pub network_fetches: u64,
    /// Resolutions served by the local-synthesis fallback.
    pub fallbacks: u64,
    /// Resolutions that exhausted every tier.
    pub unavailable: u64,
    /// Durable-mirror writes that were not persisted.
    pub mirror_rejections: u64,
    /// In-memory entries evicted to stay within the configured bound.
    pub evictions: u64,
}

impl CacheStats {
    /// Total resolve calls observed.
    pub fn resolutions(&self) -> u64 {
        self.memory_hits + self.mirror_promotions + self.network_fetches + self.fallbacks
            + self.unavailable
    }

    /// Fraction of resolutions that avoided the network, in [0, 1].
    pub fn offline_ratio(&self) -> f64 {
        let total = self.resolutions();
        if total == 0 {
            return 0.0;
        }
        (self.memory_hits + self.mirror_promotions) as f64 / total as f64
    }
}

/// Outcome of a deck preload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadReport {
    /// Members listed in the deck manifest.
    pub requested: usize,
    /// Members skipped because a cache tier already held them.
    pub already_cached: usize,
    /// Members fetched and cached during this preload.
    pub fetched: usize,
    /// Members whose fetch failed; the rest of the batch is unaffected.
    pub failed: usize,
}

impl PreloadReport {
    /// `true` when every requested member ended up obtainable.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}
