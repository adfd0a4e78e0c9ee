//! # Offline Worker Error Types

use thiserror::Error;

/// Errors from the offline response cache worker.
#[derive(Error, Debug)]
pub enum OfflineError {
    /// Worker configuration failed validation.
    #[error("Invalid offline configuration: {0}")]
    InvalidConfig(String),

    /// The network request failed and no cached response could stand in.
    #[error("Request cannot be satisfied offline: {0}")]
    Unavailable(String),

    /// The network request failed for a route with no cache policy.
    #[error("Network request failed: {0}")]
    Network(String),

    /// The response store misbehaved.
    #[error("Response store error: {0}")]
    Store(String),
}

/// Result type for offline worker operations.
pub type Result<T> = std::result::Result<T, OfflineError>;
