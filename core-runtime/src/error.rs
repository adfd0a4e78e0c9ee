//! Runtime infrastructure error type.
//!
//! Covers failures of the shared plumbing itself (logging setup, filter
//! parsing). Domain failures have their own types in the feature crates
//! (`core_audio::AudioCacheError`, `core_offline::OfflineError`), and host
//! capability problems surface as `bridge_traits::BridgeError`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A runtime configuration value could not be applied, e.g. a malformed
    /// log filter expression.
    #[error("Invalid runtime configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
