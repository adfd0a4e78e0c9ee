//! # Audio Cache Error Types

use thiserror::Error;

/// Errors that can occur in the audio cache subsystem.
///
/// Most operations here are fail-soft by contract and report trouble through
/// outcome enums ([`PersistOutcome`](crate::mirror::PersistOutcome),
/// [`Resolution`](crate::coordinator::Resolution)) instead of `Err`. This type
/// covers the remaining genuinely erroneous states.
#[derive(Error, Debug)]
pub enum AudioCacheError {
    /// Cache configuration failed validation.
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),

    /// The TTS endpoint or a preload URL could not be fetched.
    #[error("Network fetch failed: {0}")]
    Network(String),
}

/// Result type for audio cache operations.
pub type Result<T> = std::result::Result<T, AudioCacheError>;
