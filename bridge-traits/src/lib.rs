//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host
//! environment the flashcard audio core runs in.
//!
//! ## Overview
//!
//! This crate defines the contract between the core crates and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that is provided differently per host (desktop shim,
//! browser context, test harness).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry
//!
//! ### Storage
//! - [`KeyValueStore`](storage::KeyValueStore) - Durable string key/value
//!   storage with an origin-style quota (the localStorage equivalent)
//!
//! ### Audio
//! - [`SpeechSynthesizer`](speech::SpeechSynthesizer) - Local text-to-speech
//!   used as the degraded fallback when the TTS endpoint is unreachable
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should convert platform-specific errors to `BridgeError`
//! and provide actionable messages. Quota exhaustion in a `KeyValueStore` is
//! reported as [`BridgeError::QuotaExceeded`](error::BridgeError) so callers
//! can degrade instead of aborting.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod error;
pub mod http;
pub mod speech;
pub mod storage;

pub use error::{BridgeError, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use speech::SpeechSynthesizer;
pub use storage::KeyValueStore;
