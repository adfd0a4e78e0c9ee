//! # Audio Resource Cache
//!
//! Client-side caching for flashcard pronunciation audio.
//!
//! ## Overview
//!
//! Study sessions play short TTS clips over and over. This crate keeps them
//! close at hand with two tiers and a resolution chain:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │          FetchCoordinator            │
//! │  - resolve()                         │
//! │  - preload()                         │
//! │  - hydrate()                         │
//! └────────┬─────────────────────────────┘
//!          │
//!          ├──> ResourceCache   (in-memory, bounded, FIFO eviction)
//!          ├──> DurableMirror   (KeyValueStore, base64 + integrity hash)
//!          ├──> HttpClient      (GET /tts, GET /preload_deck_audio)
//!          └──> SpeechSynthesizer (degraded local fallback, not cached)
//! ```
//!
//! Every failure path degrades instead of propagating: a dead network falls
//! through to the synthesizer, a full durable store skips the write and keeps
//! the in-memory entry authoritative for the session.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_audio::{AudioCacheConfig, CacheKey, FetchCoordinator, Resolution};
//!
//! # async fn example(http: std::sync::Arc<dyn bridge_traits::HttpClient>,
//! #                  kv: std::sync::Arc<dyn bridge_traits::KeyValueStore>) {
//! let coordinator = FetchCoordinator::new(AudioCacheConfig::default(), http, kv)?;
//!
//! let key = CacheKey::new("de", "Guten Morgen");
//! match coordinator.resolve(&key).await {
//!     Resolution::Resolved { audio, source } => play(audio, source),
//!     Resolution::Unavailable => show_muted_icon(),
//! }
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod key;
pub mod mirror;
pub mod stats;

pub use cache::{AudioResource, ReleaseHook, ResourceCache};
pub use config::AudioCacheConfig;
pub use coordinator::{FetchCoordinator, Resolution, ResolutionSource};
pub use error::{AudioCacheError, Result};
pub use key::CacheKey;
pub use mirror::{DurableMirror, PersistOutcome};
pub use stats::{CacheStats, PreloadReport};
