//! # Desktop Bridge Implementations
//!
//! Concrete desktop adapters for the bridge traits:
//! - [`ReqwestHttpClient`] - HTTP client with connection pooling and retry
//! - [`SqliteKeyValueStore`] - quota-limited durable key/value storage
//! - [`CommandSynthesizer`] - local TTS via an external program

pub mod http;
pub mod kv;
pub mod speech;

pub use http::ReqwestHttpClient;
pub use kv::SqliteKeyValueStore;
pub use speech::CommandSynthesizer;
