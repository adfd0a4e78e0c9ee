//! # Offline Response Cache
//!
//! Keeps the flashcard app usable without a network: an [`OfflineWorker`]
//! mirrors the service-worker lifecycle (install, activate, fetch
//! interception, messages) over pluggable [`ResponseStore`] caches.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_offline::{FetchRequest, MemoryResponseStore, OfflineConfig, OfflineWorker};
//!
//! # async fn example(http: std::sync::Arc<dyn bridge_traits::HttpClient>) -> core_offline::Result<()> {
//! let worker = OfflineWorker::new(OfflineConfig::default(), http, MemoryResponseStore::new())?;
//! worker.install().await?;
//! worker.activate().await?;
//!
//! let outcome = worker
//!     .handle_fetch(&FetchRequest::get("http://localhost:8000/decks"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod request;
pub mod store;
pub mod worker;

pub use config::OfflineConfig;
pub use error::{OfflineError, Result};
pub use request::{classify, FetchRequest, RequestMode, RouteClass};
pub use store::{MemoryResponseStore, ResponseStore, StoredResponse};
pub use worker::{FetchOutcome, OfflineWorker, ServedFrom, WorkerMessage, WorkerState};
