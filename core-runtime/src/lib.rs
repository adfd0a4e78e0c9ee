//! # Core Runtime
//!
//! Shared runtime infrastructure for the flashcard audio core:
//! - [`logging`] - structured logging built on `tracing`
//! - [`events`] - typed broadcast event bus for cache activity
//! - [`error`] - runtime error type

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{AudioEvent, CoreEvent, EventBus, OfflineEvent};
pub use logging::{init_logging, LogFormat, LoggingConfig};
