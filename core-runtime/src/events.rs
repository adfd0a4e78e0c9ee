//! # Event Bus System
//!
//! Typed broadcast events for cache activity, built on
//! `tokio::sync::broadcast`. Modules emit events without knowing who (if
//! anyone) listens; hosts subscribe to drive UI badges ("available offline"),
//! diagnostics, or logging.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::events::{AudioEvent, CoreEvent, EventBus};
//!
//! let bus = EventBus::new(100);
//! let mut stream = bus.subscribe();
//!
//! bus.emit(CoreEvent::Audio(AudioEvent::Cached {
//!     key: "audio:de:Hund".to_string(),
//! }))
//! .ok();
//! ```

use tokio::sync::broadcast;

/// Events from the audio resource cache and fetch coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    /// A resource was fetched and stored in the in-memory cache.
    Cached { key: String },
    /// A durable entry was promoted into the in-memory cache.
    Promoted { key: String },
    /// An entry was evicted to keep the cache within its bound.
    Evicted { key: String },
    /// A durable-mirror write was not persisted.
    MirrorRejected { key: String, reason: String },
    /// The degraded local-synthesis fallback produced the audio.
    FallbackUsed { key: String },
    /// A deck preload finished.
    PreloadFinished {
        deck: String,
        fetched: usize,
        failed: usize,
    },
}

/// Events from the offline response cache worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfflineEvent {
    /// Precache finished; the worker is waiting to activate.
    Installed { precached: usize },
    /// Old cache generations were pruned; the worker is in control.
    Activated { removed_generations: Vec<String> },
    /// A waiting worker was told to take control immediately.
    SkipWaiting,
    /// A request was answered from cache instead of the network.
    ServedFromCache { request: String },
}

/// Top-level event type carried on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    Audio(AudioEvent),
    Offline(OfflineEvent),
}

/// Central broadcast channel for core events.
///
/// Cloning is cheap; all clones publish into the same channel. Emitting with
/// no subscribers is not an error worth surfacing, so callers typically
/// `.ok()` the result.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Create a bus whose subscribers buffer up to `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, broadcast::error::SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(128)
    }
}
