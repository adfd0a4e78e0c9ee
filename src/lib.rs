//! Workspace facade crate.
//!
//! Re-exports the workspace crates behind feature flags so a host
//! application can depend on `flashaudio-workspace` and enable what it needs
//! (`audio-cache`, `offline`, `desktop-shims`) without wiring each crate
//! individually.

#[cfg(feature = "audio-cache")]
pub use core_audio;

#[cfg(feature = "offline")]
pub use core_offline;

#[cfg(any(feature = "audio-cache", feature = "offline"))]
pub use core_runtime;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;
