//! Local Speech Synthesis Abstraction
//!
//! The degraded-mode fallback for audio playback: when the TTS endpoint and
//! every cache tier come up empty, the core asks the host to synthesize the
//! word locally (Web Speech API in a browser, an external TTS program on
//! desktop). Output from this path is played once and never cached.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Best-effort local text-to-speech.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::speech::SpeechSynthesizer;
///
/// async fn speak(synth: &dyn SpeechSynthesizer) -> Result<Bytes> {
///     synth.synthesize("Guten Morgen", "de").await
/// }
/// ```
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` in the given language, returning encoded audio.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotAvailable`](crate::error::BridgeError) when
    /// the host has no synthesis capability, or
    /// [`BridgeError::OperationFailed`](crate::error::BridgeError) when
    /// synthesis itself fails. Callers treat both as "no resource available".
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Bytes>;

    /// Whether synthesis is expected to work on this host.
    fn is_available(&self) -> bool {
        true
    }
}
