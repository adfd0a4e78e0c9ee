//! Cache key shared by both cache tiers.

use std::fmt;

/// Prefix under which durable entries live in the key/value store.
pub const STORAGE_PREFIX: &str = "audio:";

/// Composite (namespace, identifier) key: language code plus the card text.
///
/// The same key addresses the in-memory [`ResourceCache`](crate::cache) and
/// the [`DurableMirror`](crate::mirror); the durable rendering is
/// `audio:<lang>:<text>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub lang: String,
    pub text: String,
}

impl CacheKey {
    pub fn new(lang: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            text: text.into(),
        }
    }

    /// Render the durable storage key.
    pub fn storage_key(&self) -> String {
        format!("{}{}:{}", STORAGE_PREFIX, self.lang, self.text)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}
