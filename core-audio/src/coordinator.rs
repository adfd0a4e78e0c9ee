//! # Fetch Coordinator
//!
//! Resolves "play audio for word X in language N" with minimum redundant
//! work, short-circuiting through the tiers:
//!
//! 1. In-memory [`ResourceCache`] hit
//! 2. [`DurableMirror`] hit, promoted into memory
//! 3. Network fetch of `GET /tts?text=…&lang=…`, stored into both tiers
//! 4. Local [`SpeechSynthesizer`] fallback, played once and never cached
//!
//! Exhausting the chain yields [`Resolution::Unavailable`]; no tier failure
//! propagates as an error. Overlapping resolutions for one key share a
//! per-key in-flight slot so at most one network fetch is issued per key at
//! a time.
//!
//! The caches are owned by the coordinator and explicitly constructed, one
//! per browsing-context equivalent; there is no process-global state.

use std::collections::HashMap;
use std::sync::Arc;

use bridge_traits::{HttpClient, HttpRequest, KeyValueStore, RetryPolicy, SpeechSynthesizer};
use core_runtime::events::{AudioEvent, CoreEvent, EventBus};
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, Semaphore};
use tracing::{debug, instrument, warn};

use crate::cache::{AudioResource, ReleaseHook, ResourceCache};
use crate::config::AudioCacheConfig;
use crate::error::{AudioCacheError, Result};
use crate::key::CacheKey;
use crate::mirror::DurableMirror;
use crate::stats::{CacheStats, PreloadReport};

/// Where a resolved resource came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// In-memory cache hit.
    Memory,
    /// Promoted from the durable mirror.
    Mirror,
    /// Fetched from the TTS endpoint.
    Network,
    /// Produced by the degraded local synthesizer.
    Fallback,
}

/// Outcome of a resolution. Exhaustion of every tier is an ordinary outcome,
/// not an error.
#[derive(Debug, Clone)]
pub enum Resolution {
    Resolved {
        audio: AudioResource,
        source: ResolutionSource,
    },
    Unavailable,
}

impl Resolution {
    fn resolved(audio: AudioResource, source: ResolutionSource) -> Self {
        Resolution::Resolved { audio, source }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    pub fn audio(&self) -> Option<&AudioResource> {
        match self {
            Resolution::Resolved { audio, .. } => Some(audio),
            Resolution::Unavailable => None,
        }
    }

    pub fn source(&self) -> Option<ResolutionSource> {
        match self {
            Resolution::Resolved { source, .. } => Some(*source),
            Resolution::Unavailable => None,
        }
    }
}

/// Deck preload manifest returned by `GET /preload_deck_audio`.
#[derive(Debug, Default, serde::Deserialize)]
struct PreloadManifest {
    #[serde(default)]
    audio_urls: HashMap<String, String>,
}

/// Coordinates the two cache tiers, the network, and the fallback.
pub struct FetchCoordinator {
    config: AudioCacheConfig,
    cache: Mutex<ResourceCache>,
    mirror: DurableMirror,
    http: Arc<dyn HttpClient>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    event_bus: Option<Arc<EventBus>>,
    inflight: AsyncMutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>,
    preload_permits: Arc<Semaphore>,
    stats: Mutex<CacheStats>,
}

impl FetchCoordinator {
    /// Create a coordinator over the given HTTP client and durable store.
    pub fn new(
        config: AudioCacheConfig,
        http: Arc<dyn HttpClient>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(AudioCacheError::InvalidConfig)?;

        let cache = ResourceCache::new(config.max_entries);
        let mirror = DurableMirror::new(store, config.max_mirror_entry_bytes)
            .with_integrity_verification(config.verify_integrity);
        let preload_permits = Arc::new(Semaphore::new(config.max_concurrent_fetches));

        Ok(Self {
            config,
            cache: Mutex::new(cache),
            mirror,
            http,
            synthesizer: None,
            event_bus: None,
            inflight: AsyncMutex::new(HashMap::new()),
            preload_permits,
            stats: Mutex::new(CacheStats::default()),
        })
    }

    /// Set the degraded local-synthesis fallback.
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Set the event bus for cache activity events.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Install a release hook for native resources held by cache entries.
    pub fn with_release_hook(self, hook: ReleaseHook) -> Self {
        self.cache.lock().set_release_hook(hook);
        self
    }

    /// Resolve a playable resource for the key, walking the tier chain.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn resolve(&self, key: &CacheKey) -> Resolution {
        // Fast path without touching the in-flight table
        if let Some(audio) = self.lookup_memory(key) {
            self.stats.lock().memory_hits += 1;
            return Resolution::resolved(audio, ResolutionSource::Memory);
        }

        let slot = self.inflight_slot(key).await;
        let resolution = {
            let _guard = slot.lock().await;
            // A concurrent resolution for this key may have landed while we
            // waited on the slot
            if let Some(audio) = self.lookup_memory(key) {
                self.stats.lock().memory_hits += 1;
                Resolution::resolved(audio, ResolutionSource::Memory)
            } else {
                self.resolve_uncached(key).await
            }
        };
        self.release_inflight_slot(key, &slot).await;

        resolution
    }

    async fn resolve_uncached(&self, key: &CacheKey) -> Resolution {
        if let Some(audio) = self.mirror.read(key).await {
            self.insert_memory(key.clone(), audio.clone());
            self.stats.lock().mirror_promotions += 1;
            self.emit(AudioEvent::Promoted {
                key: key.storage_key(),
            });
            return Resolution::resolved(audio, ResolutionSource::Mirror);
        }

        match self.fetch_primary(key).await {
            Ok(audio) => {
                self.insert_memory(key.clone(), audio.clone());
                self.mirror_write(key, &audio).await;
                self.stats.lock().network_fetches += 1;
                self.emit(AudioEvent::Cached {
                    key: key.storage_key(),
                });
                Resolution::resolved(audio, ResolutionSource::Network)
            }
            Err(e) => {
                debug!(key = %key, error = %e, "Primary fetch failed, trying fallback");
                self.fallback(key).await
            }
        }
    }

    /// Fetch from the primary TTS endpoint.
    async fn fetch_primary(&self, key: &CacheKey) -> Result<AudioResource> {
        let url = format!(
            "{}/tts?text={}&lang={}",
            self.config.base(),
            urlencoding::encode(&key.text),
            urlencoding::encode(&key.lang)
        );
        self.fetch_audio(&url).await
    }

    /// Fetch an audio URL, which may be relative to the backend base.
    async fn fetch_audio(&self, url: &str) -> Result<AudioResource> {
        let absolute = if url.starts_with('/') {
            format!("{}{}", self.config.base(), url)
        } else {
            url.to_string()
        };

        // One attempt per tier; a network failure falls through the
        // resolution chain instead of being retried in place
        let request = HttpRequest::get(absolute).timeout(self.config.request_timeout);
        let response = self
            .http
            .execute_with_retry(request, RetryPolicy::none())
            .await
            .map_err(|e| AudioCacheError::Network(e.to_string()))?;

        if !response.is_success() {
            return Err(AudioCacheError::Network(format!(
                "audio endpoint returned HTTP {}",
                response.status
            )));
        }

        let content_type = response
            .content_type()
            .unwrap_or("audio/mpeg")
            .to_string();
        Ok(AudioResource::new(response.body, content_type))
    }

    async fn fallback(&self, key: &CacheKey) -> Resolution {
        let Some(synthesizer) = &self.synthesizer else {
            self.stats.lock().unavailable += 1;
            return Resolution::Unavailable;
        };

        match synthesizer.synthesize(&key.text, &key.lang).await {
            Ok(bytes) if !bytes.is_empty() => {
                self.stats.lock().fallbacks += 1;
                self.emit(AudioEvent::FallbackUsed {
                    key: key.storage_key(),
                });
                // Fallback output is played once, never cached
                Resolution::resolved(AudioResource::new(bytes, "audio/wav"), ResolutionSource::Fallback)
            }
            Ok(_) => {
                warn!(key = %key, "Synthesizer produced empty audio");
                self.stats.lock().unavailable += 1;
                Resolution::Unavailable
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Fallback synthesis failed");
                self.stats.lock().unavailable += 1;
                Resolution::Unavailable
            }
        }
    }

    /// Preload audio for a whole deck.
    ///
    /// Fetches the deck manifest, then pulls every member whose key is in
    /// neither cache tier, in parallel up to the configured concurrency.
    /// Individual failures are independent; nothing escapes the batch.
    #[instrument(skip(self))]
    pub async fn preload(&self, deck: &str, lang: &str) -> PreloadReport {
        let url = format!(
            "{}/preload_deck_audio?deck={}&lang={}",
            self.config.base(),
            urlencoding::encode(deck),
            urlencoding::encode(lang)
        );

        let manifest = match self
            .http
            .execute_with_retry(
                HttpRequest::get(url).timeout(self.config.request_timeout),
                RetryPolicy::none(),
            )
            .await
        {
            Ok(response) if response.is_success() => {
                response.json::<PreloadManifest>().unwrap_or_else(|e| {
                    warn!(deck, error = %e, "Malformed preload manifest, treating as empty");
                    PreloadManifest::default()
                })
            }
            Ok(response) => {
                warn!(deck, status = response.status, "Preload manifest request rejected");
                PreloadManifest::default()
            }
            Err(e) => {
                warn!(deck, error = %e, "Preload manifest request failed");
                PreloadManifest::default()
            }
        };

        let mut report = PreloadReport {
            requested: manifest.audio_urls.len(),
            ..PreloadReport::default()
        };

        let mut pending = Vec::new();
        for (text, resource_url) in manifest.audio_urls {
            let key = CacheKey::new(lang, text);
            if self.lookup_memory(&key).is_some() || self.mirror.contains(&key).await {
                report.already_cached += 1;
                continue;
            }
            pending.push((key, resource_url));
        }

        let fetches = pending.into_iter().map(|(key, resource_url)| {
            let permits = self.preload_permits.clone();
            async move {
                let _permit = permits.acquire_owned().await.ok();
                let fetched = self.fetch_audio(&resource_url).await;
                (key, fetched)
            }
        });

        for (key, fetched) in join_all(fetches).await {
            match fetched {
                Ok(audio) => {
                    self.insert_memory(key.clone(), audio.clone());
                    self.mirror_write(&key, &audio).await;
                    report.fetched += 1;
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Preload member failed");
                    report.failed += 1;
                }
            }
        }

        debug!(
            deck,
            requested = report.requested,
            fetched = report.fetched,
            failed = report.failed,
            "Deck preload finished"
        );
        self.emit(AudioEvent::PreloadFinished {
            deck: deck.to_string(),
            fetched: report.fetched,
            failed: report.failed,
        });

        report
    }

    /// Pull existing durable entries for the given texts into memory without
    /// any network traffic. Returns the number promoted.
    pub async fn hydrate(&self, texts: &[String], lang: &str) -> usize {
        let mut loaded = Vec::new();
        for text in texts {
            let key = CacheKey::new(lang, text.clone());
            if self.lookup_memory(&key).is_some() {
                continue;
            }
            if let Some(audio) = self.mirror.read(&key).await {
                loaded.push((key, audio));
            }
        }

        let mut cache = self.cache.lock();
        let mut promoted = 0;
        for (key, audio) in loaded {
            // A concurrent resolution may have filled the slot in between
            if !cache.contains(&key) {
                cache.put(key, audio);
                promoted += 1;
            }
        }
        promoted
    }

    /// Drop a key from both tiers; used when the underlying word is edited
    /// or deleted.
    pub async fn invalidate(&self, key: &CacheKey) {
        self.cache.lock().remove(key);
        self.mirror.remove(key).await;
    }

    /// Whether the in-memory tier currently holds the key.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.cache.lock().contains(key)
    }

    /// Entries currently in the in-memory tier.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Snapshot of resolution counters.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().clone();
        stats.evictions = self.cache.lock().evictions();
        stats
    }

    /// The durable tier, for direct hydration or inspection.
    pub fn mirror(&self) -> &DurableMirror {
        &self.mirror
    }

    fn lookup_memory(&self, key: &CacheKey) -> Option<AudioResource> {
        self.cache.lock().get(key).cloned()
    }

    fn insert_memory(&self, key: CacheKey, audio: AudioResource) {
        let evicted = self.cache.lock().put(key, audio);
        for old in evicted {
            self.emit(AudioEvent::Evicted {
                key: old.storage_key(),
            });
        }
    }

    async fn mirror_write(&self, key: &CacheKey, audio: &AudioResource) {
        let outcome = self.mirror.write(key, audio).await;
        if !outcome.is_persisted() {
            self.stats.lock().mirror_rejections += 1;
            self.emit(AudioEvent::MirrorRejected {
                key: key.storage_key(),
                reason: format!("{:?}", outcome),
            });
        }
    }

    async fn inflight_slot(&self, key: &CacheKey) -> Arc<AsyncMutex<()>> {
        let mut inflight = self.inflight.lock().await;
        inflight.entry(key.clone()).or_default().clone()
    }

    async fn release_inflight_slot(&self, key: &CacheKey, slot: &Arc<AsyncMutex<()>>) {
        let mut inflight = self.inflight.lock().await;
        if let Some(current) = inflight.get(key) {
            // Two references left means only the table and this caller
            if Arc::ptr_eq(current, slot) && Arc::strong_count(current) <= 2 {
                inflight.remove(key);
            }
        }
    }

    fn emit(&self, event: AudioEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Audio(event)).ok();
        }
    }
}
