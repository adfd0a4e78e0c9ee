//! Integration tests for the fetch coordinator's resolution chain.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::{
    BridgeError, HttpClient, HttpRequest, HttpResponse, KeyValueStore, RetryPolicy,
    SpeechSynthesizer,
};
use bytes::Bytes;
use core_audio::{
    AudioCacheConfig, AudioResource, CacheKey, FetchCoordinator, Resolution, ResolutionSource,
};
use core_runtime::events::{AudioEvent, CoreEvent, EventBus};
use parking_lot::Mutex;

/// Scripted HTTP client: routes match by URL substring, first match wins.
struct StubHttpClient {
    routes: Vec<(String, Responder)>,
    calls: Mutex<Vec<String>>,
    retry_budgets: Mutex<Vec<u32>>,
    delay: Option<Duration>,
}

type Responder = Box<dyn Fn() -> bridge_traits::Result<HttpResponse> + Send + Sync>;

impl StubHttpClient {
    fn new() -> Self {
        Self {
            routes: Vec::new(),
            calls: Mutex::new(Vec::new()),
            retry_budgets: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    fn route(
        mut self,
        url_fragment: &str,
        responder: impl Fn() -> bridge_traits::Result<HttpResponse> + Send + Sync + 'static,
    ) -> Self {
        self.routes.push((url_fragment.to_string(), Box::new(responder)));
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn calls_matching(&self, fragment: &str) -> usize {
        self.calls.lock().iter().filter(|u| u.contains(fragment)).count()
    }

    fn retry_budgets(&self) -> Vec<u32> {
        self.retry_budgets.lock().clone()
    }
}

#[async_trait]
impl HttpClient for StubHttpClient {
    async fn execute(&self, request: HttpRequest) -> bridge_traits::Result<HttpResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().push(request.url.clone());
        for (fragment, responder) in &self.routes {
            if request.url.contains(fragment.as_str()) {
                return responder();
            }
        }
        Err(BridgeError::NotAvailable(format!(
            "no route for {}",
            request.url
        )))
    }

    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> bridge_traits::Result<HttpResponse> {
        self.retry_budgets.lock().push(policy.max_attempts);
        self.execute(request).await
    }
}

fn audio_response(body: &'static [u8]) -> bridge_traits::Result<HttpResponse> {
    let mut headers = HashMap::new();
    headers.insert("Content-Type".to_string(), "audio/mpeg".to_string());
    Ok(HttpResponse {
        status: 200,
        headers,
        body: Bytes::from_static(body),
    })
}

fn json_response(body: String) -> bridge_traits::Result<HttpResponse> {
    let mut headers = HashMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    Ok(HttpResponse {
        status: 200,
        headers,
        body: Bytes::from(body),
    })
}

/// Unbounded in-memory key-value store.
#[derive(Default)]
struct MemoryKv {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    fn contains_key(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> bridge_traits::Result<Option<String>> {
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> bridge_traits::Result<()> {
        self.data.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> bridge_traits::Result<()> {
        self.data.lock().remove(key);
        Ok(())
    }

    async fn keys(&self) -> bridge_traits::Result<Vec<String>> {
        Ok(self.data.lock().keys().cloned().collect())
    }

    async fn clear(&self) -> bridge_traits::Result<()> {
        self.data.lock().clear();
        Ok(())
    }
}

mockall::mock! {
    Synth {}

    #[async_trait]
    impl SpeechSynthesizer for Synth {
        async fn synthesize(&self, text: &str, lang: &str) -> bridge_traits::Result<Bytes>;
        fn is_available(&self) -> bool;
    }
}

fn coordinator(
    http: Arc<StubHttpClient>,
    kv: Arc<MemoryKv>,
) -> FetchCoordinator {
    FetchCoordinator::new(AudioCacheConfig::default(), http, kv)
        .expect("default config is valid")
}

#[tokio::test]
async fn test_network_fetch_fills_both_tiers() {
    let http = Arc::new(StubHttpClient::new().route("/tts?", || audio_response(b"mp3")));
    let kv = Arc::new(MemoryKv::default());
    let coordinator = coordinator(http.clone(), kv.clone());

    let key = CacheKey::new("de", "Hund");
    let resolution = coordinator.resolve(&key).await;

    assert_eq!(resolution.source(), Some(ResolutionSource::Network));
    assert_eq!(resolution.audio().unwrap().bytes, Bytes::from_static(b"mp3"));
    assert_eq!(resolution.audio().unwrap().content_type, "audio/mpeg");
    assert!(coordinator.contains(&key));
    assert!(kv.contains_key("audio:de:Hund"));

    // Second resolve is a pure memory hit
    let again = coordinator.resolve(&key).await;
    assert_eq!(again.source(), Some(ResolutionSource::Memory));
    assert_eq!(http.call_count(), 1);

    let stats = coordinator.stats();
    assert_eq!(stats.network_fetches, 1);
    assert_eq!(stats.memory_hits, 1);
}

#[tokio::test]
async fn test_mirror_hit_promotes_without_network() {
    let http = Arc::new(StubHttpClient::new().route("/tts?", || audio_response(b"mp3")));
    let kv = Arc::new(MemoryKv::default());

    // Seed the durable tier through one coordinator instance,
    // then resolve through a fresh one (new session, empty memory)
    let first = coordinator(http.clone(), kv.clone());
    let key = CacheKey::new("de", "Katze");
    first.resolve(&key).await;
    assert_eq!(http.call_count(), 1);

    let second = coordinator(http.clone(), kv.clone());
    let resolution = second.resolve(&key).await;

    assert_eq!(resolution.source(), Some(ResolutionSource::Mirror));
    assert_eq!(http.call_count(), 1);
    assert!(second.contains(&key));
    assert_eq!(second.stats().mirror_promotions, 1);
}

#[tokio::test]
async fn test_network_failure_falls_back_to_synthesis() {
    let http = Arc::new(
        StubHttpClient::new().route("/tts?", || Err(BridgeError::NotAvailable("offline".into()))),
    );
    let kv = Arc::new(MemoryKv::default());

    let mut synth = MockSynth::new();
    synth
        .expect_synthesize()
        .times(1)
        .returning(|_, _| Ok(Bytes::from_static(b"wav")));

    let coordinator = coordinator(http, kv.clone()).with_synthesizer(Arc::new(synth));

    let key = CacheKey::new("de", "Maus");
    let resolution = coordinator.resolve(&key).await;

    assert_eq!(resolution.source(), Some(ResolutionSource::Fallback));
    assert_eq!(resolution.audio().unwrap().content_type, "audio/wav");
    // Fallback output is never cached in either tier
    assert!(!coordinator.contains(&key));
    assert!(!kv.contains_key("audio:de:Maus"));
    assert_eq!(coordinator.stats().fallbacks, 1);
}

#[tokio::test]
async fn test_fetches_are_single_attempt() {
    let http = Arc::new(
        StubHttpClient::new().route("/tts?", || Err(BridgeError::NotAvailable("offline".into()))),
    );
    let coordinator = coordinator(http.clone(), Arc::new(MemoryKv::default()));

    coordinator.resolve(&CacheKey::new("de", "einmal")).await;

    // The resolution chain is the retry story; the failed fetch must not be
    // retried in place
    assert_eq!(http.call_count(), 1);
    assert_eq!(http.retry_budgets(), vec![1]);
}

#[tokio::test]
async fn test_unavailable_when_every_tier_fails() {
    let http = Arc::new(
        StubHttpClient::new().route("/tts?", || Err(BridgeError::NotAvailable("offline".into()))),
    );

    let mut synth = MockSynth::new();
    synth
        .expect_synthesize()
        .returning(|_, _| Err(BridgeError::OperationFailed("no voice".into())));

    let coordinator = coordinator(http, Arc::new(MemoryKv::default()))
        .with_synthesizer(Arc::new(synth));

    let resolution = coordinator.resolve(&CacheKey::new("de", "stumm")).await;
    assert!(matches!(resolution, Resolution::Unavailable));
    assert_eq!(coordinator.stats().unavailable, 1);
}

#[tokio::test]
async fn test_unavailable_without_synthesizer() {
    let http = Arc::new(StubHttpClient::new());
    let coordinator = coordinator(http, Arc::new(MemoryKv::default()));

    let resolution = coordinator.resolve(&CacheKey::new("de", "leise")).await;
    assert!(!resolution.is_resolved());
}

#[tokio::test]
async fn test_http_error_status_is_a_miss() {
    let http = Arc::new(StubHttpClient::new().route("/tts?", || {
        Ok(HttpResponse {
            status: 500,
            headers: HashMap::new(),
            body: Bytes::new(),
        })
    }));
    let coordinator = coordinator(http, Arc::new(MemoryKv::default()));

    let resolution = coordinator.resolve(&CacheKey::new("de", "Fehler")).await;
    assert!(matches!(resolution, Resolution::Unavailable));
}

#[tokio::test]
async fn test_concurrent_resolutions_share_one_fetch() {
    let http = Arc::new(
        StubHttpClient::new()
            .route("/tts?", || audio_response(b"mp3"))
            .with_delay(Duration::from_millis(20)),
    );
    let coordinator = Arc::new(coordinator(http.clone(), Arc::new(MemoryKv::default())));

    let key = CacheKey::new("de", "gleichzeitig");
    let (a, b, c) = tokio::join!(
        coordinator.resolve(&key),
        coordinator.resolve(&key),
        coordinator.resolve(&key),
    );

    assert!(a.is_resolved());
    assert!(b.is_resolved());
    assert!(c.is_resolved());
    // One winner fetched; the others observed its cached result
    assert_eq!(http.call_count(), 1);
    let sources: Vec<_> = [a, b, c].iter().filter_map(Resolution::source).collect();
    assert_eq!(
        sources
            .iter()
            .filter(|s| **s == ResolutionSource::Network)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_preload_tolerates_individual_failures() {
    let manifest = serde_json::json!({
        "audio_urls": {
            "Hund": "/tts?text=Hund&lang=de",
            "Katze": "/broken?text=Katze&lang=de",
            "Maus": "/tts?text=Maus&lang=de",
        }
    });
    let http = Arc::new(
        StubHttpClient::new()
            .route("/preload_deck_audio?", move || {
                json_response(manifest.to_string())
            })
            .route("/tts?", || audio_response(b"mp3"))
            .route("/broken?", || Err(BridgeError::OperationFailed("boom".into()))),
    );
    let coordinator = coordinator(http.clone(), Arc::new(MemoryKv::default()));

    let report = coordinator.preload("animals", "de").await;

    assert_eq!(report.requested, 3);
    assert_eq!(report.fetched, 2);
    assert_eq!(report.failed, 1);
    assert!(!report.is_complete());
    assert!(coordinator.contains(&CacheKey::new("de", "Hund")));
    assert!(coordinator.contains(&CacheKey::new("de", "Maus")));
    assert!(!coordinator.contains(&CacheKey::new("de", "Katze")));
}

#[tokio::test]
async fn test_preload_skips_already_cached_members() {
    let manifest = serde_json::json!({
        "audio_urls": {
            "Hund": "/tts?text=Hund&lang=de",
            "Katze": "/tts?text=Katze&lang=de",
        }
    });
    let http = Arc::new(
        StubHttpClient::new()
            .route("/preload_deck_audio?", move || {
                json_response(manifest.to_string())
            })
            .route("/tts?", || audio_response(b"mp3")),
    );
    let coordinator = coordinator(http.clone(), Arc::new(MemoryKv::default()));

    coordinator.resolve(&CacheKey::new("de", "Hund")).await;
    let audio_calls_before = http.calls_matching("/tts?");

    let report = coordinator.preload("animals", "de").await;

    assert_eq!(report.requested, 2);
    assert_eq!(report.already_cached, 1);
    assert_eq!(report.fetched, 1);
    assert_eq!(http.calls_matching("/tts?"), audio_calls_before + 1);
}

#[tokio::test]
async fn test_preload_with_unreachable_manifest_is_empty() {
    let http = Arc::new(StubHttpClient::new());
    let coordinator = coordinator(http, Arc::new(MemoryKv::default()));

    let report = coordinator.preload("animals", "de").await;

    assert_eq!(report.requested, 0);
    assert_eq!(report.fetched, 0);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn test_hydrate_promotes_durable_entries_only() {
    let http = Arc::new(StubHttpClient::new().route("/tts?", || audio_response(b"mp3")));
    let kv = Arc::new(MemoryKv::default());

    let seeder = coordinator(http.clone(), kv.clone());
    seeder.resolve(&CacheKey::new("de", "Hund")).await;
    seeder.resolve(&CacheKey::new("de", "Katze")).await;

    let fresh = coordinator(http.clone(), kv.clone());
    let texts = vec![
        "Hund".to_string(),
        "Katze".to_string(),
        "Niemals".to_string(),
    ];
    let promoted = fresh.hydrate(&texts, "de").await;

    assert_eq!(promoted, 2);
    assert!(fresh.contains(&CacheKey::new("de", "Hund")));
    assert!(!fresh.contains(&CacheKey::new("de", "Niemals")));
    // Hydration issues no network traffic
    assert_eq!(http.call_count(), 2);
}

#[tokio::test]
async fn test_invalidate_clears_both_tiers() {
    let http = Arc::new(StubHttpClient::new().route("/tts?", || audio_response(b"mp3")));
    let kv = Arc::new(MemoryKv::default());
    let coordinator = coordinator(http.clone(), kv.clone());

    let key = CacheKey::new("de", "Hund");
    coordinator.resolve(&key).await;
    assert!(coordinator.contains(&key));
    assert!(kv.contains_key("audio:de:Hund"));

    coordinator.invalidate(&key).await;

    assert!(!coordinator.contains(&key));
    assert!(!kv.contains_key("audio:de:Hund"));

    // Next resolve goes back to the network
    coordinator.resolve(&key).await;
    assert_eq!(http.call_count(), 2);
}

#[tokio::test]
async fn test_eviction_invokes_release_hook_and_emits() {
    let http = Arc::new(StubHttpClient::new().route("/tts?", || audio_response(b"mp3")));
    let bus = Arc::new(EventBus::new(32));
    let mut rx = bus.subscribe();

    let released = Arc::new(AtomicUsize::new(0));
    let released_hook = released.clone();

    let config = AudioCacheConfig::default().with_max_entries(2);
    let coordinator = FetchCoordinator::new(config, http, Arc::new(MemoryKv::default()))
        .expect("config is valid")
        .with_event_bus(bus)
        .with_release_hook(Arc::new(move |_key| {
            released_hook.fetch_add(1, Ordering::SeqCst);
        }));

    coordinator.resolve(&CacheKeys::eins()).await;
    coordinator.resolve(&CacheKeys::zwei()).await;
    coordinator.resolve(&CacheKeys::drei()).await;

    // Capacity 2: the oldest entry was released exactly once
    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert_eq!(coordinator.cached_len(), 2);
    assert!(!coordinator.contains(&CacheKeys::eins()));
    assert_eq!(coordinator.stats().evictions, 1);

    let mut saw_eviction = false;
    while let Ok(event) = rx.try_recv() {
        if let CoreEvent::Audio(AudioEvent::Evicted { key }) = event {
            assert_eq!(key, "audio:de:eins");
            saw_eviction = true;
        }
    }
    assert!(saw_eviction);
}

struct CacheKeys;

impl CacheKeys {
    fn eins() -> CacheKey {
        CacheKey::new("de", "eins")
    }
    fn zwei() -> CacheKey {
        CacheKey::new("de", "zwei")
    }
    fn drei() -> CacheKey {
        CacheKey::new("de", "drei")
    }
}

#[tokio::test]
async fn test_rejected_config_surfaces_at_construction() {
    let http: Arc<dyn HttpClient> = Arc::new(StubHttpClient::new());
    let result = FetchCoordinator::new(
        AudioCacheConfig::default().with_base_url(""),
        http,
        Arc::new(MemoryKv::default()),
    );
    assert!(result.is_err());
}

// Touch re-exported types the other tests don't
#[test]
fn test_audio_resource_constructors() {
    let resource = AudioResource::mpeg(Bytes::from_static(b"abc"));
    assert_eq!(resource.content_type, "audio/mpeg");
    assert_eq!(resource.len(), 3);
    assert!(!resource.is_empty());
}
