//! # Offline Worker
//!
//! Service-worker-equivalent lifecycle over [`ResponseStore`]: install
//! precaches the app shell, activate prunes superseded cache generations,
//! and fetch interception applies a per-route policy:
//!
//! - API calls: network-first, successful responses cached for offline replay
//! - navigations: network-first, falling back to the cached page and then to
//!   the cached root route
//! - same-origin static assets: cache-first
//! - everything else (cross-origin, non-GET): forwarded untouched
//!
//! Until the worker is active, every request is forwarded untouched; an
//! idle or waiting worker controls nothing.

use std::sync::Arc;

use bridge_traits::{HttpClient, HttpRequest, HttpResponse};
use core_runtime::events::{CoreEvent, EventBus, OfflineEvent};
use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::OfflineConfig;
use crate::error::{OfflineError, Result};
use crate::request::{classify, FetchRequest, RouteClass};
use crate::store::{ResponseStore, StoredResponse};

/// Lifecycle state of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Not yet installed; controls nothing.
    Idle,
    /// Installed and precached, waiting to take control.
    Waiting,
    /// In control of fetch interception.
    Active,
}

/// Control messages the host can post to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMessage {
    /// Promote a waiting worker to active immediately.
    SkipWaiting,
}

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Network,
    Cache,
    /// Offline navigation with no exact match, served the cached root route.
    RootFallback,
}

/// An intercepted response plus its provenance.
#[derive(Debug)]
pub struct FetchOutcome {
    pub response: HttpResponse,
    pub served_from: ServedFrom,
}

/// Offline response cache worker.
pub struct OfflineWorker {
    config: OfflineConfig,
    store: Arc<dyn ResponseStore>,
    http: Arc<dyn HttpClient>,
    state: Mutex<WorkerState>,
    event_bus: Option<Arc<EventBus>>,
}

impl OfflineWorker {
    pub fn new(
        config: OfflineConfig,
        http: Arc<dyn HttpClient>,
        store: Arc<dyn ResponseStore>,
    ) -> Result<Self> {
        config.validate().map_err(OfflineError::InvalidConfig)?;
        Ok(Self {
            config,
            store,
            http,
            state: Mutex::new(WorkerState::Idle),
            event_bus: None,
        })
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    /// Fetch and cache every configured precache route, then move to
    /// [`WorkerState::Waiting`].
    ///
    /// Install is all-or-nothing: one failed precache fetch aborts it and
    /// leaves the worker idle, so a half-cached shell never supersedes a
    /// complete previous generation.
    #[instrument(skip(self))]
    pub async fn install(&self) -> Result<usize> {
        let cache = self.config.page_cache_name();
        let mut precached = 0;

        for route in &self.config.precache_routes {
            let url = format!("{}{}", self.config.origin, route);
            let response = self
                .http
                .execute(HttpRequest::get(&url))
                .await
                .map_err(|e| OfflineError::Network(format!("precache of {} failed: {}", route, e)))?;
            if !response.is_success() {
                return Err(OfflineError::Network(format!(
                    "precache of {} returned HTTP {}",
                    route, response.status
                )));
            }

            let key = FetchRequest::get(url).cache_key();
            self.store
                .put(&cache, &key, StoredResponse::from(&response))
                .await
                .map_err(|e| OfflineError::Store(e.to_string()))?;
            precached += 1;
        }

        *self.state.lock() = WorkerState::Waiting;
        debug!(precached, cache, "Offline worker installed");
        self.emit(OfflineEvent::Installed { precached });
        Ok(precached)
    }

    /// Prune cache generations this worker no longer serves, then take
    /// control.
    #[instrument(skip(self))]
    pub async fn activate(&self) -> Result<Vec<String>> {
        let names = self
            .store
            .cache_names()
            .await
            .map_err(|e| OfflineError::Store(e.to_string()))?;

        let mut removed = Vec::new();
        for name in names {
            if self.config.is_stale_cache(&name) {
                match self.store.delete_cache(&name).await {
                    Ok(_) => removed.push(name),
                    Err(e) => warn!(cache = %name, error = %e, "Failed to prune stale cache"),
                }
            }
        }

        *self.state.lock() = WorkerState::Active;
        debug!(removed = removed.len(), "Offline worker activated");
        self.emit(OfflineEvent::Activated {
            removed_generations: removed.clone(),
        });
        Ok(removed)
    }

    /// Promote a waiting worker to active without waiting for the host's
    /// natural handover.
    pub async fn skip_waiting(&self) -> Result<()> {
        self.emit(OfflineEvent::SkipWaiting);
        let waiting = *self.state.lock() == WorkerState::Waiting;
        if waiting {
            self.activate().await?;
        }
        Ok(())
    }

    /// Handle a control message from the host.
    pub async fn handle_message(&self, message: WorkerMessage) -> Result<()> {
        match message {
            WorkerMessage::SkipWaiting => self.skip_waiting().await,
        }
    }

    /// Intercept a request and answer it per the route's policy.
    #[instrument(skip_all, fields(url = %request.url))]
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Result<FetchOutcome> {
        if self.state() != WorkerState::Active {
            return self.passthrough(request).await;
        }

        match classify(request, &self.config) {
            RouteClass::Api => {
                self.network_first(request, &self.config.api_cache_name(), false)
                    .await
            }
            RouteClass::Navigation => {
                self.network_first(request, &self.config.page_cache_name(), true)
                    .await
            }
            RouteClass::Static => {
                self.cache_first(request, &self.config.page_cache_name())
                    .await
            }
            RouteClass::Passthrough => self.passthrough(request).await,
        }
    }

    async fn passthrough(&self, request: &FetchRequest) -> Result<FetchOutcome> {
        let response = self
            .fetch(request)
            .await
            .map_err(OfflineError::Network)?;
        Ok(FetchOutcome {
            response,
            served_from: ServedFrom::Network,
        })
    }

    /// Network-first: fresh data wins, cache covers outages.
    async fn network_first(
        &self,
        request: &FetchRequest,
        cache: &str,
        navigation: bool,
    ) -> Result<FetchOutcome> {
        match self.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.store_response(cache, &request.cache_key(), &response).await;
                }
                Ok(FetchOutcome {
                    response,
                    served_from: ServedFrom::Network,
                })
            }
            Err(reason) => {
                debug!(url = %request.url, %reason, "Network failed, consulting cache");
                if let Some(stored) = self.lookup(cache, &request.cache_key()).await {
                    self.emit(OfflineEvent::ServedFromCache {
                        request: request.cache_key(),
                    });
                    return Ok(FetchOutcome {
                        response: stored.into(),
                        served_from: ServedFrom::Cache,
                    });
                }
                if navigation {
                    let root_key = FetchRequest::get(format!(
                        "{}{}",
                        self.config.origin, self.config.root_route
                    ))
                    .cache_key();
                    if let Some(stored) = self.lookup(cache, &root_key).await {
                        self.emit(OfflineEvent::ServedFromCache { request: root_key });
                        return Ok(FetchOutcome {
                            response: stored.into(),
                            served_from: ServedFrom::RootFallback,
                        });
                    }
                }
                Err(OfflineError::Unavailable(reason))
            }
        }
    }

    /// Cache-first: static assets never change within a generation.
    async fn cache_first(&self, request: &FetchRequest, cache: &str) -> Result<FetchOutcome> {
        if let Some(stored) = self.lookup(cache, &request.cache_key()).await {
            self.emit(OfflineEvent::ServedFromCache {
                request: request.cache_key(),
            });
            return Ok(FetchOutcome {
                response: stored.into(),
                served_from: ServedFrom::Cache,
            });
        }

        match self.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.store_response(cache, &request.cache_key(), &response).await;
                }
                Ok(FetchOutcome {
                    response,
                    served_from: ServedFrom::Network,
                })
            }
            Err(reason) => Err(OfflineError::Unavailable(reason)),
        }
    }

    async fn fetch(&self, request: &FetchRequest) -> std::result::Result<HttpResponse, String> {
        self.http
            .execute(HttpRequest::new(request.method, &request.url))
            .await
            .map_err(|e| e.to_string())
    }

    /// Best-effort store; a full or broken store never fails the response.
    async fn store_response(&self, cache: &str, key: &str, response: &HttpResponse) {
        if let Err(e) = self
            .store
            .put(cache, key, StoredResponse::from(response))
            .await
        {
            warn!(cache, key, error = %e, "Failed to cache response");
        }
    }

    async fn lookup(&self, cache: &str, key: &str) -> Option<StoredResponse> {
        match self.store.get(cache, key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(cache, key, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    fn emit(&self, event: OfflineEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Offline(event)).ok();
        }
    }
}
