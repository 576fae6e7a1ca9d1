//! Cache Lifecycle Manager
//!
//! Owns the static and runtime stores, applies a caching strategy per
//! request class and drives the install/activate lifecycle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::cache::{CacheStats, CacheStorage, CachedResponse, SWEEP_SENTINEL_KEY};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::fetch::{upstream_url, Fetcher};
use crate::models::{
    ClientMessage, FetchRequest, FetchResponse, MessageResponse, Notification, PushPayload,
    ResponseType,
};
use crate::policy::{
    cache_key, classify, classify_exchange, is_cacheable_request, locale_for_path,
    offline_page_path, Classification, RequestClass, PRECACHE_MANIFEST,
};
use crate::tasks::spawn_sweep_task;
use crate::worker::eviction::{self, EvictionGate, EvictionOutcome};
use crate::worker::lifecycle::{transition, Effect, LifecycleEvent, Transition, WorkerState};

pub const DEFAULT_NOTIFICATION_TITLE: &str = "New notification";
pub const DEFAULT_NOTIFICATION_BODY: &str = "You have a new notification.";
pub const DEFAULT_NOTIFICATION_URL: &str = "/";

// == Manager Config ==
/// Settings the manager needs from the process configuration.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Origin whose paths are precached and looked up
    pub origin: Url,
    pub static_cache: String,
    pub runtime_cache: String,
    /// Whether the host supports periodic background sweeps
    pub periodic_sweep: bool,
    pub sweep_interval: Duration,
}

impl ManagerConfig {
    pub fn from_config(config: &Config) -> Result<Self> {
        let origin = Url::parse(&config.upstream_url).map_err(|e| {
            CacheError::Internal(format!("Invalid upstream URL '{}': {}", config.upstream_url, e))
        })?;

        Ok(Self {
            origin,
            static_cache: config.static_cache_name(),
            runtime_cache: config.runtime_cache_name(),
            periodic_sweep: config.periodic_sweep,
            sweep_interval: Duration::from_secs(config.sweep_interval),
        })
    }
}

// == Cache Manager ==
/// Cheaply cloneable handle to the cache manager.
#[derive(Clone)]
pub struct CacheManager {
    inner: Arc<Inner>,
}

struct Inner {
    config: ManagerConfig,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    clock: Arc<dyn Clock>,
    gate: EvictionGate,
    state: RwLock<WorkerState>,
    /// Requests currently being served
    in_flight: AtomicUsize,
    stats: RwLock<CacheStats>,
    sweep_task: Mutex<Option<JoinHandle<()>>>,
}

/// Counts one request as in flight until dropped.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CacheManager {
    // == Constructor ==
    pub fn new(
        config: ManagerConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                storage,
                fetcher,
                clock,
                gate: EvictionGate::new(),
                state: RwLock::new(WorkerState::Parsed),
                in_flight: AtomicUsize::new(0),
                stats: RwLock::new(CacheStats::new()),
                sweep_task: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    pub async fn state(&self) -> WorkerState {
        *self.inner.state.read().await
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Lifecycle state as reported by the health endpoint. An active manager
    /// is `idle` or `handling-request`.
    pub async fn status(&self) -> &'static str {
        match self.state().await {
            WorkerState::Active if self.in_flight() > 0 => "handling-request",
            WorkerState::Active => "idle",
            state => state.name(),
        }
    }

    /// Current statistics, with the runtime entry count refreshed.
    pub async fn stats(&self) -> CacheStats {
        let entries = match self.inner.storage.keys(&self.inner.config.runtime_cache).await {
            Ok(keys) => keys.iter().filter(|k| *k != SWEEP_SENTINEL_KEY).count(),
            Err(e) => {
                warn!(error = %e, "Failed to count runtime entries");
                0
            }
        };

        let mut stats = self.inner.stats.write().await;
        stats.set_runtime_entries(entries);
        stats.clone()
    }

    // == Lifecycle ==
    async fn advance(&self, event: LifecycleEvent) -> Result<Transition> {
        let mut state = self.inner.state.write().await;
        let from = *state;
        let next = transition(from, event)?;
        info!(%from, to = %next.state, "Lifecycle transition");
        *state = next.state;
        Ok(next)
    }

    /// Precaches the static manifest and stamps the sweep sentinel.
    ///
    /// On failure the manager becomes redundant and never activates.
    pub async fn install(&self) -> Result<()> {
        let t = self.advance(LifecycleEvent::Install).await?;

        for effect in &t.effects {
            if let Err(e) = self.run_effect(*effect).await {
                error!(effect = ?effect, error = %e, "Install failed");
                self.advance(LifecycleEvent::InstallFailed).await?;
                return Err(e);
            }
        }

        self.advance(LifecycleEvent::InstallSucceeded).await?;
        Ok(())
    }

    /// Cleans up old stores, claims clients and runs the gated eviction.
    pub async fn activate(&self) -> Result<()> {
        let t = self.advance(LifecycleEvent::Activate).await?;

        for effect in &t.effects {
            if let Err(e) = self.run_effect(*effect).await {
                warn!(effect = ?effect, error = %e, "Activation step failed");
            }
        }

        Ok(())
    }

    /// Marks this manager as replaced by a newer version.
    pub async fn supersede(&self) -> Result<()> {
        self.advance(LifecycleEvent::Superseded).await?;
        self.shutdown().await;
        Ok(())
    }

    /// Stops the periodic sweep task, if one is running.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.inner.sweep_task.lock().await.take() {
            handle.abort();
            debug!("Periodic sweep task aborted");
        }
    }

    async fn run_effect(&self, effect: Effect) -> Result<()> {
        match effect {
            Effect::Precache => self.precache().await,
            Effect::StampSentinel => self.stamp_sentinel().await,
            Effect::DeleteStaleCaches => self.delete_stale_caches().await,
            Effect::ClaimClients => {
                info!("Claiming open clients");
                Ok(())
            }
            Effect::EvictExpired => {
                self.evict_expired().await;
                Ok(())
            }
        }
    }

    async fn precache(&self) -> Result<()> {
        let config = &self.inner.config;

        for path in PRECACHE_MANIFEST {
            let url = upstream_url(&config.origin, path)?;
            let request = FetchRequest::new(Method::GET, url);

            let response = self
                .inner
                .fetcher
                .fetch(&request)
                .await
                .map_err(|e| CacheError::Precache(format!("{}: {}", path, e)))?;

            if !response.status.is_success() {
                return Err(CacheError::Precache(format!(
                    "{}: upstream returned {}",
                    path, response.status
                )));
            }

            self.inner
                .storage
                .put(
                    &config.static_cache,
                    &cache_key(&request.url),
                    CachedResponse::from_response(&response),
                )
                .await?;
            debug!(path, "Precached");
        }

        info!(
            count = PRECACHE_MANIFEST.len(),
            cache = %config.static_cache,
            "Static manifest precached"
        );
        Ok(())
    }

    async fn stamp_sentinel(&self) -> Result<()> {
        let runtime = &self.inner.config.runtime_cache;

        if self.inner.storage.get(runtime, SWEEP_SENTINEL_KEY).await?.is_none() {
            let now = self.inner.clock.now();
            self.inner
                .storage
                .put(runtime, SWEEP_SENTINEL_KEY, CachedResponse::sentinel(now))
                .await?;
            debug!(cache = %runtime, "Sweep sentinel stamped");
        }

        Ok(())
    }

    async fn delete_stale_caches(&self) -> Result<()> {
        let config = &self.inner.config;

        for name in self.inner.storage.cache_names().await? {
            if name != config.static_cache && name != config.runtime_cache {
                self.inner.storage.delete_cache(&name).await?;
                info!(cache = %name, "Deleted stale cache store");
            }
        }

        Ok(())
    }

    // == Eviction ==
    /// Runs the runtime sweep at most once per 24 hours.
    pub async fn evict_expired(&self) -> EvictionOutcome {
        let now = self.inner.clock.now();

        if !self.inner.gate.try_enter(now).await {
            debug!("Eviction checked within the last 24 hours, skipping");
            return EvictionOutcome::Gated;
        }

        let outcome = eviction::sweep(
            self.inner.storage.as_ref(),
            &self.inner.config.runtime_cache,
            now,
        )
        .await;

        if let EvictionOutcome::Swept { removed } = outcome {
            self.inner.stats.write().await.record_evictions(removed);
        }

        outcome
    }

    // == Serve ==
    /// Answers a request. Never fails: every path ends in a response.
    pub async fn serve(&self, request: FetchRequest) -> FetchResponse {
        if !self.state().await.is_active() {
            return self.pass_through(&request).await;
        }

        let _in_flight = InFlightGuard::enter(&self.inner.in_flight);

        match classify(&request) {
            RequestClass::Skip => {
                debug!(url = %request.url, "Skipping cache");
                self.pass_through(&request).await
            }
            RequestClass::StaticAsset => self.serve_static(request).await.0,
            RequestClass::Dynamic => self.serve_dynamic(request).await,
        }
    }

    async fn pass_through(&self, request: &FetchRequest) -> FetchResponse {
        match self.inner.fetcher.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %request.url, error = %e, "Network failed for uncached request");
                FetchResponse::service_unavailable()
            }
        }
    }

    /// Stale-while-revalidate over the static store. Returns the handle of
    /// the detached refresh when a cached copy was served.
    pub(crate) async fn serve_static(
        &self,
        request: FetchRequest,
    ) -> (FetchResponse, Option<JoinHandle<()>>) {
        let static_cache = &self.inner.config.static_cache;
        let key = cache_key(&request.url);

        let cached = match self.inner.storage.get(static_cache, &key).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(cache = %static_cache, error = %e, "Static cache unavailable, using network");
                return (self.pass_through(&request).await, None);
            }
        };

        if let Some(entry) = cached {
            self.inner.stats.write().await.record_hit();
            debug!(key = %key, "Serving static asset from cache, revalidating");
            let handle = self.spawn_revalidate(request, key);
            return (entry.to_response(), Some(handle));
        }

        self.inner.stats.write().await.record_miss();

        match self.inner.fetcher.fetch(&request).await {
            Ok(response) => {
                if response.status.is_success() {
                    self.store(static_cache, &key, CachedResponse::from_response(&response))
                        .await;
                }
                (response, None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Static asset unavailable");
                (FetchResponse::service_unavailable(), None)
            }
        }
    }

    fn spawn_revalidate(&self, request: FetchRequest, key: String) -> JoinHandle<()> {
        let manager = self.clone();

        tokio::spawn(async move {
            match manager.inner.fetcher.fetch(&request).await {
                Ok(response) if response.status.is_success() => {
                    let cache = &manager.inner.config.static_cache;
                    manager
                        .store(cache, &key, CachedResponse::from_response(&response))
                        .await;
                    debug!(key = %key, "Static asset revalidated");
                }
                Ok(response) => {
                    debug!(key = %key, status = %response.status, "Revalidation not stored");
                }
                Err(e) => {
                    debug!(key = %key, error = %e, "Revalidation failed");
                }
            }
        })
    }

    /// Network-first over the runtime store.
    ///
    /// Requests that can never be cached (non-GET, API, blacklisted) get no
    /// cache fallback: a network failure is a 503.
    async fn serve_dynamic(&self, request: FetchRequest) -> FetchResponse {
        let key = cache_key(&request.url);

        match self.inner.fetcher.fetch(&request).await {
            Ok(response) => {
                let verdict = classify_exchange(&request, &response);
                debug!(key = %key, status = %response.status, ?verdict, "Network response");

                if verdict == Classification::Cacheable {
                    let entry =
                        CachedResponse::from_response(&response).stamped(self.inner.clock.now());
                    self.store(&self.inner.config.runtime_cache, &key, entry)
                        .await;
                }
                response
            }
            Err(e) if !is_cacheable_request(&request) => {
                warn!(
                    method = %request.method,
                    url = %request.url,
                    error = %e,
                    "Network failed for uncacheable request"
                );
                FetchResponse::service_unavailable()
            }
            Err(e) => {
                debug!(key = %key, error = %e, "Network failed, falling back to cache");
                self.fallback(&request, &key).await
            }
        }
    }

    /// Runtime entry, then locale offline page, then a synthetic 503.
    async fn fallback(&self, request: &FetchRequest, key: &str) -> FetchResponse {
        let config = &self.inner.config;

        match self.inner.storage.get(&config.runtime_cache, key).await {
            Ok(Some(entry)) => {
                self.inner.stats.write().await.record_network_fallback();
                return entry.to_response();
            }
            Ok(None) => self.inner.stats.write().await.record_miss(),
            Err(e) => warn!(cache = %config.runtime_cache, error = %e, "Runtime cache unavailable"),
        }

        let locale = locale_for_path(request.path());
        let offline_key = match upstream_url(&config.origin, &offline_page_path(locale)) {
            Ok(url) => cache_key(&url),
            Err(e) => {
                warn!(error = %e, "Cannot build offline page URL");
                return FetchResponse::service_unavailable();
            }
        };

        match self.inner.storage.get(&config.static_cache, &offline_key).await {
            Ok(Some(entry)) => {
                self.inner.stats.write().await.record_offline_page();
                debug!(locale, "Serving offline page");
                entry.to_response().with_kind(ResponseType::Synthetic)
            }
            Ok(None) => FetchResponse::service_unavailable(),
            Err(e) => {
                warn!(cache = %config.static_cache, error = %e, "Static cache unavailable");
                FetchResponse::service_unavailable()
            }
        }
    }

    /// Writes an entry, logging instead of failing.
    async fn store(&self, cache: &str, key: &str, entry: CachedResponse) {
        if let Err(e) = self.inner.storage.put(cache, key, entry).await {
            warn!(cache, key, error = %e, "Cache write failed");
        }
    }

    // == Messages ==
    /// Dispatches a validated client message.
    pub async fn handle_message(&self, message: ClientMessage) -> MessageResponse {
        match message {
            ClientMessage::RegisterPeriodicSweep { min_interval_secs } => {
                self.register_periodic_sweep(min_interval_secs).await
            }
            ClientMessage::SkipWaiting => {
                let state = self.state().await;
                if state != WorkerState::Installed {
                    return MessageResponse::new(false, format!("nothing waiting in state {}", state));
                }
                match self.activate().await {
                    Ok(()) => MessageResponse::new(true, "activated"),
                    Err(e) => {
                        warn!(error = %e, "Skip-waiting activation failed");
                        MessageResponse::new(false, e.to_string())
                    }
                }
            }
        }
    }

    async fn register_periodic_sweep(&self, min_interval_secs: Option<u64>) -> MessageResponse {
        if !self.inner.config.periodic_sweep {
            warn!("Periodic sweep not supported by host, registration ignored");
            return MessageResponse::new(false, "periodic sweep unavailable");
        }

        let mut task = self.inner.sweep_task.lock().await;
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return MessageResponse::new(true, "periodic sweep already registered");
        }

        let interval = min_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(self.inner.config.sweep_interval);
        *task = Some(spawn_sweep_task(self.clone(), interval));

        info!(interval_secs = interval.as_secs(), "Periodic sweep registered");
        MessageResponse::new(true, "periodic sweep registered")
    }

    // == Push ==
    /// Builds the notification for a push payload. Missing fields, or the
    /// whole payload when malformed, fall back to the defaults.
    pub fn handle_push(&self, raw: &[u8]) -> Notification {
        let payload = PushPayload::parse(raw).unwrap_or_else(|e| {
            warn!(error = %e, "Malformed push payload, using defaults");
            PushPayload::default()
        });

        Notification {
            title: payload
                .title
                .unwrap_or_else(|| DEFAULT_NOTIFICATION_TITLE.to_string()),
            body: payload
                .body
                .unwrap_or_else(|| DEFAULT_NOTIFICATION_BODY.to_string()),
            url: payload
                .url
                .filter(|url| is_local_path(url))
                .unwrap_or_else(|| DEFAULT_NOTIFICATION_URL.to_string()),
        }
    }

    /// URL to open when a notification is clicked.
    pub fn notification_click(&self, target: Option<&str>) -> String {
        target
            .filter(|url| is_local_path(url))
            .unwrap_or(DEFAULT_NOTIFICATION_URL)
            .to_string()
    }
}

fn is_local_path(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//")
}
