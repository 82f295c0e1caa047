//! Per-component TTL cache.

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::cache::sweeper::CacheSweeper;
use crate::config::CacheConfig;
use crate::model::result::META_STALE;
use crate::model::ProbeResult;
use crate::observability::metrics;
use crate::resilience::fault::ProbeFault;

/// A cached result and its expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    result: ProbeResult,
    stored_at: Instant,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(result: ProbeResult, ttl: Duration) -> Self {
        let stored_at = Instant::now();
        Self {
            result,
            stored_at,
            expires_at: stored_at + ttl,
        }
    }

    pub fn result(&self) -> &ProbeResult {
        &self.result
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn ttl(&self) -> Duration {
        self.expires_at - self.stored_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Cache of the last result per component.
#[derive(Debug)]
pub struct ResultCache {
    entries: DashMap<String, CacheEntry>,
    /// Serializes fills per component so a burst of callers runs the probe once.
    fill_locks: DashMap<String, Arc<Mutex<()>>>,
    config: CacheConfig,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            fill_locks: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Return the unexpired result for `name`, or compute, store and return a new one.
    ///
    /// When the probe fails (timeout, panic), an expired entry is served as
    /// stale if enabled. Breaker rejections never fall back to a stale entry.
    /// Every other fault becomes a synthetic result cached for the error TTL.
    pub async fn get_or_compute<F, Fut>(&self, name: &str, probe_fn: F) -> ProbeResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ProbeResult, ProbeFault>>,
    {
        if let Some(hit) = self.get(name) {
            metrics::record_cache_lookup("hit");
            return hit;
        }

        let lock = self.fill_lock(name);
        let _guard = lock.lock().await;

        // Another caller may have filled it while we waited.
        if let Some(hit) = self.get(name) {
            metrics::record_cache_lookup("hit");
            return hit;
        }
        metrics::record_cache_lookup("miss");

        match probe_fn().await {
            Ok(result) => {
                let ttl = self.config.ttl_for(result.status());
                self.insert(name, result.clone(), ttl);
                result
            }
            Err(fault) => self.fallback(name, fault),
        }
    }

    /// Unexpired result for `name`.
    pub fn get(&self, name: &str) -> Option<ProbeResult> {
        self.entries
            .get(name)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.result.clone())
    }

    /// The raw entry, expired or not.
    pub fn peek(&self, name: &str) -> Option<CacheEntry> {
        self.entries.get(name).map(|entry| entry.clone())
    }

    /// Store a result under its own component name with the TTL for its status.
    pub fn store(&self, result: ProbeResult) {
        let ttl = self.config.ttl_for(result.status());
        let name = result.component_name().to_string();
        self.insert(&name, result, ttl);
    }

    /// Store a result under `name` with the TTL for its status.
    pub fn store_as(&self, name: &str, result: ProbeResult) {
        let ttl = self.config.ttl_for(result.status());
        self.insert(name, result, ttl);
    }

    fn insert(&self, name: &str, result: ProbeResult, ttl: Duration) {
        tracing::trace!(
            component = %name,
            status = %result.status(),
            ttl_ms = ttl.as_millis() as u64,
            "Caching probe result"
        );
        self.entries.insert(name.to_string(), CacheEntry::new(result, ttl));
        metrics::record_cache_size(self.entries.len());
    }

    fn fallback(&self, name: &str, fault: ProbeFault) -> ProbeResult {
        if self.config.return_stale_on_error && !fault.kind.is_breaker_rejection() {
            let stale = self.entries.get(name).map(|entry| {
                entry
                    .result
                    .to_builder()
                    .metadata(META_STALE, true)
                    .metadata("staleReason", fault.kind.to_string())
                    .build()
            });
            if let Some(stale) = stale {
                tracing::debug!(component = %name, reason = %fault.kind, "Serving stale result");
                metrics::record_cache_lookup("stale");
                return stale;
            }
        }

        let result = fault.into_result();
        self.insert(name, result.clone(), self.config.error_ttl());
        result
    }

    fn fill_lock(&self, name: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.fill_locks.get(name) {
            return lock.clone();
        }
        self.fill_locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run a [`CacheSweeper`] for this cache until `shutdown` fires.
    pub fn spawn_sweeper(self: &Arc<Self>, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        CacheSweeper::new(self.clone()).spawn(shutdown)
    }

    /// Remove one entry. Returns whether it existed.
    pub fn invalidate(&self, name: &str) -> bool {
        let removed = self.entries.remove(name).is_some();
        metrics::record_cache_size(self.entries.len());
        removed
    }

    pub fn invalidate_all(&self) {
        self.entries.clear();
        metrics::record_cache_size(0);
    }

    /// Drop every trace of a component (entry and fill lock).
    pub fn forget(&self, name: &str) {
        self.invalidate(name);
        self.fill_locks.remove(name);
    }

    /// Remove expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before.saturating_sub(self.entries.len());
        metrics::record_cache_size(self.entries.len());
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::result::META_ERROR_TYPE;
    use crate::model::HealthStatus;
    use crate::config::CircuitBreakerConfig;
    use crate::resilience::circuit_breaker::CircuitBreaker;
    use crate::resilience::fault::FaultKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::sleep;

    fn short_config() -> CacheConfig {
        CacheConfig {
            up_ttl_ms: 200,
            degraded_ttl_ms: 100,
            down_ttl_ms: 40,
            unknown_ttl_ms: 40,
            error_ttl_ms: 20,
            return_stale_on_error: true,
            sweep_interval_ms: 50,
        }
    }

    fn fault(name: &str) -> ProbeFault {
        ProbeFault::new(name, "database", FaultKind::Panicked("boom".into()), Duration::ZERO)
    }

    #[tokio::test]
    async fn test_hit_within_ttl_runs_probe_once() {
        let cache = ResultCache::new(CacheConfig::default());
        let calls = AtomicU32::new(0);
        let calls = &calls;

        for _ in 0..2 {
            let result = cache
                .get_or_compute("db", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(ProbeResult::up("db", "database", Duration::from_millis(5)))
                })
                .await;
            assert_eq!(result.status(), HealthStatus::Up);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ttl_follows_status() {
        let cache = ResultCache::new(CacheConfig::default());
        cache.store(ProbeResult::up("db", "database", Duration::ZERO));
        cache.store(ProbeResult::down("broker", "kafka", "refused"));

        let up_ttl = cache.peek("db").unwrap().ttl();
        let down_ttl = cache.peek("broker").unwrap().ttl();
        assert!(down_ttl < up_ttl);
    }

    #[tokio::test]
    async fn test_expired_entry_recomputed() {
        let cache = ResultCache::new(short_config());
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let compute = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(ProbeResult::down("db", "database", "refused"))
        };

        cache.get_or_compute("db", compute).await;
        sleep(Duration::from_millis(60)).await;
        assert!(cache.get("db").is_none());
        cache.get_or_compute("db", compute).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stale_on_error() {
        let cache = ResultCache::new(short_config());
        cache.store(ProbeResult::down("db", "database", "refused"));
        sleep(Duration::from_millis(60)).await;

        let result = cache.get_or_compute("db", || async { Err(fault("db")) }).await;
        assert!(result.is_stale());
        assert_eq!(result.error_message(), Some("refused"));
        assert!(!cache.peek("db").unwrap().result().is_stale());
    }

    #[tokio::test]
    async fn test_error_result_without_stale_entry() {
        let cache = ResultCache::new(short_config());
        let result = cache.get_or_compute("db", || async { Err(fault("db")) }).await;
        assert_eq!(result.status(), HealthStatus::Down);
        assert!(!result.is_stale());
        assert_eq!(result.meta(META_ERROR_TYPE).unwrap(), "UnexpectedException");
        assert_eq!(cache.peek("db").unwrap().ttl(), Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_breaker_rejection_bypasses_stale_entry() {
        let cache = ResultCache::new(short_config());
        cache.store(ProbeResult::up("db", "database", Duration::ZERO));
        sleep(Duration::from_millis(250)).await;

        let breaker = CircuitBreaker::new("db", CircuitBreakerConfig::default());
        breaker.force_open();
        let rejected = ProbeFault::new(
            "db",
            "database",
            FaultKind::CircuitOpen(breaker.snapshot()),
            Duration::ZERO,
        );

        let result = cache.get_or_compute("db", move || async move { Err(rejected) }).await;
        assert_eq!(result.status(), HealthStatus::Down);
        assert!(!result.is_stale());
        assert_eq!(result.meta(META_ERROR_TYPE).unwrap(), "CircuitBreakerOpen");
        assert_eq!(result.meta("circuitState").unwrap(), "OPEN");
        assert_eq!(cache.peek("db").unwrap().ttl(), Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_stale_disabled() {
        let cache = ResultCache::new(CacheConfig {
            return_stale_on_error: false,
            ..short_config()
        });
        cache.store(ProbeResult::up("db", "database", Duration::ZERO));
        cache.invalidate("db");
        cache.store(ProbeResult::down("db", "database", "refused"));
        sleep(Duration::from_millis(60)).await;

        let result = cache.get_or_compute("db", || async { Err(fault("db")) }).await;
        assert!(!result.is_stale());
        assert_eq!(result.meta(META_ERROR_TYPE).unwrap(), "UnexpectedException");
    }

    #[tokio::test]
    async fn test_concurrent_fill_runs_probe_once() {
        let cache = Arc::new(ResultCache::new(CacheConfig::default()));
        let calls = Arc::new(AtomicU32::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_compute("db", || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            sleep(Duration::from_millis(20)).await;
                            Ok(ProbeResult::up("db", "database", Duration::from_millis(20)))
                        })
                        .await
                })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().status(), HealthStatus::Up);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_and_purge() {
        let cache = ResultCache::new(short_config());
        cache.store(ProbeResult::up("db", "database", Duration::ZERO));
        cache.store(ProbeResult::down("broker", "kafka", "refused"));
        cache.store(ProbeResult::up("cache", "redis", Duration::ZERO));

        assert!(cache.invalidate("cache"));
        assert!(!cache.invalidate("cache"));
        assert_eq!(cache.len(), 2);

        sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.peek("broker").is_none());
        assert!(cache.get("db").is_some());

        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
