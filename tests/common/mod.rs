//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use health_orchestrator::config::{CacheConfig, CircuitBreakerConfig};
use health_orchestrator::{HealthStatus, Orchestrator, Probe, ProbeRegistry, ProbeResult};

/// Tracks how many probe executions overlap.
#[derive(Debug, Default)]
pub struct ConcurrencyTracker {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyTracker {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlight(self)
    }
}

struct InFlight<'a>(&'a ConcurrencyTracker);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runtime controls of a [`ScriptedProbe`], kept by the test after registration.
#[derive(Clone)]
pub struct ProbeHandle {
    calls: Arc<AtomicU32>,
    status: Arc<Mutex<HealthStatus>>,
    panicking: Arc<AtomicBool>,
}

impl ProbeHandle {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_status(&self, status: HealthStatus) {
        *self.status.lock() = status;
    }

    pub fn set_panicking(&self, panicking: bool) {
        self.panicking.store(panicking, Ordering::SeqCst);
    }
}

/// Probe whose behaviour is scripted by the test.
pub struct ScriptedProbe {
    name: String,
    component_type: String,
    enabled: bool,
    delay: Duration,
    hang: bool,
    handle: ProbeHandle,
    tracker: Arc<ConcurrencyTracker>,
}

impl ScriptedProbe {
    pub fn new(name: &str, status: HealthStatus) -> Self {
        Self {
            name: name.to_string(),
            component_type: "scripted".to_string(),
            enabled: true,
            delay: Duration::ZERO,
            hang: false,
            handle: ProbeHandle {
                calls: Arc::new(AtomicU32::new(0)),
                status: Arc::new(Mutex::new(status)),
                panicking: Arc::new(AtomicBool::new(false)),
            },
            tracker: Arc::new(ConcurrencyTracker::default()),
        }
    }

    pub fn up(name: &str) -> Self {
        Self::new(name, HealthStatus::Up)
    }

    pub fn down(name: &str) -> Self {
        Self::new(name, HealthStatus::Down)
    }

    /// Never returns.
    pub fn hanging(name: &str) -> Self {
        Self {
            hang: true,
            ..Self::up(name)
        }
    }

    pub fn panicking(name: &str) -> Self {
        let probe = Self::up(name);
        probe.handle.set_panicking(true);
        probe
    }

    pub fn of_type(mut self, component_type: &str) -> Self {
        self.component_type = component_type.to_string();
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn tracked_by(mut self, tracker: Arc<ConcurrencyTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn handle(&self) -> ProbeHandle {
        self.handle.clone()
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    fn component_name(&self) -> &str {
        &self.name
    }

    fn component_type(&self) -> &str {
        &self.component_type
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn execute(&self) -> ProbeResult {
        self.handle.calls.fetch_add(1, Ordering::SeqCst);
        let _in_flight = self.tracker.enter();

        if self.hang {
            std::future::pending::<()>().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.handle.panicking.load(Ordering::SeqCst) {
            panic!("{} exploded", self.name);
        }

        let status = *self.handle.status.lock();
        let builder = ProbeResult::builder(&self.name, &self.component_type)
            .status(status)
            .latency(self.delay);
        match status {
            HealthStatus::Up => builder.build(),
            _ => builder.error(format!("{} is {}", self.name, status)).build(),
        }
    }
}

/// Register a probe and return its handle.
pub fn register(registry: &ProbeRegistry, probe: ScriptedProbe) -> ProbeHandle {
    let handle = probe.handle();
    registry.register(Arc::new(probe)).unwrap();
    handle
}

/// Breaker that opens after 5 calls at 50% failures and waits 200ms.
pub fn fast_breaker() -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_rate_threshold: 0.5,
        minimum_number_of_calls: 5,
        sliding_window_ms: 60_000,
        wait_duration_in_open_state_ms: 200,
        permitted_calls_in_half_open: 2,
    }
}

pub fn orchestrator(
    registry: Arc<ProbeRegistry>,
    cache: CacheConfig,
    workers: usize,
    per_call: Duration,
    global: Duration,
) -> Orchestrator {
    Orchestrator::new(registry, cache, fast_breaker(), workers, per_call, global)
}

/// Orchestrator with default cache TTLs, 4 workers, 200ms per call, 1s global.
pub fn default_orchestrator(registry: Arc<ProbeRegistry>) -> Orchestrator {
    orchestrator(
        registry,
        CacheConfig::default(),
        4,
        Duration::from_millis(200),
        Duration::from_secs(1),
    )
}

pub fn names(results: &[ProbeResult]) -> Vec<&str> {
    results.iter().map(|r| r.component_name()).collect()
}
