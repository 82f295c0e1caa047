//! Bounded-parallelism report cycles.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{broadcast, Semaphore};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::cache::ResultCache;
use crate::config::{CacheConfig, CircuitBreakerConfig, HealthConfig};
use crate::model::{HealthSummary, ProbeResult};
use crate::observability::metrics;
use crate::orchestrator::report::HealthReport;
use crate::orchestrator::worker::ExecutionPath;
use crate::probe::Probe;
use crate::registry::{ProbeRegistry, RegistryEntry};
use crate::resilience::fault::{FaultKind, ProbeFault};
use crate::resilience::timeouts::panic_message;
use crate::resilience::CircuitBreakerRegistry;

/// Runs every enabled probe through cache, breaker and worker pool.
///
/// Owns the cache and breaker state; the registry is shared with the wiring
/// layer, which may keep registering probes while cycles run.
#[derive(Debug)]
pub struct Orchestrator {
    registry: Arc<ProbeRegistry>,
    path: ExecutionPath,
    worker_pool_size: usize,
    global_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<ProbeRegistry>,
        cache_config: CacheConfig,
        breaker_config: CircuitBreakerConfig,
        worker_pool_size: usize,
        per_call_timeout: Duration,
        global_timeout: Duration,
    ) -> Self {
        let worker_pool_size = worker_pool_size.max(1);
        let path = ExecutionPath {
            cache: Arc::new(ResultCache::new(cache_config)),
            breakers: Arc::new(CircuitBreakerRegistry::new(breaker_config)),
            workers: Arc::new(Semaphore::new(worker_pool_size)),
            per_call_timeout,
        };

        Self {
            registry,
            path,
            worker_pool_size,
            global_timeout,
        }
    }

    /// Build from a loaded configuration. A pool size of 0 means one worker per CPU.
    pub fn from_config(registry: Arc<ProbeRegistry>, config: &HealthConfig) -> Self {
        let orch = &config.orchestrator;
        Self::new(
            registry,
            config.cache.clone(),
            config.circuit_breaker.clone(),
            orch.effective_pool_size(),
            orch.per_call_timeout(),
            orch.global_timeout(),
        )
    }

    /// One result per enabled probe, in registry order.
    ///
    /// Never fails: timeouts, panics and breaker rejections are all reported
    /// as results.
    pub async fn execute_all(&self, bypass_cache: bool) -> Vec<ProbeResult> {
        self.execute_all_until(bypass_cache, Instant::now() + self.global_timeout)
            .await
    }

    /// Like [`execute_all`](Self::execute_all) with a caller deadline.
    ///
    /// The effective deadline is the earlier of `deadline` and the global timeout.
    pub async fn execute_all_until(&self, bypass_cache: bool, deadline: Instant) -> Vec<ProbeResult> {
        let report_id = Uuid::new_v4();
        self.run_cycle(bypass_cache, deadline)
            .instrument(tracing::info_span!("health_report", %report_id, bypass_cache))
            .await
    }

    /// Run a full cycle and wrap it with an id, timing and a summary.
    pub async fn report(&self, bypass_cache: bool) -> HealthReport {
        let report_id = Uuid::new_v4();
        let generated_at = SystemTime::now();
        let started = Instant::now();

        let results = self
            .run_cycle(bypass_cache, started + self.global_timeout)
            .instrument(tracing::info_span!("health_report", %report_id, bypass_cache))
            .await;
        let duration = started.elapsed();

        HealthReport {
            report_id,
            generated_at,
            duration,
            summary: HealthSummary::from_results(&results),
            results,
        }
    }

    /// Run a single component. `None` when it is not registered or disabled.
    pub async fn execute_one(&self, name: &str, bypass_cache: bool) -> Option<ProbeResult> {
        let entry = self.registry.entry(name)?;
        let started = Instant::now();
        let result = match is_enabled(&entry) {
            Ok(false) => return None,
            Ok(true) => {
                let task = self.dispatch(&entry, bypass_cache);
                self.collect(&entry, task, started + self.global_timeout, started)
                    .await
            }
            Err(fault) => fault.into_result(),
        };
        metrics::record_probe_result(&result);
        Some(result)
    }

    async fn run_cycle(&self, bypass_cache: bool, deadline: Instant) -> Vec<ProbeResult> {
        let started = Instant::now();
        let deadline = deadline.min(started + self.global_timeout);

        // A panicking enabled check keeps its slot as a synthetic result.
        let slots: Vec<(Arc<RegistryEntry>, Result<JoinHandle<ProbeResult>, ProbeFault>)> = self
            .registry
            .entries()
            .into_iter()
            .filter_map(|entry| {
                let slot = match is_enabled(&entry) {
                    Ok(true) => Ok(self.dispatch(&entry, bypass_cache)),
                    Ok(false) => return None,
                    Err(fault) => Err(fault),
                };
                Some((entry, slot))
            })
            .collect();

        tracing::debug!(components = slots.len(), "Health report cycle starting");

        // Tasks run concurrently; awaiting in order only fixes the output order.
        let mut results = Vec::with_capacity(slots.len());
        for (entry, slot) in slots {
            let result = match slot {
                Ok(task) => self.collect(&entry, task, deadline, started).await,
                Err(fault) => fault.into_result(),
            };
            metrics::record_probe_result(&result);
            results.push(result);
        }

        let duration = started.elapsed();
        metrics::record_report_duration(duration);
        tracing::info!(
            components = results.len(),
            duration_ms = duration.as_millis() as u64,
            "Health report cycle complete"
        );
        results
    }

    fn dispatch(&self, entry: &Arc<RegistryEntry>, bypass_cache: bool) -> JoinHandle<ProbeResult> {
        tokio::spawn(self.path.clone().run(entry.clone(), bypass_cache).in_current_span())
    }

    /// Wait for one task until `deadline`, abandoning it on expiry.
    async fn collect(
        &self,
        entry: &RegistryEntry,
        mut task: JoinHandle<ProbeResult>,
        deadline: Instant,
        started: Instant,
    ) -> ProbeResult {
        let kind = match time::timeout_at(deadline, &mut task).await {
            Ok(Ok(result)) => return result,
            Ok(Err(e)) => join_failure(entry, e),
            Err(_) => {
                task.abort();
                tracing::warn!(component = %entry.name(), "Abandoned at orchestrator deadline");
                FaultKind::OrchestratorTimeout
            }
        };

        ProbeFault::new(entry.name(), entry.component_type(), kind, started.elapsed()).into_result()
    }

    /// Remove a component from the registry and drop its breaker and cache state.
    pub fn deregister(&self, name: &str) -> bool {
        let removed = self.registry.deregister(name);
        self.path.breakers.remove(name);
        self.path.cache.forget(name);
        removed
    }

    /// Start purging expired cache entries until `shutdown` fires.
    pub fn spawn_cache_sweeper(&self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        self.path.cache.spawn_sweeper(shutdown)
    }

    pub fn registry(&self) -> &Arc<ProbeRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.path.cache
    }

    pub fn breakers(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.path.breakers
    }

    pub fn worker_pool_size(&self) -> usize {
        self.worker_pool_size
    }

    pub fn per_call_timeout(&self) -> Duration {
        self.path.per_call_timeout
    }

    pub fn global_timeout(&self) -> Duration {
        self.global_timeout
    }
}

/// Evaluate `enabled()` with a panic guard. A panic yields the fault to report in its slot.
fn is_enabled(entry: &RegistryEntry) -> Result<bool, ProbeFault> {
    panic::catch_unwind(AssertUnwindSafe(|| entry.probe().enabled())).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::error!(component = %entry.name(), panic = %message, "Enabled check panicked");
        ProbeFault::new(
            entry.name(),
            entry.component_type(),
            FaultKind::Panicked(message),
            Duration::ZERO,
        )
    })
}

fn join_failure(entry: &RegistryEntry, e: JoinError) -> FaultKind {
    if e.is_panic() {
        let message = panic_message(e.into_panic().as_ref());
        tracing::error!(component = %entry.name(), panic = %message, "Component task panicked");
        FaultKind::Panicked(message)
    } else {
        tracing::warn!(component = %entry.name(), "Component task cancelled");
        FaultKind::Cancelled
    }
}
