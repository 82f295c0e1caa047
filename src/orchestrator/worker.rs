//! Execution path of one component within a report cycle.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::cache::ResultCache;
use crate::model::ProbeResult;
use crate::registry::RegistryEntry;
use crate::resilience::fault::{FaultKind, ProbeFault};
use crate::resilience::timeouts::guarded_execute;
use crate::resilience::CircuitBreakerRegistry;

/// Shared state a component task needs. Cheap to clone into each task.
#[derive(Debug, Clone)]
pub(crate) struct ExecutionPath {
    pub(crate) cache: Arc<ResultCache>,
    pub(crate) breakers: Arc<CircuitBreakerRegistry>,
    pub(crate) workers: Arc<Semaphore>,
    pub(crate) per_call_timeout: Duration,
}

impl ExecutionPath {
    /// Produce the result for one component: cache, then breaker, then probe.
    pub(crate) async fn run(self, entry: Arc<RegistryEntry>, bypass_cache: bool) -> ProbeResult {
        let breaker = self.breakers.for_component(entry.name());
        let component_type = entry.component_type();

        if bypass_cache {
            return match breaker.call(component_type, || self.invoke(&entry)).await {
                Ok(result) => {
                    self.cache.store_as(entry.name(), result.clone());
                    result
                }
                Err(fault) => fault.into_result(),
            };
        }

        self.cache
            .get_or_compute(entry.name(), || {
                breaker.call(component_type, || self.invoke(&entry))
            })
            .await
    }

    /// Hold a worker slot for the duration of the probe call.
    async fn invoke(&self, entry: &RegistryEntry) -> Result<ProbeResult, ProbeFault> {
        let queued = Instant::now();
        let _slot = self.workers.acquire().await.map_err(|_| {
            ProbeFault::new(entry.name(), entry.component_type(), FaultKind::Cancelled, queued.elapsed())
        })?;

        let waited = queued.elapsed();
        if waited > Duration::from_millis(100) {
            tracing::debug!(
                component = %entry.name(),
                waited_ms = waited.as_millis() as u64,
                "Waited for worker slot"
            );
        }

        guarded_execute(entry.probe().as_ref(), self.per_call_timeout).await
    }
}
