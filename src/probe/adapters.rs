//! Closure-backed probes.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use crate::model::ProbeResult;
use crate::probe::Probe;

/// Probe backed by an async closure.
pub struct FnProbe<F> {
    name: String,
    component_type: String,
    enabled: bool,
    check: F,
}

impl<F, Fut> FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ProbeResult> + Send,
{
    pub fn new(name: impl Into<String>, component_type: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            component_type: component_type.into(),
            enabled: true,
            check,
        }
    }

    /// Set whether the orchestrator should run this probe.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[async_trait]
impl<F, Fut> Probe for FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ProbeResult> + Send,
{
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
        (self.check)().await
    }
}

/// Probe backed by a synchronous closure, run on Tokio's blocking pool.
///
/// A per-call timeout stops waiting for the closure but cannot stop the
/// closure itself: the blocking thread stays busy until it returns.
pub struct BlockingProbe<F> {
    name: String,
    component_type: String,
    enabled: bool,
    check: Arc<F>,
}

impl<F> BlockingProbe<F>
where
    F: Fn() -> ProbeResult + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, component_type: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            component_type: component_type.into(),
            enabled: true,
            check: Arc::new(check),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[async_trait]
impl<F> Probe for BlockingProbe<F>
where
    F: Fn() -> ProbeResult + Send + Sync + 'static,
{
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
        let check = self.check.clone();
        match tokio::task::spawn_blocking(move || check()).await {
            Ok(result) => result,
            // Re-raise so the orchestrator's panic guard classifies it.
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => ProbeResult::down(&self.name, &self.component_type, e.to_string()),
        }
    }
}
