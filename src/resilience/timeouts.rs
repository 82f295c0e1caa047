//! Timeout and panic guarding for a single probe call.
//!
//! # Responsibilities
//! - Wrap a probe execution with the per-call deadline
//! - Catch panics from probe implementations
//! - Turn both into typed faults
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; on expiry the probe future is dropped
//! - Dropping is cooperative cancellation: async probes stop at their next
//!   await point, blocking work already handed to a thread keeps running
//! - Timeout errors are distinct from other errors

use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tokio::time;

use crate::model::ProbeResult;
use crate::probe::Probe;
use crate::resilience::fault::{FaultKind, ProbeFault};

/// Execute `probe` with a deadline, converting timeouts and panics into faults.
pub async fn guarded_execute(probe: &dyn Probe, timeout: Duration) -> Result<ProbeResult, ProbeFault> {
    let start = Instant::now();
    let execution = AssertUnwindSafe(probe.execute()).catch_unwind();

    let kind = match time::timeout(timeout, execution).await {
        Ok(Ok(result)) => return Ok(result),
        Ok(Err(panic)) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(component = %probe.component_name(), panic = %message, "Probe panicked");
            FaultKind::Panicked(message)
        }
        Err(_) => {
            tracing::warn!(
                component = %probe.component_name(),
                timeout_ms = timeout.as_millis() as u64,
                "Probe timed out"
            );
            FaultKind::Timeout(timeout)
        }
    };

    Err(ProbeFault::new(
        probe.component_name(),
        probe.component_type(),
        kind,
        start.elapsed(),
    ))
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "probe panicked".to_string()
    }
}
