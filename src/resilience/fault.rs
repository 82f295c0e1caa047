//! Execution faults and their synthetic results.

use std::time::Duration;

use crate::model::result::META_ERROR_TYPE;
use crate::model::{HealthStatus, ProbeResult};
use crate::resilience::circuit_breaker::BreakerSnapshot;

/// Why a probe execution produced no result of its own.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FaultKind {
    /// The probe exceeded the per-call timeout.
    #[error("timeout after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The probe implementation panicked.
    #[error("unexpected exception: {0}")]
    Panicked(String),

    /// The circuit is open; the probe was not invoked.
    #[error("circuit breaker open")]
    CircuitOpen(BreakerSnapshot),

    /// The wait in open state elapsed; this call moved the circuit to half-open.
    #[error("circuit breaker half-open, probing for recovery")]
    HalfOpenProbing(BreakerSnapshot),

    /// Every half-open trial slot is taken.
    #[error("circuit breaker half-open, trial calls exhausted")]
    HalfOpenSaturated(BreakerSnapshot),

    /// The execution was dropped before it finished.
    #[error("probe execution cancelled")]
    Cancelled,

    /// The report cycle hit its global deadline before this component finished.
    #[error("orchestrator timeout")]
    OrchestratorTimeout,
}

impl FaultKind {
    /// Value of the `errorType` metadata on the synthetic result.
    pub fn error_type(&self) -> &'static str {
        match self {
            FaultKind::Timeout(_) => "Timeout",
            FaultKind::Panicked(_) => "UnexpectedException",
            FaultKind::CircuitOpen(_) => "CircuitBreakerOpen",
            FaultKind::HalfOpenProbing(_) | FaultKind::HalfOpenSaturated(_) => "CircuitBreakerHalfOpen",
            FaultKind::Cancelled => "Cancelled",
            FaultKind::OrchestratorTimeout => "OrchestratorTimeout",
        }
    }

    /// Status reported for this fault.
    pub fn status(&self) -> HealthStatus {
        match self {
            FaultKind::HalfOpenProbing(_) | FaultKind::HalfOpenSaturated(_) => HealthStatus::Degraded,
            _ => HealthStatus::Down,
        }
    }

    /// True when the breaker refused the call and the probe never ran.
    pub fn is_breaker_rejection(&self) -> bool {
        self.breaker_snapshot().is_some()
    }

    /// Breaker state captured when the call was rejected.
    pub fn breaker_snapshot(&self) -> Option<&BreakerSnapshot> {
        match self {
            FaultKind::CircuitOpen(s) | FaultKind::HalfOpenProbing(s) | FaultKind::HalfOpenSaturated(s) => Some(s),
            _ => None,
        }
    }
}

/// A fault attributed to one component.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{component_name}: {kind}")]
pub struct ProbeFault {
    pub component_name: String,
    pub component_type: String,
    pub kind: FaultKind,
    /// Time spent before the fault was detected.
    pub elapsed: Duration,
}

impl ProbeFault {
    pub fn new(
        component_name: impl Into<String>,
        component_type: impl Into<String>,
        kind: FaultKind,
        elapsed: Duration,
    ) -> Self {
        Self {
            component_name: component_name.into(),
            component_type: component_type.into(),
            kind,
            elapsed,
        }
    }

    /// Convert into the synthetic result reported in place of a real one.
    pub fn into_result(self) -> ProbeResult {
        let mut builder = ProbeResult::builder(self.component_name, self.component_type)
            .status(self.kind.status())
            .latency(self.elapsed)
            .error(self.kind.to_string())
            .metadata(META_ERROR_TYPE, self.kind.error_type());

        if let Some(snapshot) = self.kind.breaker_snapshot() {
            builder = builder
                .metadata("circuitState", snapshot.state.as_str())
                .metadata("failureCount", snapshot.failure_count)
                .metadata("successCount", snapshot.success_count);
        }
        builder.build()
    }
}
