//! Circuit breaker for component protection.
//!
//! # States
//! - Closed: normal operation, probe calls pass through
//! - Open: component assumed down, calls rejected without invoking the probe
//! - Half-Open: a limited number of trial calls test for recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: calls in window >= minimum AND failure rate >= threshold
//! Open → Half-Open: first call after wait duration (that call is not a trial)
//! Half-Open → Closed: permitted trial calls succeed (counters reset)
//! Half-Open → Open: any trial call fails
//! ```
//!
//! # Design Decisions
//! - Per-component circuit breaker, each with its own lock
//! - The lock is never held across a probe execution
//! - Outcomes from calls admitted under an earlier state are ignored
//! - A permit dropped without an outcome counts as a failure

use serde::Serialize;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use parking_lot::Mutex;

use crate::config::CircuitBreakerConfig;
use crate::model::time::{serialize_epoch_millis, serialize_opt_epoch_millis};
use crate::model::{HealthStatus, ProbeResult};
use crate::observability::metrics;
use crate::resilience::fault::{FaultKind, ProbeFault};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

/// Point-in-time view of a breaker, attached to rejection results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    #[serde(serialize_with = "serialize_opt_epoch_millis")]
    pub last_failure_time: Option<SystemTime>,
    #[serde(serialize_with = "serialize_opt_epoch_millis")]
    pub last_success_time: Option<SystemTime>,
    #[serde(serialize_with = "serialize_epoch_millis")]
    pub state_transition_time: SystemTime,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    /// Bumped on every transition; permits from older generations are ignored.
    generation: u64,
    /// Closed-state outcomes inside the sliding window (`true` = failure).
    window: VecDeque<(Instant, bool)>,
    failure_count: u32,
    success_count: u32,
    half_open_in_flight: u32,
    /// Start of the open-state wait: the last failure or the forced transition.
    open_since: Instant,
    last_failure_time: Option<SystemTime>,
    last_success_time: Option<SystemTime>,
    state_transition_time: SystemTime,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            generation: 0,
            window: VecDeque::new(),
            failure_count: 0,
            success_count: 0,
            half_open_in_flight: 0,
            open_since: Instant::now(),
            last_failure_time: None,
            last_success_time: None,
            state_transition_time: SystemTime::now(),
        }
    }

    fn snapshot(&self) -> BreakerSnapshot {
        BreakerSnapshot {
            state: self.state,
            failure_count: self.failure_count,
            success_count: self.success_count,
            last_failure_time: self.last_failure_time,
            last_success_time: self.last_success_time,
            state_transition_time: self.state_transition_time,
        }
    }

    fn reset_counters(&mut self) {
        self.window.clear();
        self.failure_count = 0;
        self.success_count = 0;
        self.half_open_in_flight = 0;
    }

    /// Drop outcomes that slid out of the window.
    fn evict(&mut self, now: Instant, window: Duration) {
        while let Some(&(at, failed)) = self.window.front() {
            if now.duration_since(at) <= window {
                break;
            }
            self.window.pop_front();
            if failed {
                self.failure_count = self.failure_count.saturating_sub(1);
            } else {
                self.success_count = self.success_count.saturating_sub(1);
            }
        }
    }
}

/// Per-component circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        tracing::debug!(
            component = %name,
            failure_rate_threshold = config.failure_rate_threshold,
            minimum_number_of_calls = config.minimum_number_of_calls,
            wait_ms = config.wait_duration_in_open_state_ms,
            "Circuit breaker initialized"
        );
        Self {
            name,
            config,
            inner: Mutex::new(BreakerState::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Current state and counters; expired window entries are not counted.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::Closed {
            inner.evict(Instant::now(), self.config.sliding_window());
        }
        inner.snapshot()
    }

    /// Ask for permission to run one probe call.
    ///
    /// On rejection the returned kind carries the breaker snapshot.
    pub fn try_acquire(self: &Arc<Self>) -> Result<CallPermit, FaultKind> {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => Ok(self.permit(inner.generation, false)),
            CircuitState::Open => {
                if inner.open_since.elapsed() >= self.config.wait_duration_in_open_state() {
                    self.transition(&mut inner, CircuitState::HalfOpen);
                    Err(FaultKind::HalfOpenProbing(inner.snapshot()))
                } else {
                    Err(FaultKind::CircuitOpen(inner.snapshot()))
                }
            }
            CircuitState::HalfOpen => {
                let used = inner.success_count + inner.half_open_in_flight;
                if used < self.config.permitted_calls_in_half_open {
                    inner.half_open_in_flight += 1;
                    Ok(self.permit(inner.generation, true))
                } else {
                    Err(FaultKind::HalfOpenSaturated(inner.snapshot()))
                }
            }
        }
    }

    /// Run `op` under breaker protection.
    ///
    /// DOWN/UNKNOWN results and faults count as failures.
    pub async fn call<F, Fut>(self: &Arc<Self>, component_type: &str, op: F) -> Result<ProbeResult, ProbeFault>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ProbeResult, ProbeFault>>,
    {
        let permit = self
            .try_acquire()
            .map_err(|kind| ProbeFault::new(&self.name, component_type, kind, Duration::ZERO))?;

        let outcome = op().await;
        match &outcome {
            Ok(result) => permit.record(result.status()),
            Err(_) => permit.record_failure(),
        }
        outcome
    }

    /// Like [`call`](Self::call), but rejections and faults become synthetic results.
    pub async fn execute<F, Fut>(self: &Arc<Self>, component_type: &str, op: F) -> ProbeResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ProbeResult, ProbeFault>>,
    {
        self.call(component_type, op)
            .await
            .unwrap_or_else(ProbeFault::into_result)
    }

    /// Force the circuit open (operator action).
    pub fn force_open(&self) {
        let mut inner = self.inner.lock();
        tracing::warn!(component = %self.name, "Circuit breaker forced open");
        self.transition(&mut inner, CircuitState::Open);
    }

    /// Force the circuit closed, resetting counters.
    pub fn force_closed(&self) {
        let mut inner = self.inner.lock();
        tracing::warn!(component = %self.name, "Circuit breaker forced closed");
        self.transition(&mut inner, CircuitState::Closed);
    }

    /// Return to a pristine closed breaker.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        *inner = BreakerState::new();
        metrics::record_breaker_state(&self.name, CircuitState::Closed);
    }

    fn permit(self: &Arc<Self>, generation: u64, trial: bool) -> CallPermit {
        CallPermit {
            breaker: self.clone(),
            generation,
            trial,
            done: false,
        }
    }

    fn on_success(&self, generation: u64, trial: bool) {
        let mut inner = self.inner.lock();
        inner.last_success_time = Some(SystemTime::now());
        if inner.generation != generation {
            return;
        }

        match inner.state {
            CircuitState::Closed => {
                let now = Instant::now();
                inner.evict(now, self.config.sliding_window());
                inner.window.push_back((now, false));
                inner.success_count += 1;
            }
            CircuitState::HalfOpen => {
                if trial {
                    inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
                }
                inner.success_count += 1;
                if inner.success_count >= self.config.permitted_calls_in_half_open {
                    self.transition(&mut inner, CircuitState::Closed);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, generation: u64) {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        inner.last_failure_time = Some(SystemTime::now());
        if inner.generation != generation {
            return;
        }

        match inner.state {
            CircuitState::Closed => {
                inner.evict(now, self.config.sliding_window());
                inner.window.push_back((now, true));
                inner.failure_count += 1;

                let calls = inner.failure_count + inner.success_count;
                let rate = inner.failure_count as f64 / calls as f64;
                if calls >= self.config.minimum_number_of_calls
                    && rate >= self.config.failure_rate_threshold
                {
                    tracing::warn!(
                        component = %self.name,
                        failures = inner.failure_count,
                        calls,
                        failure_rate = rate,
                        "Failure rate threshold reached"
                    );
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                inner.failure_count += 1;
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::Open => {}
        }
    }

    /// Move to `to`. No-op when already there.
    fn transition(&self, inner: &mut BreakerState, to: CircuitState) {
        let from = inner.state;
        if from == to {
            return;
        }

        inner.state = to;
        inner.generation += 1;
        inner.state_transition_time = SystemTime::now();
        match to {
            CircuitState::Closed => inner.reset_counters(),
            CircuitState::Open => {
                inner.half_open_in_flight = 0;
                inner.open_since = Instant::now();
            }
            CircuitState::HalfOpen => {
                inner.window.clear();
                inner.success_count = 0;
                inner.half_open_in_flight = 0;
            }
        }

        match to {
            CircuitState::Open => tracing::warn!(
                component = %self.name,
                from = from.as_str(),
                to = to.as_str(),
                failures = inner.failure_count,
                wait_ms = self.config.wait_duration_in_open_state_ms,
                "Circuit breaker state transition"
            ),
            _ => tracing::info!(
                component = %self.name,
                from = from.as_str(),
                to = to.as_str(),
                "Circuit breaker state transition"
            ),
        }
        metrics::record_breaker_transition(&self.name, to);
    }
}

/// Permission to run one call. Record exactly one outcome.
///
/// Dropping the permit without recording (e.g. the task was aborted)
/// counts as a failure.
#[derive(Debug)]
pub struct CallPermit {
    breaker: Arc<CircuitBreaker>,
    generation: u64,
    trial: bool,
    done: bool,
}

impl CallPermit {
    /// True for half-open trial calls.
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    /// Record an outcome by status: UP/DEGRADED succeed, DOWN/UNKNOWN fail.
    pub fn record(self, status: HealthStatus) {
        if status.is_operational() {
            self.record_success();
        } else {
            self.record_failure();
        }
    }

    pub fn record_success(mut self) {
        self.done = true;
        self.breaker.on_success(self.generation, self.trial);
    }

    pub fn record_failure(mut self) {
        self.done = true;
        self.breaker.on_failure(self.generation);
    }
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        if !self.done {
            tracing::debug!(component = %self.breaker.name, "Call abandoned, recording failure");
            self.breaker.on_failure(self.generation);
        }
    }
}
