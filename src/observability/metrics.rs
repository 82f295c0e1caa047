//! Metrics collection and exposition.
//!
//! # Metrics
//! - `health_probe_executions_total` (counter): results by component and status
//! - `health_probe_latency_seconds` (histogram): probe latency by component
//! - `health_probe_status` (gauge): last status rank per component (3=UP .. 0=UNKNOWN)
//! - `health_circuit_breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `health_circuit_breaker_transitions_total` (counter): transitions by target state
//! - `health_cache_lookups_total` (counter): lookups by outcome (hit, miss, stale)
//! - `health_cache_entries` (gauge): current cache size
//! - `health_report_duration_seconds` (histogram): wall time of a full cycle
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library users pay nothing
//! - Labels are component names, never free-form error text

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::model::ProbeResult;
use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe_result(result: &ProbeResult) {
    let component = result.component_name().to_string();
    metrics::counter!(
        "health_probe_executions_total",
        "component" => component.clone(),
        "status" => result.status().as_str()
    )
    .increment(1);
    metrics::histogram!("health_probe_latency_seconds", "component" => component.clone())
        .record(result.latency().as_secs_f64());
    metrics::gauge!("health_probe_status", "component" => component)
        .set(f64::from(result.status().rank()));
}

pub fn record_breaker_transition(component: &str, to: CircuitState) {
    metrics::counter!(
        "health_circuit_breaker_transitions_total",
        "component" => component.to_string(),
        "to" => to.as_str()
    )
    .increment(1);
    record_breaker_state(component, to);
}

pub fn record_breaker_state(component: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::Open => 1.0,
        CircuitState::HalfOpen => 2.0,
    };
    metrics::gauge!("health_circuit_breaker_state", "component" => component.to_string()).set(value);
}

/// `outcome` is one of `hit`, `miss`, `stale`.
pub fn record_cache_lookup(outcome: &'static str) {
    metrics::counter!("health_cache_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_size(size: usize) {
    metrics::gauge!("health_cache_entries").set(size as f64);
}

pub fn record_report_duration(duration: Duration) {
    metrics::histogram!("health_report_duration_seconds").record(duration.as_secs_f64());
}
