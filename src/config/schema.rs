//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the health
//! orchestrator. All types derive Serde traits for deserialization from config
//! files, and every field has a default so the core can be built in code.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::HealthStatus;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HealthConfig {
    /// Worker pool and timeout settings.
    pub orchestrator: OrchestratorConfig,

    /// Result cache settings.
    pub cache: CacheConfig,

    /// Circuit breaker settings, shared by every component.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// TCP probes wired up by the CLI.
    pub probes: Vec<ProbeConfig>,
}

/// Orchestrator scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Maximum probes executing at once (0 = available CPU cores).
    pub worker_pool_size: usize,

    /// Deadline for a single probe execution in milliseconds.
    pub per_call_timeout_ms: u64,

    /// Deadline for a whole report cycle in milliseconds.
    pub global_timeout_ms: u64,
}

impl OrchestratorConfig {
    pub fn per_call_timeout(&self) -> Duration {
        Duration::from_millis(self.per_call_timeout_ms)
    }

    pub fn global_timeout(&self) -> Duration {
        Duration::from_millis(self.global_timeout_ms)
    }

    /// Effective pool size, resolving 0 to the number of CPU cores.
    pub fn effective_pool_size(&self) -> usize {
        if self.worker_pool_size > 0 {
            return self.worker_pool_size;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: 0,
            per_call_timeout_ms: 5_000,
            global_timeout_ms: 15_000,
        }
    }
}

/// Result cache configuration.
///
/// TTLs are a pure function of the cached status.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for UP results in milliseconds.
    pub up_ttl_ms: u64,

    /// TTL for DEGRADED results in milliseconds.
    pub degraded_ttl_ms: u64,

    /// TTL for DOWN results in milliseconds.
    pub down_ttl_ms: u64,

    /// TTL for UNKNOWN results in milliseconds.
    pub unknown_ttl_ms: u64,

    /// TTL for synthetic results produced from execution faults.
    pub error_ttl_ms: u64,

    /// Serve an expired entry instead of a fault result when execution fails.
    pub return_stale_on_error: bool,

    /// Interval of the background expiry sweep in milliseconds.
    pub sweep_interval_ms: u64,
}

impl CacheConfig {
    /// TTL applied to a result with the given status.
    pub fn ttl_for(&self, status: HealthStatus) -> Duration {
        let ms = match status {
            HealthStatus::Up => self.up_ttl_ms,
            HealthStatus::Degraded => self.degraded_ttl_ms,
            HealthStatus::Down => self.down_ttl_ms,
            HealthStatus::Unknown => self.unknown_ttl_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn error_ttl(&self) -> Duration {
        Duration::from_millis(self.error_ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            up_ttl_ms: 30_000,
            degraded_ttl_ms: 15_000,
            down_ttl_ms: 10_000,
            unknown_ttl_ms: 10_000,
            error_ttl_ms: 5_000,
            return_stale_on_error: true,
            sweep_interval_ms: 60_000,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Failure rate (0.0..=1.0) at or above which the circuit opens.
    pub failure_rate_threshold: f64,

    /// Calls required within the window before the rate is evaluated.
    pub minimum_number_of_calls: u32,

    /// Length of the sliding window in milliseconds.
    pub sliding_window_ms: u64,

    /// Time to stay open after the last failure, in milliseconds.
    pub wait_duration_in_open_state_ms: u64,

    /// Successful trial calls required in half-open before closing.
    pub permitted_calls_in_half_open: u32,
}

impl CircuitBreakerConfig {
    pub fn sliding_window(&self) -> Duration {
        Duration::from_millis(self.sliding_window_ms)
    }

    pub fn wait_duration_in_open_state(&self) -> Duration {
        Duration::from_millis(self.wait_duration_in_open_state_ms)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 0.5,
            minimum_number_of_calls: 5,
            sliding_window_ms: 60_000,
            wait_duration_in_open_state_ms: 30_000,
            permitted_calls_in_half_open: 3,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// TCP probe definition used by the CLI wiring.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Unique component name.
    pub name: String,

    /// Component category.
    #[serde(rename = "type", default = "default_probe_type")]
    pub component_type: String,

    /// Address to connect to (e.g., "127.0.0.1:5432").
    pub address: String,

    /// Disabled probes are registered but never executed.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Report priority (higher = listed first).
    #[serde(default)]
    pub priority: i32,

    /// Connect latency above which the component is DEGRADED.
    #[serde(default = "default_degraded_threshold_ms")]
    pub degraded_threshold_ms: u64,
}

fn default_probe_type() -> String {
    "tcp".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_degraded_threshold_ms() -> u64 {
    500
}
