//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, threshold within (0, 1])
//! - Check TTL ordering so worse statuses expire sooner
//! - Detect duplicate or unparseable probe definitions
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HealthConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::HealthConfig;

/// A single semantic configuration violation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("global_timeout_ms ({global}) must not be shorter than per_call_timeout_ms ({per_call})")]
    GlobalTimeoutTooShort { global: u64, per_call: u64 },

    #[error("failure_rate_threshold must be within (0, 1], got {0}")]
    FailureRateOutOfRange(f64),

    #[error("cache TTLs must satisfy up >= degraded >= down >= error")]
    TtlOrdering,

    #[error("probe name must not be empty")]
    EmptyProbeName,

    #[error("duplicate probe name: {0}")]
    DuplicateProbe(String),

    #[error("probe {name}: invalid address '{address}'")]
    InvalidAddress { name: String, address: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &HealthConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let orch = &config.orchestrator;
    if orch.per_call_timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue { field: "per_call_timeout_ms" });
    }
    if orch.global_timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue { field: "global_timeout_ms" });
    } else if orch.global_timeout_ms < orch.per_call_timeout_ms {
        errors.push(ValidationError::GlobalTimeoutTooShort {
            global: orch.global_timeout_ms,
            per_call: orch.per_call_timeout_ms,
        });
    }

    let cache = &config.cache;
    if cache.error_ttl_ms == 0 {
        errors.push(ValidationError::ZeroValue { field: "error_ttl_ms" });
    }
    if cache.sweep_interval_ms == 0 {
        errors.push(ValidationError::ZeroValue { field: "sweep_interval_ms" });
    }
    let ordered = cache.up_ttl_ms >= cache.degraded_ttl_ms
        && cache.degraded_ttl_ms >= cache.down_ttl_ms
        && cache.down_ttl_ms >= cache.error_ttl_ms
        && cache.unknown_ttl_ms >= cache.error_ttl_ms;
    if !ordered {
        errors.push(ValidationError::TtlOrdering);
    }

    let cb = &config.circuit_breaker;
    if !(cb.failure_rate_threshold > 0.0 && cb.failure_rate_threshold <= 1.0) {
        errors.push(ValidationError::FailureRateOutOfRange(cb.failure_rate_threshold));
    }
    if cb.minimum_number_of_calls == 0 {
        errors.push(ValidationError::ZeroValue { field: "minimum_number_of_calls" });
    }
    if cb.sliding_window_ms == 0 {
        errors.push(ValidationError::ZeroValue { field: "sliding_window_ms" });
    }
    if cb.permitted_calls_in_half_open == 0 {
        errors.push(ValidationError::ZeroValue { field: "permitted_calls_in_half_open" });
    }

    let mut seen = HashSet::new();
    for probe in &config.probes {
        if probe.name.trim().is_empty() {
            errors.push(ValidationError::EmptyProbeName);
            continue;
        }
        if !seen.insert(probe.name.as_str()) {
            errors.push(ValidationError::DuplicateProbe(probe.name.clone()));
        }
        if probe.address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                name: probe.name.clone(),
                address: probe.address.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ProbeConfig;

    fn probe(name: &str, address: &str) -> ProbeConfig {
        ProbeConfig {
            name: name.to_string(),
            component_type: "tcp".to_string(),
            address: address.to_string(),
            enabled: true,
            priority: 0,
            degraded_threshold_ms: 500,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&HealthConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = HealthConfig::default();
        config.orchestrator.global_timeout_ms = 100;
        config.orchestrator.per_call_timeout_ms = 500;
        config.circuit_breaker.failure_rate_threshold = 1.5;
        config.cache.down_ttl_ms = 60_000;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::GlobalTimeoutTooShort { global: 100, per_call: 500 }));
        assert!(errors.contains(&ValidationError::FailureRateOutOfRange(1.5)));
        assert!(errors.contains(&ValidationError::TtlOrdering));
    }

    #[test]
    fn test_probe_definitions() {
        let mut config = HealthConfig::default();
        config.probes = vec![
            probe("db", "127.0.0.1:5432"),
            probe("db", "127.0.0.1:5433"),
            probe("", "127.0.0.1:1"),
            probe("cache", "not-an-address"),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateProbe("db".to_string()),
                ValidationError::EmptyProbeName,
                ValidationError::InvalidAddress {
                    name: "cache".to_string(),
                    address: "not-an-address".to_string(),
                },
            ]
        );
    }
}
