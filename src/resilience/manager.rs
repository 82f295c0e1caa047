//! Per-component breaker lookup.

use dashmap::DashMap;
use std::sync::Arc;

use crate::config::CircuitBreakerConfig;
use crate::resilience::circuit_breaker::{BreakerSnapshot, CircuitBreaker};

/// Lazily creates and holds one circuit breaker per component name.
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: DashMap::new(),
            config,
        }
    }

    /// Breaker for `name`, created on first use.
    pub fn for_component(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return existing.clone();
        }
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(name, self.config.clone())))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|b| b.clone())
    }

    /// Drop the breaker for a deregistered component.
    pub fn remove(&self, name: &str) -> bool {
        self.breakers.remove(name).is_some()
    }

    /// Snapshots of every breaker, sorted by component name.
    pub fn snapshots(&self) -> Vec<(String, BreakerSnapshot)> {
        let breakers: Vec<Arc<CircuitBreaker>> = self.breakers.iter().map(|r| r.value().clone()).collect();
        let mut snapshots: Vec<_> = breakers
            .iter()
            .map(|b| (b.name().to_string(), b.snapshot()))
            .collect();
        snapshots.sort_by(|a, b| a.0.cmp(&b.0));
        snapshots
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }
}
