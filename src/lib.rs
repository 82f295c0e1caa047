//! Health-check orchestration engine.
//!
//! Runs independently implemented component probes under bounded
//! concurrency, guards each component with a circuit breaker, caches results
//! with status-aware TTLs and assembles an ordered report on demand.

pub mod cache;
pub mod config;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod orchestrator;
pub mod probe;
pub mod registry;
pub mod resilience;

pub use cache::ResultCache;
pub use config::HealthConfig;
pub use lifecycle::Shutdown;
pub use model::{HealthStatus, HealthSummary, ProbeResult};
pub use orchestrator::{HealthReport, Orchestrator};
pub use probe::Probe;
pub use registry::{ProbeRegistry, RegistryError};
pub use resilience::{CircuitBreaker, CircuitBreakerRegistry, CircuitState};
