//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Probe call for one component:
//!     → manager.rs (breaker for this component name)
//!     → circuit_breaker.rs (permit or rejection)
//!     → timeouts.rs (per-call deadline, panic guard)
//!     → fault.rs (typed fault → synthetic ProbeResult)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every probe call has a deadline
//! - Breaker state is per component; no lock spans components
//! - Faults never escape as errors to report callers

pub mod circuit_breaker;
pub mod fault;
pub mod manager;
pub mod timeouts;

pub use circuit_breaker::{BreakerSnapshot, CallPermit, CircuitBreaker, CircuitState};
pub use fault::{FaultKind, ProbeFault};
pub use manager::CircuitBreakerRegistry;
