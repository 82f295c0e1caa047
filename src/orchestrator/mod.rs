//! Report-cycle scheduling.
//!
//! # Data Flow
//! ```text
//! execute_all(bypass_cache):
//!     → registry snapshot, enabled entries only (engine.rs)
//!     → one task per entry (worker.rs):
//!         cache.get_or_compute
//!             → breaker.call
//!                 → worker pool permit → guarded_execute(per-call timeout)
//!     → join in registry order until the global deadline
//!     → Vec<ProbeResult>, one per enabled entry
//! ```
//!
//! # Design Decisions
//! - Every component runs on its own task so a panic or hang stays local
//! - The worker pool is a semaphore; the per-call timer starts once a slot is held
//! - Tasks still pending at the global deadline are aborted and reported as
//!   `OrchestratorTimeout`; their breaker permit records the failure on drop
//! - No aggregate policy: [`HealthSummary`](crate::model::HealthSummary) is a caller-side helper

pub mod engine;
pub mod report;
pub mod worker;

pub use engine::Orchestrator;
pub use report::HealthReport;
