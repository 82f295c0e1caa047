//! Probe outcome model.
//!
//! # Data Flow
//! ```text
//! Probe::execute()
//!     → ProbeResultBuilder (status, latency, error, metadata)
//!     → ProbeResult (immutable, shared by cache/breaker/orchestrator)
//!     → HealthSummary (caller-side rollup via HealthStatus::worst)
//! ```
//!
//! # Design Decisions
//! - Results are never mutated after `build()`; derived copies go through `to_builder()`
//! - Serialization is a flat record: status code string, latency in ms, metadata map
//! - Metadata keys are unique and ordered by key, not by insertion, so
//!   serialized results are deterministic

pub mod result;
pub mod status;
pub mod summary;
pub mod time;

pub use result::{ProbeResult, ProbeResultBuilder};
pub use status::HealthStatus;
pub use summary::HealthSummary;
