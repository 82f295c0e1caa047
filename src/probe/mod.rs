//! Probe capability.
//!
//! # Responsibilities
//! - Define the single capability every health check implements
//! - Adapt closures (async and blocking) into probes for wiring and tests
//! - Provide a TCP connect probe for the CLI
//!
//! # Design Decisions
//! - `execute()` never fails; every failure is encoded in the returned result
//! - The core never inspects a probe's concrete type
//! - Cancellation is cooperative: dropping the future cancels an async probe,
//!   but blocking probes keep their thread until the closure returns

pub mod adapters;
pub mod tcp;

use async_trait::async_trait;

use crate::model::ProbeResult;

pub use adapters::{BlockingProbe, FnProbe};
pub use tcp::TcpProbe;

/// A unit of work that checks the health of one dependency.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Unique component name, used as the registry key.
    fn component_name(&self) -> &str;

    /// Free-form component category (e.g. "database").
    fn component_type(&self) -> &str;

    /// Disabled probes are skipped by the orchestrator.
    fn enabled(&self) -> bool {
        true
    }

    /// Run the check. Must not panic; the orchestrator still guards against it.
    async fn execute(&self) -> ProbeResult;
}
