//! Probe registry.
//!
//! # Data Flow
//! ```text
//! External wiring:
//!     register(probe) / deregister(name)
//!     → copy-on-write of the current snapshot
//!     → atomic swap (ArcSwap)
//!
//! Orchestrator / readers:
//!     entries() / all_probes() / probes_by_type() / get()
//!     → lock-free load of the current snapshot
//! ```
//!
//! # Design Decisions
//! - Explicitly constructed and passed by `Arc`, never a process-wide static
//! - Writers never block in-flight reads; readers always see a consistent snapshot
//! - Iteration order: priority descending, then first-registration order
//! - Re-registering a name replaces the probe in place and logs a warning

pub mod error;
pub mod store;

pub use error::RegistryError;
pub use store::{ProbeRegistry, RegistryEntry};
