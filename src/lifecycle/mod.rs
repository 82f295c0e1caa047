//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → probes from [[probes]] → registry → orchestrator
//!
//! Shutdown (shutdown.rs):
//!     trigger() → cache sweeper and watch loop exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then probes, then background tasks
//! - Background tasks hold a broadcast receiver, never a global flag

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_on_signal;
pub use startup::{build_orchestrator, build_registry};
