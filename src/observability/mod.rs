//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Probes, breakers, cache, orchestrator produce:
//!     → logging.rs (structured log events, report span with report_id)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stderr (pretty or JSON); stdout carries only report output
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
