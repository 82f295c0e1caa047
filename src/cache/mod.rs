//! Status-aware result cache.
//!
//! # Data Flow
//! ```text
//! get_or_compute(name, probe_fn):
//!     → store.rs: unexpired entry? return it
//!     → per-component fill lock (single flight), re-check
//!     → probe_fn()
//!         Ok(result)  → store with ttl(result.status)
//!         Err(fault)  → stale entry (if enabled) or synthetic result with error TTL
//!
//! sweeper.rs:
//!     Periodic timer → purge_expired()
//! ```
//!
//! # Design Decisions
//! - TTL is a pure function of status: UP long, DEGRADED medium, DOWN/UNKNOWN short
//! - Expiry is checked on every read; the sweep only bounds memory
//! - Expiry uses the monotonic clock from the moment of storage
//! - Stale results are new values tagged `stale = true`, cached ones stay untouched

pub mod store;
pub mod sweeper;

pub use store::{CacheEntry, ResultCache};
pub use sweeper::CacheSweeper;
