//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HealthConfig (validated, immutable)
//!     → sections handed to Orchestrator::from_config
//! ```
//!
//! # Design Decisions
//! - Loading lives outside the core; the core only consumes the section structs
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::CacheConfig;
pub use schema::CircuitBreakerConfig;
pub use schema::HealthConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::OrchestratorConfig;
pub use schema::ProbeConfig;
pub use validation::{validate_config, ValidationError};
