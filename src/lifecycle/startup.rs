//! Startup wiring from configuration.
//!
//! # Responsibilities
//! - Turn `[[probes]]` definitions into registered TCP probes
//! - Validate the registry before any report runs
//! - Construct the orchestrator from the same config
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Config is assumed validated; address errors are still reported, not unwrapped

use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{HealthConfig, ProbeConfig};
use crate::orchestrator::Orchestrator;
use crate::probe::TcpProbe;
use crate::registry::{ProbeRegistry, RegistryError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("probe {name}: invalid address: {source}")]
    InvalidAddress {
        name: String,
        #[source]
        source: AddrParseError,
    },

    #[error("registration failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("registry failed validation: {0:?}")]
    Inconsistent(Vec<RegistryError>),
}

fn tcp_probe(def: &ProbeConfig, connect_timeout: Duration) -> Result<TcpProbe, StartupError> {
    let addr: SocketAddr = def.address.parse().map_err(|source| StartupError::InvalidAddress {
        name: def.name.clone(),
        source,
    })?;

    Ok(TcpProbe::new(&def.name, &def.component_type, addr)
        .with_enabled(def.enabled)
        .with_connect_timeout(connect_timeout)
        .with_degraded_threshold(Duration::from_millis(def.degraded_threshold_ms)))
}

/// Register one TCP probe per `[[probes]]` entry.
pub fn build_registry(config: &HealthConfig) -> Result<ProbeRegistry, StartupError> {
    let registry = ProbeRegistry::new();
    let connect_timeout = config.orchestrator.per_call_timeout();

    for def in &config.probes {
        let probe = tcp_probe(def, connect_timeout)?;
        registry.register_with_priority(Arc::new(probe), def.priority)?;
    }

    registry.validate().map_err(StartupError::Inconsistent)?;
    tracing::info!(probes = registry.len(), types = ?registry.types(), "Probe registry ready");
    Ok(registry)
}

/// Registry plus orchestrator, ready to run reports.
pub fn build_orchestrator(config: &HealthConfig) -> Result<Orchestrator, StartupError> {
    let registry = Arc::new(build_registry(config)?);
    let orchestrator = Orchestrator::from_config(registry, config);

    tracing::info!(
        workers = orchestrator.worker_pool_size(),
        per_call_timeout_ms = config.orchestrator.per_call_timeout_ms,
        global_timeout_ms = config.orchestrator.global_timeout_ms,
        "Orchestrator ready"
    );
    Ok(orchestrator)
}
