//! TCP connect probe.
//!
//! # Responsibilities
//! - Open a TCP connection to a dependency's address
//! - Report DEGRADED when the handshake is slower than a threshold
//!
//! # Design Decisions
//! - Connection errors are DOWN results, never panics
//! - Connect timeout is owned by the probe; the orchestrator's per-call
//!   timeout still applies on top of it

use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time;

use crate::model::{HealthStatus, ProbeResult};
use crate::probe::Probe;

/// Checks that a TCP endpoint accepts connections.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    name: String,
    component_type: String,
    addr: SocketAddr,
    enabled: bool,
    connect_timeout: Duration,
    degraded_threshold: Duration,
}

impl TcpProbe {
    pub fn new(name: impl Into<String>, component_type: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            name: name.into(),
            component_type: component_type.into(),
            addr,
            enabled: true,
            connect_timeout: Duration::from_secs(3),
            degraded_threshold: Duration::from_millis(500),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_degraded_threshold(mut self, threshold: Duration) -> Self {
        self.degraded_threshold = threshold;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

#[async_trait]
impl Probe for TcpProbe {
    fn component_name(&self) -> &str {
        &self.name
    }

    fn component_type(&self) -> &str {
        &self.component_type
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn execute(&self) -> ProbeResult {
        let start = Instant::now();
        let builder = ProbeResult::builder(&self.name, &self.component_type)
            .metadata("address", self.addr.to_string());

        match time::timeout(self.connect_timeout, TcpStream::connect(self.addr)).await {
            Ok(Ok(_stream)) => {
                let latency = start.elapsed();
                let status = if latency > self.degraded_threshold {
                    tracing::warn!(
                        component = %self.name,
                        latency_ms = latency.as_millis() as u64,
                        "TCP probe connected slowly"
                    );
                    HealthStatus::Degraded
                } else {
                    HealthStatus::Up
                };
                builder.status(status).latency(latency).build()
            }
            Ok(Err(e)) => {
                tracing::warn!(component = %self.name, addr = %self.addr, error = %e, "TCP probe failed: connection error");
                builder
                    .status(HealthStatus::Down)
                    .latency(start.elapsed())
                    .error(e.to_string())
                    .build()
            }
            Err(_) => {
                tracing::warn!(component = %self.name, addr = %self.addr, "TCP probe failed: timeout");
                builder
                    .status(HealthStatus::Down)
                    .latency(start.elapsed())
                    .error(format!("connect timed out after {}ms", self.connect_timeout.as_millis()))
                    .build()
            }
        }
    }
}
