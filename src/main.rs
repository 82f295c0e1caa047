//! Health-check orchestrator CLI.
//!
//! Wires TCP probes from a TOML file into the orchestration engine.
//!
//! ```text
//!   config.toml ──▶ registry ──▶ orchestrator ──▶ JSON report on stdout
//!                                  │
//!                                  ├─ result cache (+ sweeper)
//!                                  ├─ circuit breaker per component
//!                                  └─ bounded worker pool
//! ```

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

use health_orchestrator::config::{load_config, HealthConfig};
use health_orchestrator::lifecycle::{build_orchestrator, shutdown_on_signal, Shutdown};
use health_orchestrator::observability::{init_logging, init_metrics};
use health_orchestrator::{HealthStatus, Orchestrator, Probe};

#[derive(Parser)]
#[command(name = "health-orchestrator")]
#[command(about = "Run component health probes and print an aggregated report", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one report and exit non-zero unless every component is UP
    Check {
        #[arg(long)]
        bypass_cache: bool,
    },
    /// Report repeatedly until interrupted
    Watch {
        #[arg(short, long, default_value_t = 10)]
        interval_secs: u64,
    },
    /// List registered probes
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HealthConfig::default(),
    };
    init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        probes = config.probes.len(),
        "health-orchestrator starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let orchestrator = build_orchestrator(&config)?;

    match cli.command {
        Commands::Check { bypass_cache } => {
            let report = orchestrator.report(bypass_cache).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.summary.overall != HealthStatus::Up {
                std::process::exit(1);
            }
        }
        Commands::Watch { interval_secs } => {
            watch(&orchestrator, Duration::from_secs(interval_secs.max(1))).await?;
        }
        Commands::List => {
            let probes: Vec<_> = orchestrator
                .registry()
                .entries()
                .iter()
                .map(|entry| {
                    json!({
                        "name": entry.name(),
                        "type": entry.component_type(),
                        "priority": entry.priority(),
                        "enabled": entry.probe().enabled(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&probes)?);
        }
    }

    Ok(())
}

async fn watch(orchestrator: &Orchestrator, interval: Duration) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Shutdown::new();
    let mut stop = shutdown.subscribe();
    let sweeper = orchestrator.spawn_cache_sweeper(shutdown.subscribe());
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = orchestrator.report(false).await;
                println!("{}", serde_json::to_string(&report)?);
            }
            _ = stop.recv() => break,
        }
    }

    sweeper.await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
