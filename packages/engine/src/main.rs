// packages/engine/src/main.rs
//! Procsim Simulation Engine
//!
//! Reads a simulation request (JSON) from the configured file or stdin, runs
//! it and prints the response JSON to stdout.

use anyhow::{Context, Result};
use procsim_engine::observability::{init_metrics, init_tracing};
use procsim_engine::utils::config::EngineConfig;
use procsim_engine::{BuildInfo, Simulation, SimulationRequest, SimulationResponse};
use std::io::Read;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = EngineConfig::load().context("Failed to load configuration")?;

    // Initialize observability (tracing, metrics)
    init_tracing(&config.observability)?;
    let metrics = if config.observability.metrics_enabled {
        Some(init_metrics()?)
    } else {
        None
    };

    let build = BuildInfo::current();
    info!(
        "Starting Procsim Simulation Engine v{} ({})",
        build.version, build.git_hash
    );
    debug!("Configuration loaded: {:?}", config);

    let raw = match &config.simulation.request_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };

    let plan = SimulationRequest::from_json(&raw)?.into_plan()?;
    let simulation = Simulation::new(config.runtime.settings());

    // Graceful shutdown handler
    let cancel = simulation.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, cancelling simulation...");
            cancel.cancel();
        }
    });

    let report = match simulation.run(plan).await {
        Ok(report) => report,
        Err(e) => {
            error!("Simulation failed: {}", e);
            return Err(e.into());
        }
    };

    let response = SimulationResponse::from(&report);
    println!("{}", response.to_json_pretty()?);

    if let Some(handle) = metrics {
        debug!("Metrics:\n{}", handle.render());
    }

    info!(run_id = %report.run_id, "Simulation complete");
    Ok(())
}
