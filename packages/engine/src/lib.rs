// packages/engine/src/lib.rs
//! Procsim Simulation Engine Library
//!
//! Runs a fixed population of simulated processes through rounds of synthetic
//! work and aggregates their timings into latency statistics.
//!
//! # Architecture
//!
//! The engine is structured into several key modules:
//!
//! - **runtime**: Actors, coordinator, deadlines, mailboxes
//! - **stats**: Streaming accumulators and the metrics aggregator
//! - **executor**: Wiring of one simulation run into a report
//! - **wire**: JSON request/response shapes for external front-ends
//! - **observability**: Tracing and metrics setup
//! - **utils**: Configuration and errors
//!
//! # Example
//!
//! ```no_run
//! use procsim_engine::{ActorConfig, RuntimeSettings, Simulation, SimulationPlan};
//!
//! # async fn run() -> procsim_engine::Result<()> {
//! let plan = SimulationPlan::new(3, vec![ActorConfig::new(1, "Proceso_1", 2)]);
//! let report = Simulation::new(RuntimeSettings::default()).run(plan).await?;
//! println!("p95 = {} ms", report.global.p95_ms);
//! # Ok(())
//! # }
//! ```

// Public module exports
pub mod executor;
pub mod observability;
pub mod runtime;
pub mod stats;
pub mod utils;
pub mod wire;

// Re-export commonly used types
pub use executor::{Report, Simulation, SimulationPlan};
pub use runtime::{ActorConfig, DeadlinePolicy, RoundOutcome, RuntimeSettings, TaskResult};
pub use stats::StatsSnapshot;
pub use utils::config::EngineConfig;
pub use utils::errors::{EngineError, Result};
pub use wire::{SimulationRequest, SimulationResponse};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_HASH: &str = env!("GIT_HASH");

/// Engine build information
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub rustc_version: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: VERSION,
            git_hash: GIT_HASH,
            build_timestamp: env!("BUILD_TIMESTAMP"),
            rustc_version: env!("RUSTC_VERSION"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_build_info() {
        let info = BuildInfo::current();
        assert!(!info.version.is_empty());
        assert!(!info.git_hash.is_empty());
    }
}
