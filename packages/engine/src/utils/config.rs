// packages/engine/src/utils/config.rs
//! Engine configuration
//!
//! Layered with the `config` crate:
//!
//! 1. Built-in defaults
//! 2. Optional config file (`procsim.toml`/`.yaml`/`.json`, or the path in `PROCSIM_CONFIG`)
//! 3. Environment overrides (`PROCSIM__RUNTIME__BASE_UNIT_MS=50`)

use crate::runtime::settings::RuntimeSettings;
use crate::utils::errors::{EngineError, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "PROCSIM_CONFIG";

/// Top-level engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub runtime: RuntimeConfig,
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Knobs for the actor runtime and coordinator
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Duration of one unit of synthetic work, in milliseconds
    pub base_unit_ms: u64,

    /// Lower bound of the per-task load multiplier (inclusive)
    pub task_load_min: u32,

    /// Upper bound of the per-task load multiplier (inclusive)
    pub task_load_max: u32,

    /// Capacity of every mailbox
    pub channel_capacity: usize,

    /// Seed for reproducible load multipliers and jitter
    #[serde(default)]
    pub seed: Option<u64>,

    /// How long to wait for actor tasks to exit after the last round
    pub shutdown_grace_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,

    /// Emit logs as JSON lines
    pub json_logs: bool,

    /// Install the Prometheus recorder
    pub metrics_enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulationConfig {
    /// Request file to run; stdin when absent
    #[serde(default)]
    pub request_path: Option<PathBuf>,
}

impl EngineConfig {
    /// Load configuration from defaults, the optional config file and the environment
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load_from(explicit.as_deref())
    }

    /// Load configuration, reading `path` instead of the default file name when given
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("procsim").required(false),
        };

        let config = Self::defaults()?
            .add_source(file)
            .add_source(
                Environment::with_prefix("PROCSIM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: EngineConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(Config::builder()
            .set_default("runtime.base_unit_ms", 100_i64)?
            .set_default("runtime.task_load_min", 1_i64)?
            .set_default("runtime.task_load_max", 5_i64)?
            .set_default("runtime.channel_capacity", 32_i64)?
            .set_default("runtime.shutdown_grace_ms", 1000_i64)?
            .set_default("observability.log_level", "info")?
            .set_default("observability.json_logs", false)?
            .set_default("observability.metrics_enabled", true)?)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let rt = &self.runtime;

        if rt.base_unit_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "runtime.base_unit_ms must be positive".into(),
            ));
        }
        if rt.channel_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "runtime.channel_capacity must be positive".into(),
            ));
        }
        if rt.task_load_min == 0 || rt.task_load_min > rt.task_load_max {
            return Err(EngineError::InvalidConfig(format!(
                "runtime task load range {}..={} is invalid",
                rt.task_load_min, rt.task_load_max
            )));
        }

        Ok(())
    }
}

impl RuntimeConfig {
    /// Runtime settings handed to the simulation
    pub fn settings(&self) -> RuntimeSettings {
        RuntimeSettings {
            base_unit: Duration::from_millis(self.base_unit_ms),
            task_load_min: self.task_load_min,
            task_load_max: self.task_load_max,
            channel_capacity: self.channel_capacity,
            seed: self.seed,
            shutdown_grace: Duration::from_millis(self.shutdown_grace_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        std::fs::write(&path, "").unwrap();

        let config = EngineConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.runtime.base_unit_ms, 100);
        assert_eq!(config.runtime.task_load_min, 1);
        assert_eq!(config.runtime.task_load_max, 5);
        assert_eq!(config.runtime.channel_capacity, 32);
        assert!(config.runtime.seed.is_none());
        assert_eq!(config.observability.log_level, "info");
        assert!(config.simulation.request_path.is_none());
    }

    #[test]
    fn test_file_without_simulation_section() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[runtime]\nbase_unit_ms = 20").unwrap();

        let config = EngineConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config.runtime.base_unit_ms, 20);
        assert!(config.simulation.request_path.is_none());
    }

    #[test]
    fn test_file_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[runtime]\nbase_unit_ms = 10\nseed = 1234\n\n[simulation]\nrequest_path = \"run.json\""
        )
        .unwrap();

        let config = EngineConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config.runtime.base_unit_ms, 10);
        assert_eq!(config.runtime.seed, Some(1234));
        assert_eq!(
            config.simulation.request_path.as_deref(),
            Some(Path::new("run.json"))
        );

        let settings = config.runtime.settings();
        assert_eq!(settings.base_unit, Duration::from_millis(10));
        assert_eq!(settings.seed, Some(1234));
    }

    #[test]
    fn test_invalid_load_range() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[runtime]\ntask_load_min = 6\ntask_load_max = 2").unwrap();

        let err = EngineConfig::load_from(Some(file.path())).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = EngineConfig::load_from(Some(Path::new("/nonexistent/procsim.toml")));
        assert!(err.is_err());
    }
}
