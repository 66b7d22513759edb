// packages/engine/src/observability/mod.rs
//! Tracing and metrics setup
//!
//! - **Tracing**: `tracing-subscriber` with an `EnvFilter`; `RUST_LOG` wins over
//!   the configured level. Human-readable or JSON lines.
//! - **Metrics**: the `metrics` facade backed by the Prometheus exporter. Without
//!   an installed recorder every metric call is a no-op.
//!
//! # Metrics
//!
//! | Name                               | Kind      | Labels  |
//! |------------------------------------|-----------|---------|
//! | `procsim_tasks_processed_total`    | counter   | `actor` |
//! | `procsim_task_duration_ms`         | histogram | `actor` |
//! | `procsim_misrouted_tasks_total`    | counter   |         |
//! | `procsim_round_timeouts_total`     | counter   |         |
//! | `procsim_late_results_total`       | counter   |         |
//! | `procsim_rounds_completed_total`   | counter   |         |
//! | `procsim_results_recorded_total`   | counter   | `ok`    |

use crate::utils::config::ObservabilityConfig;
use crate::utils::errors::{EngineError, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber
pub fn init_tracing(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| EngineError::Observability(format!("Invalid log filter: {}", e)))?;

    let registry = tracing_subscriber::registry().with(filter);

    let initialized = if config.json_logs {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    initialized.map_err(|e| EngineError::Observability(format!("Tracing already set: {}", e)))
}

/// Install the Prometheus recorder and return a handle for rendering
pub fn init_metrics() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| EngineError::Observability(format!("Failed to install metrics recorder: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_rejected() {
        // Only reached when RUST_LOG is unset
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = ObservabilityConfig {
            log_level: "procsim=verbose".to_string(),
            json_logs: false,
            metrics_enabled: false,
        };
        assert!(matches!(
            init_tracing(&config),
            Err(EngineError::Observability(_))
        ));
    }
}
