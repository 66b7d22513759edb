// packages/engine/src/utils/errors.rs
//! Engine error type

use thiserror::Error;

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by the simulation engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Simulation request failed validation
    #[error("Invalid simulation request: {0}")]
    InvalidRequest(String),

    /// The run was aborted by the global cancellation token
    #[error("Simulation cancelled")]
    Cancelled,

    /// A channel the engine depends on was closed unexpectedly
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// The metrics aggregator task panicked or was aborted
    #[error("Metrics aggregator failed: {0}")]
    AggregatorFailed(String),

    /// Tracing or metrics could not be initialized
    #[error("Observability setup failed: {0}")]
    Observability(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether the error comes from an aborted run rather than a fault
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }
}
