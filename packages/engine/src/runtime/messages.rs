// packages/engine/src/runtime/messages.rs
//! Messages exchanged between the coordinator, the actors and the aggregator
//!
//! ```text
//! Coordinator ──Task/Instruction──► ProcessActor
//!      ▲                                 │
//!      └──────TaskResult/Confirmation────┘
//!      │
//!      └──TaskResult──► MetricsAggregator
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Static description of one simulated process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorConfig {
    pub id: u32,
    pub name: String,

    /// Multiplier applied to every task this actor runs (>= 1)
    pub load_factor: u32,

    /// Informational footprint, echoed in every result
    pub memory_mb: u32,

    /// Upper bound of the random latency added to each task
    pub max_jitter: Duration,
}

impl ActorConfig {
    pub fn new(id: u32, name: impl Into<String>, load_factor: u32) -> Self {
        Self {
            id,
            name: name.into(),
            load_factor,
            memory_mb: 0,
            max_jitter: Duration::ZERO,
        }
    }

    pub fn with_memory_mb(mut self, memory_mb: u32) -> Self {
        self.memory_mb = memory_mb;
        self
    }

    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }
}

/// Control-plane action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Start,
    Stop,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub actor_id: u32,
    pub action: Action,
}

impl Instruction {
    pub fn stop(actor_id: u32) -> Self {
        Self {
            actor_id,
            action: Action::Stop,
        }
    }
}

/// One unit of work for one actor in one round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    pub actor_id: u32,

    /// 1-based round number
    pub round: u32,

    /// Per-task load multiplier
    pub load: u32,
}

/// Why a result is not successful
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorLabel {
    #[default]
    None,
    Timeout,
}

impl ErrorLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorLabel::None => "",
            ErrorLabel::Timeout => "timeout",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "" => Some(ErrorLabel::None),
            "timeout" => Some(ErrorLabel::Timeout),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub actor_id: u32,
    pub actor_name: String,
    pub round: u32,
    pub memory_mb: u32,
    pub elapsed: Duration,
    pub ok: bool,
    pub error: ErrorLabel,
}

impl TaskResult {
    /// Result for work an actor completed
    pub fn completed(actor: &ActorConfig, round: u32, elapsed: Duration) -> Self {
        Self {
            actor_id: actor.id,
            actor_name: actor.name.clone(),
            round,
            memory_mb: actor.memory_mb,
            elapsed,
            ok: true,
            error: ErrorLabel::None,
        }
    }

    /// Result recorded by the coordinator when a round deadline expires
    pub fn timed_out(actor: &ActorConfig, round: u32) -> Self {
        Self {
            actor_id: actor.id,
            actor_name: actor.name.clone(),
            round,
            memory_mb: actor.memory_mb,
            elapsed: Duration::ZERO,
            ok: false,
            error: ErrorLabel::Timeout,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_nanos() as f64 / 1_000_000.0
    }
}

/// Acknowledgement that an actor finished handling a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub actor_id: u32,

    /// Round of the acknowledged task; 0 for control instructions
    pub round: u32,

    pub action: &'static str,
    pub done: bool,
}

impl Confirmation {
    pub const TASK: &'static str = "task";

    pub fn task(actor_id: u32, round: u32) -> Self {
        Self {
            actor_id,
            round,
            action: Self::TASK,
            done: true,
        }
    }

    pub fn instruction(actor_id: u32, action: Action) -> Self {
        Self {
            actor_id,
            round: 0,
            action: action.as_str(),
            done: true,
        }
    }
}
