// packages/engine/src/runtime/mod.rs
//! Actor execution runtime
//!
//! This module provides the concurrent core of a simulation run:
//!
//! - **Messages**: tasks, instructions, results and confirmations
//! - **Process Actor**: one tokio task per simulated process
//! - **Registry**: actor id → mailbox senders, owned by the coordinator
//! - **Coordinator**: round loop with per-round deadlines and ordered shutdown
//! - **Deadline**: deadline policy and per-round scopes
//! - **Settings**: base unit, load range, mailbox capacity, seed
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Coordinator                        │
//! │   ActorRegistry ── Task / Instruction ──┐                │
//! │        ▲                                ▼                │
//! │        │          ┌──────────┐  ┌──────────┐             │
//! │        │          │ Actor 1  │  │ Actor N  │  ...        │
//! │        │          └──────────┘  └──────────┘             │
//! │        │                 │             │                 │
//! │      Inbox ◄── TaskResult / Confirmation                 │
//! │        │                                                 │
//! │        └── TaskResult ──► MetricsAggregator              │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod coordinator;
pub mod deadline;
pub mod messages;
pub mod process_actor;
pub mod registry;
pub mod settings;

// Re-export commonly used types
pub use coordinator::{Coordinator, Inbox, RoundOutcome, RoundPlan};
pub use deadline::{DeadlinePolicy, RoundScope};
pub use messages::{Action, ActorConfig, Confirmation, ErrorLabel, Instruction, Task, TaskResult};
pub use process_actor::{ActorExit, ActorMailbox, ActorOutbox, ActorState, ActorSummary, ProcessActor};
pub use registry::{ActorHandle, ActorRegistry};
pub use settings::RuntimeSettings;
