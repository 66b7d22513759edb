// packages/engine/src/executor/simulation.rs
//! One simulation run
//!
//! ```text
//! Simulation::run(plan)
//! ├─ spawn MetricsAggregator            (1 task)
//! ├─ register + spawn ProcessActor × N  (N tasks)
//! ├─ Coordinator::run                   (caller's task)
//! ├─ join actors within the shutdown grace
//! └─ await aggregator → Report
//! ```

use crate::runtime::coordinator::{Coordinator, Inbox, RoundOutcome, RoundPlan};
use crate::runtime::deadline::DeadlinePolicy;
use crate::runtime::messages::{ActorConfig, TaskResult};
use crate::runtime::process_actor::{ActorOutbox, ActorSummary, ProcessActor};
use crate::runtime::registry::ActorRegistry;
use crate::runtime::settings::RuntimeSettings;
use crate::stats::{MetricsAggregator, StatsReport, StatsSnapshot};
use crate::utils::errors::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ulid::Ulid;

/// Validated input of one run
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub rounds: u32,
    pub deadlines: DeadlinePolicy,
    pub actors: Vec<ActorConfig>,
}

impl SimulationPlan {
    pub fn new(rounds: u32, actors: Vec<ActorConfig>) -> Self {
        Self {
            rounds,
            deadlines: DeadlinePolicy::none(),
            actors,
        }
    }

    pub fn with_deadlines(mut self, deadlines: DeadlinePolicy) -> Self {
        self.deadlines = deadlines;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            return Err(EngineError::InvalidRequest(
                "round count must be positive".into(),
            ));
        }
        if self.actors.is_empty() {
            return Err(EngineError::InvalidRequest(
                "at least one process is required".into(),
            ));
        }

        let mut seen = BTreeSet::new();
        for actor in &self.actors {
            if !seen.insert(actor.id) {
                return Err(EngineError::InvalidRequest(format!(
                    "duplicate process id {}",
                    actor.id
                )));
            }
            if actor.load_factor == 0 {
                return Err(EngineError::InvalidRequest(format!(
                    "process {} has a zero load factor",
                    actor.id
                )));
            }
        }

        Ok(())
    }

    pub fn round_plan(&self) -> RoundPlan {
        RoundPlan {
            rounds: self.rounds,
            deadlines: self.deadlines.clone(),
        }
    }
}

/// Final output of a run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Every result in arrival order
    pub results: Vec<TaskResult>,

    /// Per-actor statistics, actors without successful results included
    pub per_actor: BTreeMap<u32, StatsSnapshot>,

    /// Statistics over all successful results
    pub global: StatsSnapshot,

    pub rounds: Vec<RoundOutcome>,
}

impl Report {
    fn new(
        run_id: String,
        started_at: DateTime<Utc>,
        stats: StatsReport,
        rounds: Vec<RoundOutcome>,
    ) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            results: stats.results,
            per_actor: stats.per_actor,
            global: stats.global,
            rounds,
        }
    }

    /// Rounds where some actor missed the deadline or was unreachable
    pub fn incomplete_rounds(&self) -> usize {
        self.rounds.iter().filter(|r| !r.is_complete()).count()
    }
}

/// Runs simulation plans
pub struct Simulation {
    settings: RuntimeSettings,
    cancel: CancellationToken,
}

impl Simulation {
    pub fn new(settings: RuntimeSettings) -> Self {
        Self::with_cancellation(settings, CancellationToken::new())
    }

    /// Use `cancel` as the global cancellation signal
    pub fn with_cancellation(settings: RuntimeSettings, cancel: CancellationToken) -> Self {
        Self { settings, cancel }
    }

    /// Token that aborts every run of this simulation
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// Execute `plan` to completion
    ///
    /// Fails with [`EngineError::Cancelled`] if the cancellation token fires;
    /// no report is produced in that case.
    pub async fn run(&self, plan: SimulationPlan) -> Result<Report> {
        plan.validate()?;

        let run_id = Ulid::new().to_string();
        let started_at = Utc::now();
        info!(
            run_id = %run_id,
            rounds = plan.rounds,
            actors = plan.actors.len(),
            "Starting simulation"
        );

        let capacity = self.settings.channel_capacity;
        let (results_tx, results_rx) = mpsc::channel(capacity);
        let (confirmations_tx, confirmations_rx) = mpsc::channel(capacity);
        let (sink_tx, sink_rx) = mpsc::channel(capacity);

        let aggregator = MetricsAggregator::new(plan.actors.iter().map(|a| a.id)).spawn(sink_rx);

        let outbox = ActorOutbox {
            results: results_tx,
            confirmations: confirmations_tx,
        };
        let mut registry = ActorRegistry::new(capacity);
        let mut actors = Vec::with_capacity(plan.actors.len());

        for config in &plan.actors {
            let mailbox = registry.register(config.clone())?;
            let actor = ProcessActor::new(
                config.clone(),
                self.settings.base_unit,
                self.settings.rng(u64::from(config.id) + 1),
                mailbox,
                outbox.clone(),
                self.cancel.clone(),
            );
            actors.push(actor.spawn());
        }
        // Only actors hold result senders from here on
        drop(outbox);

        let coordinator = Coordinator::new(
            registry,
            Inbox {
                results: results_rx,
                confirmations: confirmations_rx,
            },
            sink_tx,
            plan.round_plan(),
            &self.settings,
            self.cancel.clone(),
        );

        let rounds = match coordinator.run().await {
            Ok(rounds) => rounds,
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Simulation aborted");
                self.join_actors(actors).await;
                aggregator.abort();
                return Err(e);
            }
        };

        self.join_actors(actors).await;

        let stats = aggregator
            .await
            .map_err(|e| EngineError::AggregatorFailed(e.to_string()))?;

        let report = Report::new(run_id, started_at, stats, rounds);
        info!(
            run_id = %report.run_id,
            results = report.results.len(),
            successful = report.global.count,
            incomplete_rounds = report.incomplete_rounds(),
            "Simulation finished"
        );

        Ok(report)
    }

    /// Wait for actor tasks to exit, aborting those still busy after the grace period
    async fn join_actors(&self, actors: Vec<JoinHandle<ActorSummary>>) {
        let aborts: Vec<_> = actors.iter().map(|h| h.abort_handle()).collect();

        match tokio::time::timeout(self.settings.shutdown_grace, futures::future::join_all(actors)).await {
            Ok(joined) => {
                for summary in joined {
                    match summary {
                        Ok(summary) => debug!(
                            actor_id = summary.actor_id,
                            state = ?summary.state,
                            exit = ?summary.exit,
                            tasks = summary.tasks_processed,
                            "Actor joined"
                        ),
                        Err(e) => warn!("Actor task failed: {}", e),
                    }
                }
            }
            Err(_) => {
                warn!(
                    grace = ?self.settings.shutdown_grace,
                    "Actors still busy after shutdown grace, aborting"
                );
                for handle in aborts {
                    handle.abort();
                }
            }
        }
    }
}
