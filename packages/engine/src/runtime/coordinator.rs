// packages/engine/src/runtime/coordinator.rs
//! Round coordinator
//!
//! Drives the rounds of a run:
//!
//! ```text
//! for round in 1..=R
//!   open RoundScope (deadline or none)
//!   dispatch one Task per actor          ◄── keeps draining the inbox
//!   wait for R results | deadline | cancel
//!   on deadline: emit timeout results, move on
//!   close RoundScope
//! stop every actor, then close every mailbox
//! ```
//!
//! Every result the coordinator observes is forwarded to the aggregator. A
//! result for an earlier round is late: it is forwarded but never counts
//! toward the round being awaited.

use crate::runtime::deadline::{DeadlinePolicy, RoundScope};
use crate::runtime::messages::{Confirmation, Task, TaskResult};
use crate::runtime::registry::ActorRegistry;
use crate::runtime::settings::RuntimeSettings;
use crate::utils::errors::{EngineError, Result};
use metrics::counter;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Rounds to run and their deadlines
#[derive(Debug, Clone)]
pub struct RoundPlan {
    pub rounds: u32,
    pub deadlines: DeadlinePolicy,
}

/// Receiving side of the channels actors report on
pub struct Inbox {
    pub results: mpsc::Receiver<TaskResult>,
    pub confirmations: mpsc::Receiver<Confirmation>,
}

/// What happened in one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundOutcome {
    pub round: u32,
    pub deadline: Option<Duration>,

    /// Actors whose result for this round arrived in time
    pub reported: Vec<u32>,

    /// Actors still pending when the deadline expired
    pub timed_out: Vec<u32>,

    /// Actors whose mailbox was gone
    pub unreachable: Vec<u32>,

    /// Results from earlier rounds observed during this round
    pub late_results: usize,

    pub confirmations: usize,
    pub elapsed: Duration,
}

impl RoundOutcome {
    /// Every actor reported within the deadline
    pub fn is_complete(&self) -> bool {
        self.timed_out.is_empty() && self.unreachable.is_empty()
    }
}

/// Bookkeeping for the round being awaited
struct RoundTracker {
    round: u32,
    pending: BTreeSet<u32>,
    reported: Vec<u32>,
    timed_out: Vec<u32>,
    unreachable: Vec<u32>,
    late_results: usize,
    confirmations: usize,
}

impl RoundTracker {
    fn new(round: u32, actors: impl IntoIterator<Item = u32>) -> Self {
        Self {
            round,
            pending: actors.into_iter().collect(),
            reported: Vec::new(),
            timed_out: Vec::new(),
            unreachable: Vec::new(),
            late_results: 0,
            confirmations: 0,
        }
    }

    fn is_satisfied(&self) -> bool {
        self.pending.is_empty()
    }

    /// Classify `result` and forward it to the aggregator
    async fn observe(&mut self, result: TaskResult, sink: &mpsc::Sender<TaskResult>) -> Result<()> {
        if result.round == self.round && self.pending.remove(&result.actor_id) {
            trace!(actor_id = result.actor_id, round = self.round, "Result arrived in time");
            self.reported.push(result.actor_id);
        } else {
            debug!(
                actor_id = result.actor_id,
                result_round = result.round,
                round = self.round,
                "Late result"
            );
            self.late_results += 1;
            counter!("procsim_late_results_total").increment(1);
        }

        forward(sink, result).await
    }

    fn confirm(&mut self, confirmation: Confirmation) {
        trace!(
            actor_id = confirmation.actor_id,
            round = confirmation.round,
            action = confirmation.action,
            "Confirmation"
        );
        self.confirmations += 1;
    }

    fn mark_unreachable(&mut self, actor_id: u32) {
        if self.pending.remove(&actor_id) {
            self.unreachable.push(actor_id);
        }
    }

    fn into_outcome(self, deadline: Option<Duration>, elapsed: Duration) -> RoundOutcome {
        RoundOutcome {
            round: self.round,
            deadline,
            reported: self.reported,
            timed_out: self.timed_out,
            unreachable: self.unreachable,
            late_results: self.late_results,
            confirmations: self.confirmations,
            elapsed,
        }
    }
}

async fn forward(sink: &mpsc::Sender<TaskResult>, result: TaskResult) -> Result<()> {
    sink.send(result)
        .await
        .map_err(|_| EngineError::ChannelClosed("aggregator result stream".into()))
}

pub struct Coordinator {
    registry: ActorRegistry,
    inbox: Inbox,
    sink: mpsc::Sender<TaskResult>,
    plan: RoundPlan,
    task_load_min: u32,
    task_load_max: u32,
    rng: StdRng,
    cancel: CancellationToken,
}

impl Coordinator {
    pub fn new(
        registry: ActorRegistry,
        inbox: Inbox,
        sink: mpsc::Sender<TaskResult>,
        plan: RoundPlan,
        settings: &RuntimeSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            inbox,
            sink,
            plan,
            task_load_min: settings.task_load_min,
            task_load_max: settings.task_load_max,
            rng: settings.rng(0),
            cancel,
        }
    }

    /// Run every round, then shut the actors down
    ///
    /// Dropping the coordinator closes the aggregator's stream.
    pub async fn run(mut self) -> Result<Vec<RoundOutcome>> {
        info!(
            rounds = self.plan.rounds,
            actors = self.registry.len(),
            "Starting rounds"
        );

        let mut outcomes = Vec::with_capacity(self.plan.rounds as usize);
        for round in 1..=self.plan.rounds {
            let outcome = self.run_round(round).await?;
            counter!("procsim_rounds_completed_total").increment(1);
            outcomes.push(outcome);
        }

        self.shutdown().await?;
        Ok(outcomes)
    }

    async fn run_round(&mut self, round: u32) -> Result<RoundOutcome> {
        let scope = RoundScope::open(round, self.plan.deadlines.deadline_for(round));
        let mut tracker = RoundTracker::new(round, self.registry.ids());
        debug!(round, deadline = ?scope.deadline(), "Round opened");

        self.dispatch(&mut tracker).await?;

        let expired = if tracker.is_satisfied() {
            false
        } else {
            self.await_round(&scope, &mut tracker).await?
        };

        if expired {
            self.record_timeouts(&mut tracker).await?;
        }

        let deadline = scope.deadline();
        let elapsed = scope.close();
        let outcome = tracker.into_outcome(deadline, elapsed);

        debug!(
            round,
            reported = outcome.reported.len(),
            timed_out = outcome.timed_out.len(),
            late = outcome.late_results,
            ?elapsed,
            "Round closed"
        );
        Ok(outcome)
    }

    /// Send one task to every actor, draining the inbox while mailboxes are full
    async fn dispatch(&mut self, tracker: &mut RoundTracker) -> Result<()> {
        let Self {
            registry,
            inbox,
            sink,
            rng,
            cancel,
            task_load_min,
            task_load_max,
            ..
        } = self;

        for handle in registry.iter() {
            let actor_id = handle.config.id;
            let task = Task {
                actor_id,
                round: tracker.round,
                load: rng.gen_range(*task_load_min..=*task_load_max),
            };

            loop {
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => return Err(EngineError::Cancelled),

                    permit = handle.tasks.reserve() => {
                        match permit {
                            Ok(permit) => {
                                trace!(actor_id, round = task.round, load = task.load, "Task dispatched");
                                permit.send(task);
                            }
                            Err(_) => {
                                warn!(actor_id, round = task.round, "Actor mailbox closed, skipping");
                                tracker.mark_unreachable(actor_id);
                            }
                        }
                        break;
                    }

                    Some(result) = inbox.results.recv() => tracker.observe(result, sink).await?,

                    Some(confirmation) = inbox.confirmations.recv() => tracker.confirm(confirmation),
                }
            }
        }

        Ok(())
    }

    /// Wait until every actor reported or the scope expired; returns whether it expired
    async fn await_round(&mut self, scope: &RoundScope, tracker: &mut RoundTracker) -> Result<bool> {
        let Self {
            inbox,
            sink,
            cancel,
            ..
        } = self;

        while !tracker.is_satisfied() {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => return Err(EngineError::Cancelled),

                result = inbox.results.recv() => match result {
                    Some(result) => tracker.observe(result, sink).await?,
                    None => {
                        warn!(round = tracker.round, "Every actor has disconnected");
                        let pending: Vec<u32> = tracker.pending.iter().copied().collect();
                        for actor_id in pending {
                            tracker.mark_unreachable(actor_id);
                        }
                    }
                },

                Some(confirmation) = inbox.confirmations.recv() => tracker.confirm(confirmation),

                _ = scope.expired() => return Ok(true),
            }
        }

        Ok(false)
    }

    /// Emit a failed result for every actor that missed the deadline
    async fn record_timeouts(&mut self, tracker: &mut RoundTracker) -> Result<()> {
        let pending = std::mem::take(&mut tracker.pending);

        warn!(
            round = tracker.round,
            missing = pending.len(),
            "Round deadline expired, moving on"
        );
        counter!("procsim_round_timeouts_total").increment(1);

        for actor_id in pending {
            if let Some(handle) = self.registry.get(actor_id) {
                forward(&self.sink, TaskResult::timed_out(&handle.config, tracker.round)).await?;
            }
            tracker.timed_out.push(actor_id);
        }

        Ok(())
    }

    /// Stop every actor, then close every mailbox
    async fn shutdown(self) -> Result<()> {
        let Self {
            registry,
            mut inbox,
            sink,
            ..
        } = self;

        let gone = registry.stop_all().await;
        if !gone.is_empty() {
            debug!(?gone, "Some actors had already exited");
        }
        registry.close_all();

        // Late results already delivered are still recorded; work still in flight is abandoned
        let mut trailing = 0usize;
        while let Ok(result) = inbox.results.try_recv() {
            trailing += 1;
            counter!("procsim_late_results_total").increment(1);
            forward(&sink, result).await?;
        }

        info!(trailing_results = trailing, "Coordinator finished");
        Ok(())
    }
}
