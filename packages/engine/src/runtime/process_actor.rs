// packages/engine/src/runtime/process_actor.rs
//! Simulated process actor
//!
//! Each actor runs on its own tokio task and waits on three event sources at once:
//!
//! ```text
//!            ┌──────────────────────────┐
//! cancel ───►│                          │
//! stop   ───►│  ProcessActor (select!)  │──► TaskResult
//! task   ───►│                          │──► Confirmation
//!            └──────────────────────────┘
//! ```
//!
//! Work is synthetic: the actor holds for
//! `load_factor * task.load * base_unit + uniform(0..=max_jitter)` and then reports
//! success. Stop instructions are only seen between tasks; global cancellation
//! interrupts the hold as well.

use crate::runtime::messages::{ActorConfig, Action, Confirmation, Instruction, Task, TaskResult};
use metrics::{counter, histogram};
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, trace, warn, Instrument};

/// Lifecycle of an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    Idle,
    Executing,
    Stopped,
}

/// Why an actor left its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorExit {
    /// Received a stop instruction
    Stopped,

    /// The global cancellation token fired
    Cancelled,

    /// One of its channels was closed
    Disconnected,
}

/// Receiving side of an actor's mailboxes
pub struct ActorMailbox {
    pub instructions: mpsc::Receiver<Instruction>,
    pub tasks: mpsc::Receiver<Task>,
}

/// Sending side shared by all actors
#[derive(Clone)]
pub struct ActorOutbox {
    pub results: mpsc::Sender<TaskResult>,
    pub confirmations: mpsc::Sender<Confirmation>,
}

/// What an actor did before exiting
#[derive(Debug, Clone)]
pub struct ActorSummary {
    pub actor_id: u32,
    pub state: ActorState,
    pub exit: ActorExit,
    pub tasks_processed: u64,
    pub misrouted_tasks: u64,
}

pub struct ProcessActor {
    config: ActorConfig,
    base_unit: Duration,
    rng: StdRng,
    mailbox: ActorMailbox,
    outbox: ActorOutbox,
    cancel: CancellationToken,
    state: ActorState,
    tasks_processed: u64,
    misrouted_tasks: u64,
}

impl ProcessActor {
    pub fn new(
        config: ActorConfig,
        base_unit: Duration,
        rng: StdRng,
        mailbox: ActorMailbox,
        outbox: ActorOutbox,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            base_unit,
            rng,
            mailbox,
            outbox,
            cancel,
            state: ActorState::Idle,
            tasks_processed: 0,
            misrouted_tasks: 0,
        }
    }

    pub fn id(&self) -> u32 {
        self.config.id
    }

    pub fn state(&self) -> ActorState {
        self.state
    }

    /// Run the actor on its own tokio task
    pub fn spawn(self) -> JoinHandle<ActorSummary> {
        let span = info_span!("actor", id = self.config.id, name = %self.config.name);
        tokio::spawn(self.run().instrument(span))
    }

    /// Actor loop; returns once stopped, cancelled or disconnected
    pub async fn run(mut self) -> ActorSummary {
        debug!("Actor started");

        let exit = loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break ActorExit::Cancelled,

                instruction = self.mailbox.instructions.recv() => match instruction {
                    Some(instruction) => {
                        if let Some(exit) = self.handle_instruction(instruction) {
                            break exit;
                        }
                    }
                    None => break ActorExit::Disconnected,
                },

                task = self.mailbox.tasks.recv() => match task {
                    Some(task) => {
                        if let Err(exit) = self.handle_task(task).await {
                            break exit;
                        }
                    }
                    None => break ActorExit::Disconnected,
                },
            }
        };

        self.state = ActorState::Stopped;
        debug!(?exit, tasks = self.tasks_processed, "Actor stopped");

        ActorSummary {
            actor_id: self.config.id,
            state: self.state,
            exit,
            tasks_processed: self.tasks_processed,
            misrouted_tasks: self.misrouted_tasks,
        }
    }

    fn handle_instruction(&mut self, instruction: Instruction) -> Option<ActorExit> {
        if instruction.actor_id != self.config.id {
            warn!(target_id = instruction.actor_id, "Ignoring instruction for another actor");
            return None;
        }

        // Acknowledgements for control messages are best-effort
        let _ = self
            .outbox
            .confirmations
            .try_send(Confirmation::instruction(self.config.id, instruction.action));

        match instruction.action {
            Action::Stop => Some(ActorExit::Stopped),
            Action::Start => {
                trace!("Start instruction ignored, actor already running");
                None
            }
        }
    }

    async fn handle_task(&mut self, task: Task) -> std::result::Result<(), ActorExit> {
        if task.actor_id != self.config.id {
            warn!(target_id = task.actor_id, round = task.round, "Dropping misrouted task");
            self.misrouted_tasks += 1;
            counter!("procsim_misrouted_tasks_total").increment(1);
            return Ok(());
        }

        let duration = self.work_duration(task.load);
        trace!(round = task.round, ?duration, "Executing task");

        self.state = ActorState::Executing;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ActorExit::Cancelled),
            _ = tokio::time::sleep(duration) => {}
        }
        self.state = ActorState::Idle;
        self.tasks_processed += 1;

        let actor = self.config.id.to_string();
        counter!("procsim_tasks_processed_total", "actor" => actor.clone()).increment(1);
        histogram!("procsim_task_duration_ms", "actor" => actor)
            .record(duration.as_secs_f64() * 1000.0);

        let result = TaskResult::completed(&self.config, task.round, duration);
        if self.outbox.results.send(result).await.is_err() {
            debug!(round = task.round, "Result stream closed, dropping result");
            return Err(ActorExit::Disconnected);
        }

        let confirmation = Confirmation::task(self.config.id, task.round);
        if self.outbox.confirmations.send(confirmation).await.is_err() {
            return Err(ActorExit::Disconnected);
        }

        Ok(())
    }

    /// `load_factor * task_load * base_unit + uniform(0..=max_jitter)`, jitter in whole ms
    fn work_duration(&mut self, task_load: u32) -> Duration {
        let units = self.config.load_factor.saturating_mul(task_load);
        let base = self.base_unit.saturating_mul(units);

        let max_jitter_ms = u64::try_from(self.config.max_jitter.as_millis()).unwrap_or(u64::MAX);
        let jitter_ms = if max_jitter_ms == 0 {
            0
        } else {
            self.rng.gen_range(0..=max_jitter_ms)
        };

        base.saturating_add(Duration::from_millis(jitter_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    struct Harness {
        instructions: mpsc::Sender<Instruction>,
        tasks: mpsc::Sender<Task>,
        results: mpsc::Receiver<TaskResult>,
        confirmations: mpsc::Receiver<Confirmation>,
        cancel: CancellationToken,
    }

    fn actor(config: ActorConfig) -> (ProcessActor, Harness) {
        let (instructions_tx, instructions_rx) = mpsc::channel(4);
        let (tasks_tx, tasks_rx) = mpsc::channel(4);
        let (results_tx, results_rx) = mpsc::channel(4);
        let (confirmations_tx, confirmations_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();

        let actor = ProcessActor::new(
            config,
            Duration::from_millis(100),
            StdRng::seed_from_u64(1),
            ActorMailbox {
                instructions: instructions_rx,
                tasks: tasks_rx,
            },
            ActorOutbox {
                results: results_tx,
                confirmations: confirmations_tx,
            },
            cancel.clone(),
        );

        let harness = Harness {
            instructions: instructions_tx,
            tasks: tasks_tx,
            results: results_rx,
            confirmations: confirmations_rx,
            cancel,
        };

        (actor, harness)
    }

    #[test]
    fn test_work_duration_without_jitter() {
        let (mut actor, _harness) = actor(ActorConfig::new(1, "p1", 2));
        assert_eq!(actor.work_duration(3), Duration::from_millis(600));
        assert_eq!(actor.state(), ActorState::Idle);
    }

    #[test]
    fn test_work_duration_jitter_bounds() {
        let config = ActorConfig::new(1, "p1", 1).with_max_jitter(Duration::from_millis(50));
        let (mut actor, _harness) = actor(config);

        for _ in 0..200 {
            let d = actor.work_duration(1);
            assert!(d >= Duration::from_millis(100));
            assert!(d <= Duration::from_millis(150));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_processes_task_and_confirms() {
        let (actor, mut h) = actor(ActorConfig::new(1, "p1", 2).with_memory_mb(128));
        let handle = actor.spawn();

        h.tasks.send(Task { actor_id: 1, round: 1, load: 1 }).await.unwrap();

        let result = h.results.recv().await.unwrap();
        assert_eq!(result.round, 1);
        assert_eq!(result.elapsed, Duration::from_millis(200));
        assert_eq!(result.memory_mb, 128);
        assert!(result.ok);

        let confirmation = h.confirmations.recv().await.unwrap();
        assert_eq!(confirmation, Confirmation::task(1, 1));

        h.instructions.send(Instruction::stop(1)).await.unwrap();
        let summary = handle.await.unwrap();
        assert_eq!(summary.exit, ActorExit::Stopped);
        assert_eq!(summary.state, ActorState::Stopped);
        assert_eq!(summary.tasks_processed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_misrouted_task_is_dropped() {
        let (actor, mut h) = actor(ActorConfig::new(1, "p1", 1));
        let handle = actor.spawn();

        h.tasks.send(Task { actor_id: 2, round: 1, load: 1 }).await.unwrap();
        h.tasks.send(Task { actor_id: 1, round: 2, load: 1 }).await.unwrap();

        // Only the correctly routed task produces a result
        let result = h.results.recv().await.unwrap();
        assert_eq!(result.round, 2);

        drop(h.tasks);
        drop(h.instructions);
        let summary = handle.await.unwrap();
        assert_eq!(summary.misrouted_tasks, 1);
        assert_eq!(summary.tasks_processed, 1);
        assert!(h.results.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_follow_task_order() {
        let config = ActorConfig::new(1, "p1", 1).with_max_jitter(Duration::from_millis(30));
        let (actor, mut h) = actor(config);
        let handle = actor.spawn();

        for round in 1..=3 {
            h.tasks.send(Task { actor_id: 1, round, load: 1 }).await.unwrap();
        }

        for round in 1..=3 {
            assert_eq!(h.results.recv().await.unwrap().round, round);
            assert_eq!(h.confirmations.recv().await.unwrap().round, round);
        }

        h.instructions.send(Instruction::stop(1)).await.unwrap();
        assert_eq!(handle.await.unwrap().exit, ActorExit::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_work() {
        let (actor, mut h) = actor(ActorConfig::new(1, "p1", 5));
        let handle = actor.spawn();

        h.tasks.send(Task { actor_id: 1, round: 1, load: 1 }).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.cancel.cancel();

        let summary = handle.await.unwrap();
        assert_eq!(summary.exit, ActorExit::Cancelled);
        assert_eq!(summary.state, ActorState::Stopped);
        assert_eq!(summary.tasks_processed, 0);
        assert!(h.results.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_for_other_actor_is_ignored() {
        let (actor, mut h) = actor(ActorConfig::new(1, "p1", 1));
        let handle = actor.spawn();

        h.instructions.send(Instruction::stop(9)).await.unwrap();
        h.tasks.send(Task { actor_id: 1, round: 1, load: 1 }).await.unwrap();
        assert!(h.results.recv().await.is_some());

        h.instructions.send(Instruction::stop(1)).await.unwrap();
        assert_eq!(handle.await.unwrap().exit, ActorExit::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_result_stream_disconnects() {
        let (actor, h) = actor(ActorConfig::new(1, "p1", 1));
        let Harness { tasks, results, instructions, .. } = h;
        let handle = actor.spawn();

        drop(results);
        tasks.send(Task { actor_id: 1, round: 1, load: 1 }).await.unwrap();

        let summary = handle.await.unwrap();
        assert_eq!(summary.exit, ActorExit::Disconnected);
        drop(instructions);
    }
}
