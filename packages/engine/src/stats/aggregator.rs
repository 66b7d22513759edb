// packages/engine/src/stats/aggregator.rs
//! Metrics aggregator
//!
//! Single consumer of the result stream. It owns every accumulator, so no
//! locking is needed, and it never times out: it finishes when the producer
//! closes the stream.

use crate::runtime::messages::TaskResult;
use crate::stats::accumulator::{StatsAccumulator, StatsSnapshot};
use metrics::counter;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, Instrument};

/// Finalized statistics for a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsReport {
    /// Every result in arrival order, failed ones included
    pub results: Vec<TaskResult>,

    /// One snapshot per actor, empty ones included
    pub per_actor: BTreeMap<u32, StatsSnapshot>,

    /// All successful results across all actors
    pub global: StatsSnapshot,
}

pub struct MetricsAggregator {
    per_actor: BTreeMap<u32, StatsAccumulator>,
    global: StatsAccumulator,
    results: Vec<TaskResult>,
}

impl MetricsAggregator {
    /// Create an aggregator that reports a snapshot for each of `actor_ids`
    pub fn new(actor_ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            per_actor: actor_ids
                .into_iter()
                .map(|id| (id, StatsAccumulator::new()))
                .collect(),
            global: StatsAccumulator::new(),
            results: Vec::new(),
        }
    }

    /// Route one result; failed results are kept in the log only
    pub fn record(&mut self, result: TaskResult) {
        counter!("procsim_results_recorded_total", "ok" => result.ok.to_string()).increment(1);

        if result.ok {
            let ms = result.elapsed_ms();
            self.per_actor.entry(result.actor_id).or_default().push(ms);
            self.global.push(ms);
        }

        self.results.push(result);
    }

    /// Freeze every accumulator
    pub fn finalize(self) -> StatsReport {
        let per_actor = self
            .per_actor
            .into_iter()
            .map(|(id, acc)| (id, acc.finalize()))
            .collect();

        StatsReport {
            results: self.results,
            per_actor,
            global: self.global.finalize(),
        }
    }

    /// Consume `results` until every sender is dropped, then finalize
    pub async fn run(mut self, mut results: mpsc::Receiver<TaskResult>) -> StatsReport {
        while let Some(result) = results.recv().await {
            debug!(
                actor_id = result.actor_id,
                round = result.round,
                ok = result.ok,
                "Recording result"
            );
            self.record(result);
        }

        let report = self.finalize();
        info!(
            results = report.results.len(),
            successful = report.global.count,
            "Result stream closed, statistics finalized"
        );
        report
    }

    /// Run on its own tokio task
    pub fn spawn(self, results: mpsc::Receiver<TaskResult>) -> JoinHandle<StatsReport> {
        tokio::spawn(self.run(results).instrument(info_span!("aggregator")))
    }
}
