// packages/engine/src/stats/mod.rs
//! Latency statistics
//!
//! - **Accumulator**: streaming sample collector, finalized once into a snapshot
//! - **Aggregator**: consumes the result stream and owns every accumulator
//!
//! ```text
//! TaskResult stream ──► MetricsAggregator ──┬─► StatsAccumulator (actor 1)
//!                                           ├─► StatsAccumulator (actor N)
//!                                           └─► StatsAccumulator (global)
//!                              stream closed ──► finalize ──► StatsReport
//! ```

pub mod accumulator;
pub mod aggregator;

pub use accumulator::{percentile, StatsAccumulator, StatsSnapshot};
pub use aggregator::{MetricsAggregator, StatsReport};
