// packages/engine/src/executor/mod.rs
//! Simulation orchestration
//!
//! Wires actors, coordinator and aggregator together for one run and turns
//! their output into a [`Report`].

pub mod simulation;

pub use simulation::{Report, Simulation, SimulationPlan};
