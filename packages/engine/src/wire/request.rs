// packages/engine/src/wire/request.rs
//! Simulation request

use crate::executor::SimulationPlan;
use crate::runtime::deadline::DeadlinePolicy;
use crate::runtime::messages::ActorConfig;
use crate::utils::errors::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One process as described by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSpec {
    pub id: u32,
    pub nombre: String,
    pub carga_base: i64,
    pub memoria_estimadamb: i64,
    pub jitter_max_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub rondas: i64,

    /// Default round deadline in seconds; zero or negative disables it
    #[serde(default)]
    pub timeout_ronda_s: i64,

    pub procesos: Vec<ProcessSpec>,

    /// Per-round deadline in minutes; non-positive entries use the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_por_ronda_mins: Option<Vec<i64>>,
}

impl SimulationRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate and convert into an engine plan
    pub fn into_plan(self) -> Result<SimulationPlan> {
        let rounds = u32::try_from(self.rondas)
            .ok()
            .filter(|r| *r > 0)
            .ok_or_else(|| {
                EngineError::InvalidRequest(format!("rondas must be positive, got {}", self.rondas))
            })?;

        let actors = self
            .procesos
            .into_iter()
            .map(ProcessSpec::into_actor)
            .collect::<Result<Vec<_>>>()?;

        let per_round = self
            .timeout_por_ronda_mins
            .unwrap_or_default()
            .into_iter()
            .map(|mins| Duration::from_secs(positive(mins).saturating_mul(60)))
            .collect();

        let deadlines = DeadlinePolicy::uniform(Duration::from_secs(positive(self.timeout_ronda_s)))
            .with_overrides(per_round);

        let plan = SimulationPlan::new(rounds, actors).with_deadlines(deadlines);
        plan.validate()?;
        Ok(plan)
    }
}

impl ProcessSpec {
    fn into_actor(self) -> Result<ActorConfig> {
        let load_factor = u32::try_from(self.carga_base)
            .ok()
            .filter(|l| *l >= 1)
            .ok_or_else(|| {
                EngineError::InvalidRequest(format!(
                    "process {}: cargaBase must be at least 1, got {}",
                    self.id, self.carga_base
                ))
            })?;

        let memory_mb = u32::try_from(self.memoria_estimadamb).map_err(|_| {
            EngineError::InvalidRequest(format!(
                "process {}: memoriaEstimadamb out of range: {}",
                self.id, self.memoria_estimadamb
            ))
        })?;

        let jitter_ms = u64::try_from(self.jitter_max_ms).map_err(|_| {
            EngineError::InvalidRequest(format!(
                "process {}: jitterMaxMs must not be negative, got {}",
                self.id, self.jitter_max_ms
            ))
        })?;

        Ok(ActorConfig::new(self.id, self.nombre, load_factor)
            .with_memory_mb(memory_mb)
            .with_max_jitter(Duration::from_millis(jitter_ms)))
    }
}

fn positive(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
