// packages/engine/src/wire/response.rs
//! Simulation response

use crate::executor::Report;
use crate::runtime::messages::{ErrorLabel, TaskResult};
use crate::stats::StatsSnapshot;
use crate::utils::errors::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// One row of `resultados`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(rename = "procesoId")]
    pub proceso_id: u32,
    pub nombre: String,
    pub ronda: u32,
    #[serde(rename = "memoriaMB")]
    pub memoria_mb: u32,
    #[serde(rename = "tiempoMs")]
    pub tiempo_ms: f64,
    pub ok: bool,
    pub err: String,
}

/// Statistics block of `porProceso` and `global`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    pub count: u64,
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResponse {
    pub resultados: Vec<ResultRecord>,
    pub por_proceso: BTreeMap<u32, SnapshotRecord>,
    pub global: SnapshotRecord,
}

impl From<&TaskResult> for ResultRecord {
    fn from(result: &TaskResult) -> Self {
        Self {
            proceso_id: result.actor_id,
            nombre: result.actor_name.clone(),
            ronda: result.round,
            memoria_mb: result.memory_mb,
            tiempo_ms: result.elapsed_ms(),
            ok: result.ok,
            err: result.error.as_str().to_string(),
        }
    }
}

impl ResultRecord {
    /// Convert back into an engine result
    pub fn into_task_result(self) -> Result<TaskResult> {
        let error = ErrorLabel::parse(&self.err).ok_or_else(|| {
            EngineError::InvalidRequest(format!("unknown error label {:?}", self.err))
        })?;

        if !self.tiempo_ms.is_finite() || self.tiempo_ms < 0.0 {
            return Err(EngineError::InvalidRequest(format!(
                "invalid tiempoMs {}",
                self.tiempo_ms
            )));
        }

        Ok(TaskResult {
            actor_id: self.proceso_id,
            actor_name: self.nombre,
            round: self.ronda,
            memory_mb: self.memoria_mb,
            elapsed: Duration::from_nanos((self.tiempo_ms * 1_000_000.0).round() as u64),
            ok: self.ok,
            error,
        })
    }
}

impl From<StatsSnapshot> for SnapshotRecord {
    fn from(s: StatsSnapshot) -> Self {
        Self {
            count: s.count,
            avg_ms: s.mean_ms,
            p50_ms: s.p50_ms,
            p95_ms: s.p95_ms,
            min_ms: s.min_ms,
            max_ms: s.max_ms,
        }
    }
}

impl From<SnapshotRecord> for StatsSnapshot {
    fn from(s: SnapshotRecord) -> Self {
        Self {
            count: s.count,
            mean_ms: s.avg_ms,
            p50_ms: s.p50_ms,
            p95_ms: s.p95_ms,
            min_ms: s.min_ms,
            max_ms: s.max_ms,
        }
    }
}

impl From<&Report> for SimulationResponse {
    fn from(report: &Report) -> Self {
        Self {
            resultados: report.results.iter().map(ResultRecord::from).collect(),
            por_proceso: report
                .per_actor
                .iter()
                .map(|(id, snapshot)| (*id, SnapshotRecord::from(*snapshot)))
                .collect(),
            global: report.global.into(),
        }
    }
}

impl From<Report> for SimulationResponse {
    fn from(report: Report) -> Self {
        Self::from(&report)
    }
}

impl SimulationResponse {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
