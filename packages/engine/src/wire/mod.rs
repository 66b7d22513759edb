// packages/engine/src/wire/mod.rs
//! JSON request/response shapes used by external front-ends
//!
//! ```json
//! { "rondas": 5, "timeoutRondaS": 2, "timeoutPorRondaMins": [0, 1],
//!   "procesos": [{ "id": 1, "nombre": "Proceso_1", "cargaBase": 2,
//!                  "memoriaEstimadamb": 100, "jitterMaxMs": 300 }] }
//! ```
//!
//! The response carries `resultados`, `porProceso` and `global`.

pub mod request;
pub mod response;

pub use request::{ProcessSpec, SimulationRequest};
pub use response::{ResultRecord, SimulationResponse, SnapshotRecord};
