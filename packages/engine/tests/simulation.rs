// packages/engine/tests/simulation.rs
//! End-to-end simulation scenarios

use procsim_engine::runtime::ErrorLabel;
use procsim_engine::{
    ActorConfig, DeadlinePolicy, RuntimeSettings, Simulation, SimulationPlan, SimulationRequest,
    SimulationResponse,
};
use std::time::Duration;

fn settings() -> RuntimeSettings {
    RuntimeSettings::default()
        .with_base_unit(Duration::from_millis(100))
        .with_fixed_task_load(1)
        .with_seed(1234)
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[tokio::test(start_paused = true)]
async fn test_two_actors_three_rounds() {
    let plan = SimulationPlan::new(
        3,
        vec![ActorConfig::new(1, "p1", 1), ActorConfig::new(2, "p2", 2)],
    );

    let report = Simulation::new(settings()).run(plan).await.unwrap();

    let p1 = report.per_actor[&1];
    let p2 = report.per_actor[&2];
    assert_eq!((p1.count, p1.min_ms, p1.max_ms), (3, 100.0, 100.0));
    assert_eq!((p2.count, p2.min_ms, p2.max_ms), (3, 200.0, 200.0));

    let global = report.global;
    assert_eq!(global.count, 6);
    assert_eq!(global.min_ms, 100.0);
    assert_eq!(global.max_ms, 200.0);
    assert_eq!(global.mean_ms, 150.0);
    assert_eq!(global.p50_ms, 150.0);
    assert_eq!(global.p95_ms, 200.0);

    assert!(report.rounds.iter().all(|r| r.is_complete()));
    for result in &report.results {
        let expected = if result.actor_id == 1 { ms(100) } else { ms(200) };
        assert_eq!(result.elapsed, expected);
    }
}

#[tokio::test(start_paused = true)]
async fn test_short_deadline_does_not_hang() {
    // 500ms of work against a 10ms deadline
    let plan = SimulationPlan::new(1, vec![ActorConfig::new(1, "slow", 5)])
        .with_deadlines(DeadlinePolicy::uniform(ms(10)));

    let report = Simulation::new(settings()).run(plan).await.unwrap();

    assert_eq!(report.rounds.len(), 1);
    assert_eq!(report.rounds[0].timed_out, vec![1]);
    assert_eq!(report.per_actor[&1].count, 0);
    assert_eq!(report.per_actor[&1].mean_ms, 0.0);
    assert_eq!(report.global.count, 0);

    assert_eq!(report.results.len(), 1);
    assert!(!report.results[0].ok);
    assert_eq!(report.results[0].error, ErrorLabel::Timeout);
}

#[tokio::test(start_paused = true)]
async fn test_every_round_times_out_but_all_rounds_run() {
    let plan = SimulationPlan::new(
        4,
        vec![ActorConfig::new(1, "a", 3), ActorConfig::new(2, "b", 3)],
    )
    .with_deadlines(DeadlinePolicy::uniform(ms(50)));

    let report = Simulation::new(settings()).run(plan).await.unwrap();

    assert_eq!(report.rounds.len(), 4);
    for round in &report.rounds {
        assert!(round.reported.is_empty());
        assert_eq!(round.timed_out, vec![1, 2]);
    }
    let per_actor: u64 = report.per_actor.values().map(|s| s.count).sum();
    assert_eq!(report.global.count, per_actor);
}

#[tokio::test(start_paused = true)]
async fn test_late_results_are_counted() {
    // 300ms of work against a 250ms deadline: each result lands in the next round
    let plan = SimulationPlan::new(3, vec![ActorConfig::new(1, "a", 3)])
        .with_deadlines(DeadlinePolicy::uniform(ms(250)));

    let report = Simulation::new(settings()).run(plan).await.unwrap();

    assert_eq!(report.rounds[0].late_results, 0);
    assert_eq!(report.rounds[1].late_results, 1);
    assert_eq!(report.rounds[2].late_results, 1);
    assert!(report.rounds.iter().all(|r| r.timed_out == vec![1]));

    // Two late successes, the last task was still running at shutdown
    assert_eq!(report.per_actor[&1].count, 2);
    assert_eq!(report.per_actor[&1].mean_ms, 300.0);
    let timeouts = report.results.iter().filter(|r| !r.ok).count();
    assert_eq!(timeouts, 3);
}

#[tokio::test(start_paused = true)]
async fn test_result_count_is_actors_times_rounds() {
    let actors: Vec<_> = (1..=5)
        .map(|id| ActorConfig::new(id, format!("p{}", id), 1).with_max_jitter(ms(40)))
        .collect();
    let settings = RuntimeSettings::default().with_seed(99);

    let report = Simulation::new(settings)
        .run(SimulationPlan::new(6, actors))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 30);
    assert_eq!(report.global.count, 30);
    for snapshot in report.per_actor.values() {
        assert_eq!(snapshot.count, 6);
        assert!(snapshot.min_ms >= 100.0);
        assert!(snapshot.max_ms <= 540.0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_per_round_override_wins() {
    // Round 1 uses a generous override, later rounds fall back to 10ms
    let plan = SimulationPlan::new(2, vec![ActorConfig::new(1, "a", 1)])
        .with_deadlines(DeadlinePolicy::uniform(ms(10)).with_overrides(vec![ms(1_000)]));

    let report = Simulation::new(settings()).run(plan).await.unwrap();

    assert!(report.rounds[0].is_complete());
    assert_eq!(report.rounds[0].deadline, Some(ms(1_000)));
    assert_eq!(report.rounds[1].timed_out, vec![1]);
    assert_eq!(report.rounds[1].deadline, Some(ms(10)));
}

#[tokio::test(start_paused = true)]
async fn test_full_mailboxes_do_not_deadlock_dispatch() {
    // 500ms of work, a 10ms deadline and single-slot mailboxes keep every channel full
    let actors: Vec<_> = (1..=4)
        .map(|id| ActorConfig::new(id, format!("p{}", id), 5))
        .collect();
    let plan = SimulationPlan::new(20, actors).with_deadlines(DeadlinePolicy::uniform(ms(10)));

    let report = Simulation::new(settings().with_channel_capacity(1))
        .run(plan)
        .await
        .unwrap();

    assert_eq!(report.rounds.len(), 20);
    let per_actor: u64 = report.per_actor.values().map(|s| s.count).sum();
    assert_eq!(report.global.count, per_actor);
    assert!(report.global.count > 0);

    let successes = report.results.iter().filter(|r| r.ok).count() as u64;
    assert_eq!(successes, report.global.count);
    assert!(report.results.iter().filter(|r| r.ok).all(|r| r.elapsed == ms(500)));
}

#[tokio::test(start_paused = true)]
async fn test_huge_request_deadlines_run_without_deadline() {
    for deadlines in [
        r#""timeoutRondaS": 9223372036854775807"#,
        r#""timeoutRondaS": 0, "timeoutPorRondaMins": [9223372036854775807]"#,
    ] {
        let json = format!(
            r#"{{
                "rondas": 1,
                {},
                "procesos": [
                    {{"id": 1, "nombre": "Proceso_1", "cargaBase": 1, "memoriaEstimadamb": 10, "jitterMaxMs": 0}}
                ]
            }}"#,
            deadlines
        );
        let plan = SimulationRequest::from_json(&json).unwrap().into_plan().unwrap();

        let report = Simulation::new(settings()).run(plan).await.unwrap();

        assert!(report.rounds[0].is_complete());
        assert!(report.rounds[0].deadline.is_some());
        assert_eq!(report.global.count, 1);
        assert_eq!(report.global.mean_ms, 100.0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_wire_round_trip() {
    let request = SimulationRequest::from_json(
        r#"{
            "rondas": 2,
            "timeoutRondaS": 0,
            "procesos": [
                {"id": 1, "nombre": "Proceso_1", "cargaBase": 1, "memoriaEstimadamb": 100, "jitterMaxMs": 0},
                {"id": 2, "nombre": "Proceso_2", "cargaBase": 2, "memoriaEstimadamb": 200, "jitterMaxMs": 0}
            ]
        }"#,
    )
    .unwrap();

    let report = Simulation::new(settings())
        .run(request.into_plan().unwrap())
        .await
        .unwrap();
    let response = SimulationResponse::from(&report);

    assert_eq!(response.resultados.len(), 4);
    assert_eq!(response.por_proceso.len(), 2);
    assert_eq!(response.global.count, 4);
    assert_eq!(response.global.avg_ms, 150.0);

    let p2 = response
        .resultados
        .iter()
        .find(|r| r.proceso_id == 2)
        .unwrap();
    assert_eq!(p2.memoria_mb, 200);
    assert_eq!(p2.tiempo_ms, 200.0);
    assert_eq!(p2.err, "");

    let json = serde_json::to_value(&response).unwrap();
    assert!(json["porProceso"]["1"]["p95Ms"].is_number());
    assert!(json["global"]["count"].is_number());
}
