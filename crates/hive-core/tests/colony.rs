//! Whole-colony runs on the starting colony.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::missing_panics_doc
)]

use std::collections::BTreeMap;
use std::sync::Arc;

use hive_core::{ColonyConfig, ColonyState, EndReason, NoOpCallback, RunControl, run_colony, run_tick};
use hive_ledger::{BankSnapshot, ConservationResult};
use hive_tasks::{CLAIMER_TAG, Issue, transfer_task};
use hive_types::{ResourceType, RoomName};
use hive_world::{StartingColonyIds, World, create_starting_colony};

fn colony(config: &ColonyConfig) -> (ColonyState, StartingColonyIds) {
    let (world, ids) = create_starting_colony(config.colony.seed).unwrap();
    (ColonyState::new(config, world, None), ids)
}

#[test]
fn long_run_keeps_the_books_balanced() {
    let (mut colony, _) = colony(&ColonyConfig::default());
    let mut hired = 0;
    for _ in 0..250 {
        let summary = run_tick(&mut colony).unwrap();
        hired += summary.hired;
    }
    assert!(hired > 0, "nobody was ever hired");
    assert_eq!(colony.ledger.verify_conservation(), ConservationResult::Balanced);
    assert_eq!(colony.world.tick(), 250);
}

#[test]
fn same_room_transfer_runs_through_the_center() {
    let (mut colony, ids) = colony(&ColonyConfig::default());
    run_tick(&mut colony).unwrap();

    let before = colony
        .world
        .object(ids.terminal)
        .unwrap()
        .stored(ResourceType::Energy);
    let issue = {
        let (tasks, mut services) = colony.split();
        transfer_task(
            tasks,
            &mut services,
            ids.storage,
            ids.terminal,
            BTreeMap::from([(ResourceType::Energy, 100)]),
        )
    };
    assert_eq!(issue, Issue::Delegated);

    let summary = run_tick(&mut colony).unwrap();
    assert_eq!(summary.center_moved, 100);
    let after = colony
        .world
        .object(ids.terminal)
        .unwrap()
        .stored(ResourceType::Energy);
    assert_eq!(after, before + 100);
}

#[test]
fn room_jobs_ask_for_claimers_from_home() {
    let (mut colony, ids) = colony(&ColonyConfig::default());
    assert!(colony.reserve(&ids.remote).task().is_some());
    assert!(colony.claim(&ids.expansion).task().is_some());

    let requests = colony.tasks.spawn_requests();
    let claimers: Vec<_> = requests.iter().filter(|r| r.tag == CLAIMER_TAG).collect();
    assert!(!claimers.is_empty());
    assert!(claimers.iter().all(|r| r.room == RoomName::new("W1N1")));
}

#[test]
fn bank_snapshot_restores_through_json() {
    let (mut colony, _) = colony(&ColonyConfig::default());
    for _ in 0..50 {
        run_tick(&mut colony).unwrap();
    }
    let saved = colony.ledger.bank_snapshot();
    let json = serde_json::to_string(&saved).unwrap();
    let loaded: BankSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded, saved);

    let (world, _) = create_starting_colony(42).unwrap();
    let restored = ColonyState::new(&ColonyConfig::default(), world, Some(loaded));
    assert_eq!(restored.ledger.bank_snapshot(), saved);
}

#[tokio::test]
async fn runner_stops_at_the_configured_bound() {
    let config = ColonyConfig::parse("colony:\n  tick_interval_ms: 0\n  max_ticks: 20\n").unwrap();
    let (mut colony, _) = colony(&config);
    let control = Arc::new(RunControl::from_config(&config.colony));

    let result = run_colony(&mut colony, &control, &mut NoOpCallback)
        .await
        .unwrap();

    assert_eq!(result.end_reason, EndReason::MaxTicksReached);
    assert_eq!(result.total_ticks, 20);
    assert_eq!(colony.clock.tick(), 20);
    assert_eq!(colony.ledger.verify_conservation(), ConservationResult::Balanced);
}
