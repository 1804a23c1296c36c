use std::time::Duration;

use chrono::Utc;
use tempfile::tempdir;
use tokio::time::timeout;

use plantlog::{
    config::{PlantConfig, RuntimeConfig},
    core::{
        dataset::{Dataset, ValueChange},
        seed::initial_dataset,
        store::{Confirmation, DeleteOutcome, EditOutcome, PlantStore, QcMeasurement},
    },
    engine::integrity::DeleteProposal,
    entry::MachineEntry,
    master::MasterRef,
    op::Op,
    persist::{PersistError, PersistResult, SnapshotGateway, memory::MemoryGateway, sqlite::SqliteGateway},
    runtime::{
        events::PlantEvent,
        handle::{RuntimeError, open_plant, spawn_plant},
    },
    types::{LogKind, QcStatus},
};

fn seeded() -> PlantStore {
    PlantStore::from_dataset(initial_dataset(Utc::now()))
}

#[tokio::test]
async fn commands_apply_in_order_and_emit_events() {
    let handle = spawn_plant(seeded(), None, RuntimeConfig::default());
    let mut events = handle.subscribe();

    handle.sign_in("operator", "user").await.unwrap();
    let ids = handle
        .record_qc_inspection("qc1", "2024-06-04", "09:10", vec![QcMeasurement {
            qc_size_id: "sz2".into(),
            raw: "51".into(),
            notes: None,
        }])
        .await
        .unwrap();
    let outcome = handle.edit_value(LogKind::Qc, ids[0].clone(), "50").await.unwrap();
    assert_eq!(
        outcome,
        EditOutcome::Applied(ValueChange {
            previous: 51.0,
            value: 50.0,
            status: Some((QcStatus::Wrong, QcStatus::Correct)),
            status_recomputed: true,
        })
    );

    let mut seqs = Vec::new();
    for _ in 0..3 {
        let ev = timeout(Duration::from_secs(1), events.recv()).await.unwrap().unwrap();
        let PlantEvent::Committed { seq, .. } = ev else {
            panic!("unexpected event {ev:?}");
        };
        seqs.push(seq);
    }
    assert_eq!(seqs, [1, 2, 3]);
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn failed_commands_surface_store_errors() {
    let handle = spawn_plant(seeded(), None, RuntimeConfig::default());
    let err = handle.sign_in("nobody", "x").await.unwrap_err();
    assert!(matches!(err, RuntimeError::Store(_)));
    assert!(matches!(handle.undo().await, Err(RuntimeError::Store(_))));
    handle.shutdown().await.unwrap();
    assert!(matches!(handle.summary().await, Err(RuntimeError::ChannelClosed)));
}

#[tokio::test]
async fn concurrent_writers_are_serialised() {
    let handle = spawn_plant(seeded(), None, RuntimeConfig::default());
    handle.sign_in("admin", "admin").await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let h = handle.clone();
        tasks.push(tokio::spawn(async move {
            h.with_store(move |s| {
                let entry = MachineEntry {
                    base: s.stamp("2024-06-04", format!("10:{i:02}"))?,
                    machine_id: "m1".into(),
                    worker_id: "w1".into(),
                    detail: format!("run {i}"),
                    items_produced: 1.0,
                };
                s.add_entry(entry)
            })
            .await
        }));
    }
    for t in tasks {
        t.await.unwrap().unwrap().unwrap();
    }
    assert_eq!(handle.summary().await.unwrap().total_production, 136.0);
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn two_phase_delete_through_handle() {
    let gw = MemoryGateway::new();
    let handle = spawn_plant(seeded(), Some(Box::new(gw.clone())), RuntimeConfig::default());

    let proposal = handle.propose_delete(MasterRef::Machine("m1".into())).await.unwrap();
    assert!(matches!(proposal, DeleteProposal::NeedsConfirmation { .. }));
    let outcome = handle.commit_delete(proposal, Confirmation::Confirmed).await.unwrap();
    assert!(matches!(outcome, DeleteOutcome::Deleted { .. }));

    let seq = handle.flush().await.unwrap();
    assert_eq!(seq, 1);
    let saved = gw.saved().unwrap();
    assert!(saved.machines.iter().all(|m| m.id != "m1"));
    assert!(saved.machine_logs.is_empty());
    assert!(matches!(gw.ops()[0].op, Op::DeleteMaster { .. }));
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn batched_saves_coalesce() {
    let gw = MemoryGateway::new();
    let cfg = RuntimeConfig {
        save_immediately: false,
        save_max_latency_ms: 60_000,
        journal_ops: false,
        ..RuntimeConfig::default()
    };
    let handle = spawn_plant(seeded(), Some(Box::new(gw.clone())), cfg);
    handle.sign_in("admin", "admin").await.unwrap();
    for raw in ["121", "122", "123"] {
        handle.edit_value(LogKind::Machine, "p1", raw).await.unwrap();
    }
    assert_eq!(handle.flush().await.unwrap(), 4);
    assert_eq!(gw.save_count(), 1);
    assert!(gw.ops().is_empty());
    assert_eq!(gw.saved().unwrap().machine_logs[0].items_produced, 123.0);
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn reads_do_not_trigger_saves() {
    let gw = MemoryGateway::new();
    let handle = spawn_plant(seeded(), Some(Box::new(gw.clone())), RuntimeConfig::default());
    let _ = handle.summary().await.unwrap();
    let _ = handle.query(LogKind::Machine, Default::default()).await.unwrap();
    assert_eq!(handle.edit_value(LogKind::Machine, "p1", "abc").await.unwrap(), EditOutcome::InvalidNumber);
    handle.flush().await.unwrap();
    assert_eq!(gw.save_count(), 0);
    handle.shutdown().await.unwrap();
}

struct FailingGateway;

impl SnapshotGateway for FailingGateway {
    fn load(&mut self) -> PersistResult<Option<Dataset>> {
        Ok(None)
    }

    fn save(&mut self, _dataset: &Dataset) -> PersistResult<()> {
        Err(PersistError::Message("disk full".into()))
    }
}

#[tokio::test]
async fn save_failure_keeps_memory_state() {
    plantlog::logging::init_test();
    let handle = spawn_plant(seeded(), Some(Box::new(FailingGateway)), RuntimeConfig::default());
    let mut events = handle.subscribe();

    handle.sign_in("admin", "admin").await.unwrap();
    let failed = timeout(Duration::from_secs(1), async {
        loop {
            if let Ok(PlantEvent::SaveFailed { error }) = events.recv().await {
                return error;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(failed, "disk full");
    assert!(handle.dataset().await.unwrap().current_user.is_some());
    assert!(handle.flush().await.is_ok());
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn open_plant_round_trips_through_sqlite() {
    let dir = tempdir().unwrap();
    let cfg = PlantConfig {
        database_path: Some(dir.path().join("plant.db")),
        ..PlantConfig::default()
    };

    let handle = open_plant(&cfg).unwrap();
    handle.sign_in("admin", "admin").await.unwrap();
    handle.remove_entry(LogKind::Machine, "p1").await.unwrap();
    handle.shutdown().await.unwrap();

    let mut gw = SqliteGateway::open(dir.path().join("plant.db")).unwrap();
    let saved = gw.load().unwrap().unwrap();
    assert!(saved.machine_logs.is_empty());

    let handle = open_plant(&cfg).unwrap();
    assert!(handle.dataset().await.unwrap().machine_logs.is_empty());
    handle.shutdown().await.unwrap();
}
