use chrono::Utc;
use tempfile::tempdir;

use plantlog::{
    config::StoreConfig,
    core::{seed::initial_dataset, store::PlantStore},
    entry::MachineEntry,
    master::MasterRef,
    persist::{SnapshotGateway, load_store, memory::MemoryGateway, sqlite::SqliteGateway},
    types::LogKind,
};

fn add_production(store: &mut PlantStore, qty: f64) -> String {
    let entry = MachineEntry {
        base: store.stamp("2024-06-03", "14:00").unwrap(),
        machine_id: "m2".into(),
        worker_id: "w2".into(),
        detail: "Batch C-3".into(),
        items_produced: qty,
    };
    store.add_entry(entry).unwrap()
}

#[test]
fn first_run_loads_nothing_and_seeds() {
    let dir = tempdir().unwrap();
    let mut gw = SqliteGateway::open(dir.path().join("plant.db")).unwrap();
    assert!(gw.load().unwrap().is_none());

    let store = load_store(&mut gw, StoreConfig::default()).unwrap();
    assert_eq!(store.dataset().users.len(), 2);
    assert_eq!(store.dataset().machine_logs[0].base.id, "p1");
    assert_eq!(store.latest_op_seq(), 0);
}

#[test]
fn save_then_reopen_restores_dataset_and_journal() {
    plantlog::logging::init_test();
    let dir = tempdir().unwrap();
    let path = dir.path().join("plant.db");

    let saved = {
        let mut gw = SqliteGateway::open(&path).unwrap();
        let mut store = load_store(&mut gw, StoreConfig::default()).unwrap();
        store.sign_in("operator", "user").unwrap();
        let id = add_production(&mut store, 33.0);
        store.edit_value(LogKind::Machine, &id, "34");
        store
            .request_delete(MasterRef::Machine("m1".into()), |_| true)
            .unwrap();

        gw.append_ops(&store.drain_pending_ops()).unwrap();
        gw.save(store.dataset()).unwrap();
        gw.flush().unwrap();
        store.export_dataset()
    };

    let mut gw = SqliteGateway::open(&path).unwrap();
    assert_eq!(gw.load().unwrap().as_ref(), Some(&saved));
    assert_eq!(gw.latest_seq().unwrap(), 4);

    let tags: Vec<_> = gw
        .load_events_after(0)
        .unwrap()
        .into_iter()
        .map(|o| o.op.tag())
        .collect();
    assert_eq!(tags, ["sign_in", "add_entry", "edit_value", "delete_master"]);
    assert_eq!(gw.events_for("m1").unwrap().len(), 1);

    let mut store = load_store(&mut gw, StoreConfig::default()).unwrap();
    assert_eq!(store.dataset(), &saved);
    assert!(store.current_user().is_some());
    store.sign_out();
    assert_eq!(store.drain_pending_ops()[0].seq, 5);
}

#[test]
fn snapshot_retention_prunes_old_rows() {
    let mut gw = SqliteGateway::open_in_memory().unwrap().with_snapshot_retention(2);
    let mut data = initial_dataset(Utc::now());
    for i in 0..5 {
        data.workers[0].name = format!("Worker {i}");
        gw.save(&data).unwrap();
    }
    assert_eq!(gw.snapshot_count().unwrap(), 2);
    assert_eq!(gw.load().unwrap().unwrap().workers[0].name, "Worker 4");
}

#[test]
fn unsupported_snapshot_version_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plant.db");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE snapshots (id INTEGER PRIMARY KEY AUTOINCREMENT, ts_ms INTEGER NOT NULL, payload BLOB NOT NULL);",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO snapshots(ts_ms, payload) VALUES (0, ?1)",
            [br#"{"format_version":99,"dataset":{}}"#.to_vec()],
        )
        .unwrap();
    }
    let mut gw = SqliteGateway::open(&path).unwrap();
    assert!(gw.load().is_err());
}

#[test]
fn memory_gateway_clones_share_one_slot() {
    let gw = MemoryGateway::new();
    let mut writer = gw.clone();
    let data = initial_dataset(Utc::now());
    writer.save(&data).unwrap();

    assert_eq!(gw.saved(), Some(data.clone()));
    assert_eq!(gw.save_count(), 1);

    let mut reader = MemoryGateway::with_dataset(data.clone());
    let store = load_store(&mut reader, StoreConfig::default()).unwrap();
    assert_eq!(store.dataset(), &data);
}
