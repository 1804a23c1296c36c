use chrono::Utc;

use plantlog::{
    config::StoreConfig,
    core::{
        seed::initial_dataset,
        store::{Confirmation, DeleteOutcome, PlantStore, StoreError},
    },
    engine::integrity::{BlockReason, DeleteProposal, Dependents, IntegrityError},
    entry::{AttendanceEntry, InputEntry, MachineEntry, QcEntry},
    master::{MasterRef, User},
    types::{MasterKind, Role},
};

fn store() -> PlantStore {
    let mut store = PlantStore::from_dataset(initial_dataset(Utc::now()));
    store.sign_in("admin", "admin").unwrap();
    store
}

fn add_production(store: &mut PlantStore, machine: &str, worker: &str) -> String {
    let entry = MachineEntry {
        base: store.stamp("2024-06-02", "10:00").unwrap(),
        machine_id: machine.into(),
        worker_id: worker.into(),
        detail: String::new(),
        items_produced: 5.0,
    };
    store.add_entry(entry).unwrap()
}

fn add_qc(store: &mut PlantStore, size_id: &str, value: f64) -> String {
    let size = store.dataset().qc_size(size_id).unwrap().clone();
    let entry = QcEntry::measured(store.stamp("2024-06-02", "10:05").unwrap(), &size, value);
    store.add_entry(entry).unwrap()
}

#[test]
fn unused_machine_deletes_cleanly() {
    let mut store = store();
    let before = store.export_dataset();
    let proposal = store.propose_delete(MasterRef::Machine("m2".into())).unwrap();
    assert!(matches!(proposal, DeleteProposal::Clean { .. }));

    let outcome = store.commit_delete(proposal, Confirmation::Declined).unwrap();
    assert_eq!(
        outcome,
        DeleteOutcome::Deleted {
            target: MasterRef::Machine("m2".into()),
            removed: Dependents::default(),
        }
    );

    let mut expected = before;
    expected.machines.retain(|m| m.id != "m2");
    assert_eq!(store.dataset(), &expected);
}

#[test]
fn machine_cascade_removes_exactly_its_entries() {
    let mut store = store();
    add_production(&mut store, "m1", "w2");
    let other = add_production(&mut store, "m2", "w1");

    let proposal = store.propose_delete(MasterRef::Machine("m1".into())).unwrap();
    let DeleteProposal::NeedsConfirmation { dependents, .. } = &proposal else {
        panic!("expected confirmation, got {proposal:?}");
    };
    assert_eq!(dependents.machine_entries, 2);
    assert_eq!(dependents.entries(), 2);

    store.commit_delete(proposal, Confirmation::Confirmed).unwrap();
    let data = store.dataset();
    assert!(data.machine("m1").is_none());
    assert_eq!(data.machine_logs.len(), 1);
    assert_eq!(data.machine_logs[0].base.id, other);
    assert_eq!(data.workers.len(), 2);
}

#[test]
fn declined_cascade_changes_nothing() {
    let mut store = store();
    let before = store.export_dataset();
    let outcome = store
        .request_delete(MasterRef::Machine("m1".into()), |deps| {
            assert_eq!(deps.machine_entries, 1);
            false
        })
        .unwrap();
    assert!(matches!(outcome, DeleteOutcome::Declined { .. }));
    assert_eq!(store.dataset(), &before);
}

#[test]
fn worker_cascade_covers_production_and_attendance() {
    let mut store = store();
    let base = store.stamp("", "17:00").unwrap();
    store
        .add_entry(AttendanceEntry::new(base, "w1", "2024-06-02", 8.0))
        .unwrap();

    let outcome = store
        .request_delete(MasterRef::Worker("w1".into()), |_| true)
        .unwrap();
    let DeleteOutcome::Deleted { removed, .. } = outcome else {
        panic!("expected delete");
    };
    assert_eq!(removed.machine_entries, 1);
    assert_eq!(removed.attendance_entries, 1);
    assert!(store.dataset().machine_logs.is_empty());
    assert!(store.dataset().attendance_logs.is_empty());
}

#[test]
fn input_item_cascade() {
    let mut store = store();
    let entry = InputEntry {
        base: store.stamp("2024-06-02", "06:00").unwrap(),
        input_item_id: "in2".into(),
        detail: "Silo 3".into(),
        weight: 250.0,
    };
    store.add_entry(entry).unwrap();

    let outcome = store
        .request_delete(MasterRef::InputItem("in2".into()), |d| d.input_entries == 1)
        .unwrap();
    assert!(matches!(outcome, DeleteOutcome::Deleted { .. }));
    assert!(store.dataset().input_logs.is_empty());
    assert_eq!(store.dataset().input_items.len(), 1);
}

#[test]
fn qc_item_and_size_block_regardless_of_confirmation() {
    let mut store = store();
    add_qc(&mut store, "sz1", 10.0);
    let before = store.export_dataset();

    for target in [MasterRef::QcItem("qc1".into()), MasterRef::QcSize("sz1".into())] {
        let proposal = store.propose_delete(target).unwrap();
        assert!(matches!(
            proposal,
            DeleteProposal::Blocked {
                reason: BlockReason::HasDependents { count: 1 },
                ..
            }
        ));
        let outcome = store.commit_delete(proposal, Confirmation::Confirmed).unwrap();
        assert!(matches!(outcome, DeleteOutcome::Blocked { .. }));
        assert_eq!(store.dataset(), &before);
    }
}

#[test]
fn clean_qc_item_takes_its_sizes() {
    let mut store = store();
    let outcome = store
        .request_delete(MasterRef::QcItem("qc1".into()), |_| false)
        .unwrap();
    let DeleteOutcome::Deleted { removed, .. } = outcome else {
        panic!("expected delete");
    };
    assert_eq!(removed.qc_sizes, 2);
    assert!(store.dataset().sizes_of("qc1").next().is_none());
    assert_eq!(store.dataset().qc_sizes.len(), 1);
}

#[test]
fn unused_size_deletes_alone() {
    let mut store = store();
    add_qc(&mut store, "sz1", 10.0);
    let outcome = store
        .request_delete(MasterRef::QcSize("sz2".into()), |_| false)
        .unwrap();
    assert!(matches!(outcome, DeleteOutcome::Deleted { .. }));
    assert!(store.dataset().qc_size("sz2").is_none());
    assert!(store.dataset().qc_size("sz1").is_some());
}

fn guest(id: &str, username: &str) -> User {
    User {
        id: id.into(),
        username: username.into(),
        full_name: "Guest".into(),
        role: Role::User,
        password: "pw".into(),
    }
}

#[test]
fn user_without_history_can_be_deleted() {
    let mut store = store();
    store.create_user(guest("u3", "guest")).unwrap();
    let outcome = store.request_delete(MasterRef::User("u3".into()), |_| false).unwrap();
    assert!(matches!(outcome, DeleteOutcome::Deleted { .. }));
    assert!(store.dataset().user("u3").is_none());
}

#[test]
fn user_with_history_is_blocked() {
    let mut store = store();
    let proposal = store.propose_delete(MasterRef::User("u2".into())).unwrap();
    assert_eq!(
        proposal,
        DeleteProposal::Blocked {
            target: MasterRef::User("u2".into()),
            reason: BlockReason::HasDependents { count: 1 },
        }
    );
}

#[test]
fn session_user_is_blocked() {
    let mut store = PlantStore::from_dataset(initial_dataset(Utc::now()));
    store.create_user(guest("u3", "guest")).unwrap();
    store.sign_in("guest", "pw").unwrap();
    let outcome = store.request_delete(MasterRef::User("u3".into()), |_| true).unwrap();
    assert!(matches!(
        outcome,
        DeleteOutcome::Blocked {
            reason: BlockReason::ActiveSession,
            ..
        }
    ));
}

#[test]
fn protected_account_is_blocked_even_without_history() {
    let mut store = PlantStore::from_dataset(initial_dataset(Utc::now()));
    let outcome = store.request_delete(MasterRef::User("u1".into()), |_| true).unwrap();
    assert!(matches!(
        outcome,
        DeleteOutcome::Blocked {
            reason: BlockReason::ProtectedAccount,
            ..
        }
    ));

    let mut custom = PlantStore::with_config(initial_dataset(Utc::now()), StoreConfig {
        protected_username: "operator".into(),
        ..StoreConfig::default()
    });
    let proposal = custom.propose_delete(MasterRef::User("u2".into())).unwrap();
    assert!(matches!(
        proposal,
        DeleteProposal::Blocked {
            reason: BlockReason::ProtectedAccount,
            ..
        }
    ));
    let admin = custom.propose_delete(MasterRef::User("u1".into())).unwrap();
    assert!(matches!(admin, DeleteProposal::Clean { .. }));
}

#[test]
fn unknown_target_is_an_error() {
    let store = store();
    assert_eq!(
        store.propose_delete(MasterRef::Worker("w9".into())).unwrap_err(),
        StoreError::Integrity(IntegrityError::UnknownRecord {
            kind: MasterKind::Worker,
            id: "w9".into(),
        })
    );
}

#[test]
fn stale_proposal_is_refused() {
    let mut store = store();
    let proposal = store.propose_delete(MasterRef::Machine("m2".into())).unwrap();
    add_production(&mut store, "m2", "w1");
    assert_eq!(
        store.commit_delete(proposal, Confirmation::Confirmed).unwrap_err(),
        StoreError::StaleProposal
    );
    assert!(store.dataset().machine("m2").is_some());
}

#[test]
fn cascade_is_one_undo_step() {
    let mut store = store();
    add_production(&mut store, "m1", "w1");
    let before = store.export_dataset();
    store.request_delete(MasterRef::Machine("m1".into()), |_| true).unwrap();
    store.undo().unwrap();
    assert_eq!(store.dataset(), &before);
}
