use chrono::{DateTime, Utc};

use crate::{
    core::dataset::Dataset,
    entry::{EntryBase, MachineEntry},
    master::{InputItem, Machine, OutputItem, QcItem, QcSize, User, Worker},
    types::{MachineStatus, Role},
};

/// Username of the built-in administrator account.
pub const DEFAULT_ADMIN: &str = "admin";

/// Reference data and one sample production entry dated `now`.
///
/// Used when the snapshot gateway has nothing saved yet.
pub fn initial_dataset(now: DateTime<Utc>) -> Dataset {
    let users = vec![
        user("u1", DEFAULT_ADMIN, "System Administrator", Role::Admin, "admin"),
        user("u2", "operator", "Line Operator", Role::User, "user"),
    ];

    let sample = MachineEntry {
        base: EntryBase {
            id: "p1".into(),
            user_id: "u2".into(),
            username: "operator".into(),
            timestamp: now,
            date: now.format("%Y-%m-%d").to_string(),
            time: "08:00".into(),
            notes: None,
        },
        machine_id: "m1".into(),
        worker_id: "w1".into(),
        detail: "Batch A-100".into(),
        items_produced: 120.0,
    };

    Dataset {
        current_user: None,
        users,
        machines: vec![
            machine("m1", "CNC-01", "Milling"),
            machine("m2", "PRESS-A", "Hydraulic Press"),
        ],
        workers: vec![
            worker("w1", "Mike Worker", "Operator"),
            worker("w2", "Sarah Staff", "Operator"),
        ],
        input_items: vec![
            InputItem { id: "in1".into(), name: "Raw Steel Bar".into(), unit: "kg".into() },
            InputItem { id: "in2".into(), name: "Plastic Pellets".into(), unit: "kg".into() },
        ],
        output_items: vec![
            OutputItem { id: "out1".into(), name: "Finished Gear".into(), unit: "pcs".into() },
            OutputItem { id: "out2".into(), name: "Scrap Metal".into(), unit: "kg".into() },
        ],
        qc_items: vec![
            QcItem { id: "qc1".into(), name: "Gear Diameter Check".into() },
            QcItem { id: "qc2".into(), name: "Surface Hardness".into() },
        ],
        qc_sizes: vec![
            size("sz1", "qc1", "Small Gear (10mm)", 9.8, 10.2),
            size("sz2", "qc1", "Large Gear (50mm)", 49.5, 50.5),
            size("sz3", "qc2", "Standard Hardness", 55.0, 65.0),
        ],
        machine_logs: vec![sample],
        ..Dataset::default()
    }
}

fn user(id: &str, username: &str, full_name: &str, role: Role, password: &str) -> User {
    User {
        id: id.into(),
        username: username.into(),
        full_name: full_name.into(),
        role,
        password: password.into(),
    }
}

fn machine(id: &str, name: &str, machine_type: &str) -> Machine {
    Machine {
        id: id.into(),
        name: name.into(),
        machine_type: machine_type.into(),
        status: MachineStatus::Active,
    }
}

fn worker(id: &str, name: &str, role: &str) -> Worker {
    Worker { id: id.into(), name: name.into(), role: role.into() }
}

fn size(id: &str, qc_item_id: &str, name: &str, min_val: f64, max_val: f64) -> QcSize {
    QcSize {
        id: id.into(),
        qc_item_id: qc_item_id.into(),
        name: name.into(),
        min_val,
        max_val,
    }
}
