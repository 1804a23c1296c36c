//! Domain state engine for manufacturing data capture.
//!
//! A [`core::store::PlantStore`] owns the whole plant [`core::dataset::Dataset`]:
//! master data (machines, workers, items, QC ranges, users), five log
//! collections, saved reports and filter presets. It evaluates QC
//! measurements, keeps references intact on delete, filters entries and
//! records an audit journal. Persistence goes through a
//! [`persist::SnapshotGateway`].
//!
//! # Examples
//!
//! In-memory usage with [`core::store::PlantStore`]:
//! ```
//! use chrono::Utc;
//! use plantlog::{
//!     core::{seed::initial_dataset, store::{Confirmation, DeleteOutcome, PlantStore}},
//!     engine::integrity::DeleteProposal,
//!     entry::QcEntry,
//!     master::MasterRef,
//!     types::{LogKind, QcStatus},
//! };
//!
//! let mut store = PlantStore::from_dataset(initial_dataset(Utc::now()));
//! store.sign_in("operator", "user").unwrap();
//!
//! let size = store.dataset().qc_size("sz1").unwrap().clone();
//! let base = store.stamp("2024-03-05", "10:30").unwrap();
//! let id = store.add_entry(QcEntry::measured(base, &size, 10.5)).unwrap();
//! assert_eq!(store.dataset().qc_logs[0].status, QcStatus::Wrong);
//!
//! store.edit_value(LogKind::Qc, &id, "10.0");
//! assert_eq!(store.dataset().qc_logs[0].status, QcStatus::Correct);
//!
//! let proposal = store.propose_delete(MasterRef::Machine("m1".into())).unwrap();
//! assert!(matches!(proposal, DeleteProposal::NeedsConfirmation { .. }));
//! let outcome = store.commit_delete(proposal, Confirmation::Declined).unwrap();
//! assert!(matches!(outcome, DeleteOutcome::Declined { .. }));
//! ```
//!
//! Runtime usage with the SQLite gateway:
//! ```no_run
//! use plantlog::{
//!     persist::{load_store, sqlite::SqliteGateway},
//!     config::{RuntimeConfig, StoreConfig},
//!     runtime::handle::spawn_plant,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut gateway = SqliteGateway::open("plant.db").expect("open sqlite");
//! let store = load_store(&mut gateway, StoreConfig::default()).expect("load");
//! let handle = spawn_plant(store, Some(Box::new(gateway)), RuntimeConfig::default());
//! handle.sign_in("admin", "admin").await.expect("sign in");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![warn(missing_docs)]

/// Configuration file and environment overrides.
pub mod config;
/// Dataset, seed data and the authoritative store.
pub mod core;
/// QC evaluation, filtering, integrity, stats and report export.
pub mod engine;
/// Log entry records.
pub mod entry;
/// Tracing subscriber setup.
pub mod logging;
/// Master data, saved reports and saved filters.
pub mod master;
/// Audit op model and persistence wrapper types.
pub mod op;
/// Snapshot gateway abstraction, SQLite and in-memory implementations.
pub mod persist;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Shared primitive types and enums.
pub mod types;
