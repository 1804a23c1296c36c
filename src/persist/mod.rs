//! Snapshot gateway abstraction and its implementations.

/// Shared in-memory gateway.
pub mod memory;
/// SQLite snapshot and audit-journal gateway.
pub mod sqlite;

use chrono::Utc;
use tracing::info;

use crate::{
    config::StoreConfig,
    core::{dataset::Dataset, seed::initial_dataset, store::PlantStore},
    op::StoredOp,
    types::OpSeq,
};

/// Persistence failure. Never rolls back in-memory state.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// SQLite error.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Payload encoding or decoding error.
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
    /// Anything else, e.g. an unsupported payload version.
    #[error("{0}")]
    Message(String),
}

/// Result alias for persistence calls.
pub type PersistResult<T> = Result<T, PersistError>;

/// Load/save boundary for the whole dataset.
///
/// `load` returns `None` on first run; callers then start from
/// [`crate::core::seed::initial_dataset`].
pub trait SnapshotGateway: Send {
    /// Last saved dataset, if any.
    fn load(&mut self) -> PersistResult<Option<Dataset>>;

    /// Replaces the saved dataset.
    fn save(&mut self, dataset: &Dataset) -> PersistResult<()>;

    /// Appends audit ops; returns the highest stored sequence.
    fn append_ops(&mut self, ops: &[StoredOp]) -> PersistResult<OpSeq> {
        Ok(ops.last().map(|o| o.seq).unwrap_or(0))
    }

    /// Highest audit sequence already stored.
    fn latest_seq(&self) -> PersistResult<OpSeq> {
        Ok(0)
    }

    /// Forces buffered writes down.
    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }
}

/// Builds a store from the gateway's saved dataset, seeding on first run.
///
/// Op numbering continues after the gateway's journal.
pub fn load_store(gateway: &mut dyn SnapshotGateway, config: StoreConfig) -> PersistResult<PlantStore> {
    let dataset = match gateway.load()? {
        Some(dataset) => dataset,
        None => {
            info!("no saved dataset, starting from seed data");
            initial_dataset(Utc::now())
        }
    };
    let mut store = PlantStore::with_config(dataset, config);
    store.resume_after(gateway.latest_seq()?);
    Ok(store)
}
