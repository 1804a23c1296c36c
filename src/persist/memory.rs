//! In-process gateway whose slot can be shared between clones.

use std::sync::{Arc, Mutex};

use crate::{core::dataset::Dataset, op::StoredOp, types::OpSeq};

use super::{PersistError, PersistResult, SnapshotGateway};

#[derive(Debug, Default)]
struct Slot {
    dataset: Option<Dataset>,
    ops: Vec<StoredOp>,
    saves: usize,
}

/// Gateway backed by shared memory. Clones see the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    slot: Arc<Mutex<Slot>>,
}

impl MemoryGateway {
    /// Empty gateway; the first `load` returns `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway pre-loaded with `dataset`.
    pub fn with_dataset(dataset: Dataset) -> Self {
        let gw = Self::default();
        if let Ok(mut slot) = gw.slot.lock() {
            slot.dataset = Some(dataset);
        }
        gw
    }

    /// Last saved dataset.
    pub fn saved(&self) -> Option<Dataset> {
        self.slot.lock().ok().and_then(|s| s.dataset.clone())
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.slot.lock().map(|s| s.saves).unwrap_or(0)
    }

    /// Audit ops appended so far.
    pub fn ops(&self) -> Vec<StoredOp> {
        self.slot.lock().map(|s| s.ops.clone()).unwrap_or_default()
    }

    fn lock(&self) -> PersistResult<std::sync::MutexGuard<'_, Slot>> {
        self.slot
            .lock()
            .map_err(|_| PersistError::Message("memory gateway poisoned".to_string()))
    }
}

impl SnapshotGateway for MemoryGateway {
    fn load(&mut self) -> PersistResult<Option<Dataset>> {
        Ok(self.lock()?.dataset.clone())
    }

    fn save(&mut self, dataset: &Dataset) -> PersistResult<()> {
        let mut slot = self.lock()?;
        slot.dataset = Some(dataset.clone());
        slot.saves += 1;
        Ok(())
    }

    fn append_ops(&mut self, ops: &[StoredOp]) -> PersistResult<OpSeq> {
        let mut slot = self.lock()?;
        slot.ops.extend_from_slice(ops);
        Ok(slot.ops.last().map(|o| o.seq).unwrap_or(0))
    }

    fn latest_seq(&self) -> PersistResult<OpSeq> {
        Ok(self.lock()?.ops.last().map(|o| o.seq).unwrap_or(0))
    }
}
