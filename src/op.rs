//! Audit operation model and persistence wrappers.

use serde::{Deserialize, Serialize};

use crate::{
    engine::integrity::Dependents,
    master::MasterRef,
    types::{LogKind, OpSeq, QcStatus, RecordId},
};

/// Version number for serialized [`StoredOpEnvelope`] payloads.
pub const OP_FORMAT_VERSION: u16 = 1;

/// One committed mutation, as recorded in the audit journal.
///
/// Ops carry ids and figures only; credentials never enter the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// A log entry was added.
    AddEntry {
        /// Collection.
        kind: LogKind,
        /// New entry id.
        id: RecordId,
        /// Author account.
        user_id: RecordId,
    },
    /// A log entry was removed.
    RemoveEntry {
        /// Collection.
        kind: LogKind,
        /// Removed entry id.
        id: RecordId,
    },
    /// An entry's value field was corrected.
    EditValue {
        /// Collection.
        kind: LogKind,
        /// Entry id.
        id: RecordId,
        /// New value.
        value: f64,
        /// Value before the edit.
        prev: f64,
        /// QC status after the edit, for QC entries.
        status: Option<QcStatus>,
    },
    /// A master record was created or replaced.
    PutMaster {
        /// Affected record.
        target: MasterRef,
        /// True when an existing record was replaced.
        replaced: bool,
    },
    /// A master record was deleted, along with `removed`.
    DeleteMaster {
        /// Deleted record.
        target: MasterRef,
        /// Dependents removed in the same transition.
        removed: Dependents,
    },
    /// A report was added to the history.
    AddReport {
        /// Report id.
        id: RecordId,
    },
    /// A report was removed from the history.
    RemoveReport {
        /// Report id.
        id: RecordId,
    },
    /// A filter preset was saved.
    SaveFilter {
        /// Preset id.
        id: RecordId,
    },
    /// A user signed in.
    SignIn {
        /// Account id.
        user_id: RecordId,
    },
    /// The session user signed out.
    SignOut,
    /// One undo step was applied.
    Undo,
    /// One redo step was applied.
    Redo,
}

impl Op {
    /// Short stable tag used as the journal `kind` column.
    pub fn tag(&self) -> &'static str {
        match self {
            Op::AddEntry { .. } => "add_entry",
            Op::RemoveEntry { .. } => "remove_entry",
            Op::EditValue { .. } => "edit_value",
            Op::PutMaster { .. } => "put_master",
            Op::DeleteMaster { .. } => "delete_master",
            Op::AddReport { .. } => "add_report",
            Op::RemoveReport { .. } => "remove_report",
            Op::SaveFilter { .. } => "save_filter",
            Op::SignIn { .. } => "sign_in",
            Op::SignOut => "sign_out",
            Op::Undo => "undo",
            Op::Redo => "redo",
        }
    }

    /// Primary record id the op is about, if any.
    pub fn subject(&self) -> Option<&str> {
        match self {
            Op::AddEntry { id, .. }
            | Op::RemoveEntry { id, .. }
            | Op::EditValue { id, .. }
            | Op::AddReport { id }
            | Op::RemoveReport { id }
            | Op::SaveFilter { id } => Some(id),
            Op::PutMaster { target, .. } | Op::DeleteMaster { target, .. } => Some(target.id()),
            Op::SignIn { user_id } => Some(user_id),
            Op::SignOut | Op::Undo | Op::Redo => None,
        }
    }
}

/// Journal row metadata plus operation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOp {
    /// Monotonic operation sequence.
    pub seq: OpSeq,
    /// Operation timestamp in milliseconds.
    pub ts_ms: u64,
    /// Operation body.
    pub op: Op,
}

/// Versioned wrapper for stable on-disk payload decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOpEnvelope {
    /// Payload format version.
    pub format_version: u16,
    /// Wrapped operation.
    pub stored: StoredOp,
}

impl StoredOpEnvelope {
    /// Constructs an envelope using [`OP_FORMAT_VERSION`].
    pub fn new(stored: StoredOp) -> Self {
        Self {
            format_version: OP_FORMAT_VERSION,
            stored,
        }
    }
}
