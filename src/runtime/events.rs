//! Runtime event stream payloads.

use crate::{op::Op, types::OpSeq};

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PlantEvent {
    /// A store operation committed.
    Committed {
        /// Op sequence.
        seq: OpSeq,
        /// What happened.
        op: Op,
    },
    /// The gateway holds a snapshot covering at least this op sequence.
    Saved {
        /// Highest sequence known saved.
        op_seq: OpSeq,
    },
    /// A snapshot save failed; in-memory state is unaffected.
    SaveFailed {
        /// Rendered persistence error.
        error: String,
    },
}
