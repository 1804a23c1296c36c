//! Deletion policies for master data.
//!
//! Deleting a master record is a two-phase protocol: [`propose_delete`]
//! inspects the dataset and classifies the request, and the store commits the
//! resulting [`DeleteProposal`] once the caller has decided. Policies per kind:
//!
//! | kind | dependents | policy |
//! |---|---|---|
//! | machine | production entries | cascade after confirmation |
//! | worker | production + attendance entries | cascade after confirmation |
//! | input / output item | input / output entries | cascade after confirmation |
//! | QC item | QC entries | hard block; a clean delete also drops its sizes |
//! | QC size | QC entries | hard block |
//! | user | any authored entry | hard block; session and protected accounts never |

use serde::{Deserialize, Serialize};

use crate::{
    core::dataset::Dataset,
    entry::LogRecord,
    master::MasterRef,
    types::{LogKind, MasterKind},
};

/// Failure to classify a delete request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    /// The target does not exist.
    #[error("no {kind} with id {id}")]
    UnknownRecord {
        /// Target collection.
        kind: MasterKind,
        /// Target id.
        id: String,
    },
}

/// Records that reference (or belong to) a master record, per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dependents {
    /// Production entries.
    pub machine_entries: usize,
    /// Material input entries.
    pub input_entries: usize,
    /// Output entries.
    pub output_entries: usize,
    /// QC entries.
    pub qc_entries: usize,
    /// Attendance entries.
    pub attendance_entries: usize,
    /// QC sizes owned by a QC item.
    pub qc_sizes: usize,
}

impl Dependents {
    /// Total referencing log entries across all five collections.
    pub fn entries(&self) -> usize {
        self.machine_entries + self.input_entries + self.output_entries + self.qc_entries + self.attendance_entries
    }

    /// Entries in one collection.
    pub fn of_kind(&self, kind: LogKind) -> usize {
        match kind {
            LogKind::Machine => self.machine_entries,
            LogKind::Input => self.input_entries,
            LogKind::Output => self.output_entries,
            LogKind::Qc => self.qc_entries,
            LogKind::Attendance => self.attendance_entries,
        }
    }
}

/// Why a delete can never proceed in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockReason {
    /// Log entries still reference the record.
    HasDependents {
        /// Number of referencing entries.
        count: usize,
    },
    /// The record is the signed-in account.
    ActiveSession,
    /// The record is the protected administrator account.
    ProtectedAccount,
}

/// Classification of a delete request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteProposal {
    /// Nothing references the target; `dependents` lists owned children removed with it.
    Clean {
        /// Record to delete.
        target: MasterRef,
        /// Children removed alongside, e.g. a QC item's sizes.
        dependents: Dependents,
    },
    /// Cascading delete that needs an explicit yes.
    NeedsConfirmation {
        /// Record to delete.
        target: MasterRef,
        /// Entries removed with it.
        dependents: Dependents,
    },
    /// Refused outright.
    Blocked {
        /// Record that was requested.
        target: MasterRef,
        /// Why it was refused.
        reason: BlockReason,
    },
}

impl DeleteProposal {
    /// Record the proposal is about.
    pub fn target(&self) -> &MasterRef {
        match self {
            DeleteProposal::Clean { target, .. }
            | DeleteProposal::NeedsConfirmation { target, .. }
            | DeleteProposal::Blocked { target, .. } => target,
        }
    }
}

/// Classifies a request to delete `target`.
///
/// `protected_username` names the account that can never be deleted.
pub fn propose_delete(
    dataset: &Dataset,
    target: MasterRef,
    protected_username: &str,
) -> Result<DeleteProposal, IntegrityError> {
    let kind = target.kind();
    let id = target.id().to_owned();
    let exists = match kind {
        MasterKind::Machine => dataset.machine(&id).is_some(),
        MasterKind::Worker => dataset.worker(&id).is_some(),
        MasterKind::InputItem => dataset.input_item(&id).is_some(),
        MasterKind::OutputItem => dataset.output_item(&id).is_some(),
        MasterKind::QcItem => dataset.qc_item(&id).is_some(),
        MasterKind::QcSize => dataset.qc_size(&id).is_some(),
        MasterKind::User => dataset.user(&id).is_some(),
    };
    if !exists {
        return Err(IntegrityError::UnknownRecord { kind, id });
    }

    let dependents = count_dependents(dataset, &target);

    let proposal = match kind {
        MasterKind::Machine | MasterKind::Worker | MasterKind::InputItem | MasterKind::OutputItem => {
            if dependents.entries() > 0 {
                DeleteProposal::NeedsConfirmation { target, dependents }
            } else {
                DeleteProposal::Clean { target, dependents }
            }
        }
        MasterKind::QcItem | MasterKind::QcSize => {
            if dependents.qc_entries > 0 {
                DeleteProposal::Blocked {
                    target,
                    reason: BlockReason::HasDependents {
                        count: dependents.qc_entries,
                    },
                }
            } else {
                DeleteProposal::Clean { target, dependents }
            }
        }
        MasterKind::User => {
            let is_protected = dataset.user(&id).is_some_and(|u| u.username == protected_username);
            let is_session = dataset.current_user.as_ref().is_some_and(|u| u.id == id);
            if is_protected {
                DeleteProposal::Blocked {
                    target,
                    reason: BlockReason::ProtectedAccount,
                }
            } else if is_session {
                DeleteProposal::Blocked {
                    target,
                    reason: BlockReason::ActiveSession,
                }
            } else if dependents.entries() > 0 {
                DeleteProposal::Blocked {
                    target,
                    reason: BlockReason::HasDependents {
                        count: dependents.entries(),
                    },
                }
            } else {
                DeleteProposal::Clean { target, dependents }
            }
        }
    };

    Ok(proposal)
}

/// Counts the records tied to `target`.
pub fn count_dependents(dataset: &Dataset, target: &MasterRef) -> Dependents {
    let id = target.id();
    match target {
        MasterRef::Machine(_) => Dependents {
            machine_entries: count(&dataset.machine_logs, |e| e.machine_id == id),
            ..Dependents::default()
        },
        MasterRef::Worker(_) => Dependents {
            machine_entries: count(&dataset.machine_logs, |e| e.worker_id == id),
            attendance_entries: count(&dataset.attendance_logs, |e| e.worker_id == id),
            ..Dependents::default()
        },
        MasterRef::InputItem(_) => Dependents {
            input_entries: count(&dataset.input_logs, |e| e.input_item_id == id),
            ..Dependents::default()
        },
        MasterRef::OutputItem(_) => Dependents {
            output_entries: count(&dataset.output_logs, |e| e.output_item_id == id),
            ..Dependents::default()
        },
        MasterRef::QcItem(_) => Dependents {
            qc_entries: count(&dataset.qc_logs, |e| e.qc_item_id == id),
            qc_sizes: dataset.sizes_of(id).count(),
            ..Dependents::default()
        },
        MasterRef::QcSize(_) => Dependents {
            qc_entries: count(&dataset.qc_logs, |e| e.qc_size_id == id),
            ..Dependents::default()
        },
        MasterRef::User(_) => Dependents {
            machine_entries: count(&dataset.machine_logs, |e| e.base().user_id == id),
            input_entries: count(&dataset.input_logs, |e| e.base().user_id == id),
            output_entries: count(&dataset.output_logs, |e| e.base().user_id == id),
            qc_entries: count(&dataset.qc_logs, |e| e.base().user_id == id),
            attendance_entries: count(&dataset.attendance_logs, |e| e.base().user_id == id),
            qc_sizes: 0,
        },
    }
}

fn count<T>(items: &[T], pred: impl Fn(&T) -> bool) -> usize {
    items.iter().filter(|e| pred(e)).count()
}

/// Removes `target` and everything tied to it, returning what was removed.
///
/// Callers must have obtained a non-blocked proposal first.
pub(crate) fn remove_cascading(dataset: &mut Dataset, target: &MasterRef) -> Dependents {
    let removed = count_dependents(dataset, target);
    let id = target.id();
    match target {
        MasterRef::Machine(_) => {
            dataset.machine_logs.retain(|e| e.machine_id != id);
            dataset.machines.retain(|m| m.id != id);
        }
        MasterRef::Worker(_) => {
            dataset.machine_logs.retain(|e| e.worker_id != id);
            dataset.attendance_logs.retain(|e| e.worker_id != id);
            dataset.workers.retain(|w| w.id != id);
        }
        MasterRef::InputItem(_) => {
            dataset.input_logs.retain(|e| e.input_item_id != id);
            dataset.input_items.retain(|i| i.id != id);
        }
        MasterRef::OutputItem(_) => {
            dataset.output_logs.retain(|e| e.output_item_id != id);
            dataset.output_items.retain(|i| i.id != id);
        }
        MasterRef::QcItem(_) => {
            dataset.qc_sizes.retain(|s| s.qc_item_id != id);
            dataset.qc_items.retain(|i| i.id != id);
        }
        MasterRef::QcSize(_) => {
            dataset.qc_sizes.retain(|s| s.id != id);
        }
        MasterRef::User(_) => {
            dataset.users.retain(|u| u.id != id);
        }
    }
    removed
}
