use std::{
    collections::VecDeque,
    time::{SystemTime, UNIX_EPOCH},
};

use tracing::{debug, info, warn};

use crate::{
    config::StoreConfig,
    core::dataset::{Dataset, ValueChange},
    engine::{
        filter::{self, FilterCriteria},
        integrity::{self, BlockReason, DeleteProposal, Dependents, IntegrityError},
        qc,
        stats::{self, PlantSummary},
    },
    entry::{EntryBase, LogEntry, LogRecord, QcEntry},
    master::{InputItem, Machine, MasterRef, OutputItem, QcItem, QcSize, SavedFilter, SavedReport, User, Worker},
    op::{Op, StoredOp},
    types::{LogKind, MachineStatus, MasterKind, OpSeq, RecordId},
};

/// Refused store operations. None of these leave partial state behind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// A record with this id already exists in the target collection.
    #[error("record {0} already exists")]
    DuplicateId(RecordId),
    /// A referenced master record does not exist.
    #[error("unknown {kind} {id}")]
    UnknownReference {
        /// Referenced collection.
        kind: MasterKind,
        /// Referenced id.
        id: RecordId,
    },
    /// Production can only be logged against an active machine.
    #[error("machine {id} is {status:?}")]
    MachineUnavailable {
        /// Machine id.
        id: RecordId,
        /// Its current status.
        status: MachineStatus,
    },
    /// A QC size does not belong to the QC item it was paired with.
    #[error("qc size {qc_size_id} does not belong to qc item {qc_item_id}")]
    SizeItemMismatch {
        /// Size id.
        qc_size_id: RecordId,
        /// Item id.
        qc_item_id: RecordId,
    },
    /// A numeric field is NaN or infinite.
    #[error("{field} must be a finite number")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
    },
    /// Another account already uses this username.
    #[error("username {0} already exists")]
    UsernameTaken(String),
    /// No account matches the supplied credentials.
    #[error("invalid username or password")]
    InvalidCredentials,
    /// The operation needs a signed-in user.
    #[error("no user is signed in")]
    NotSignedIn,
    /// A QC inspection was submitted without any usable measurement.
    #[error("no measurement entered")]
    NoMeasurements,
    /// The dataset changed since the delete proposal was made.
    #[error("delete proposal no longer matches the dataset")]
    StaleProposal,
    /// The delete target could not be classified.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    /// Undo stack is empty.
    #[error("nothing to undo")]
    NothingToUndo,
    /// Redo stack is empty.
    #[error("nothing to redo")]
    NothingToRedo,
}

/// Result of a single-value correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditOutcome {
    /// The value was written.
    Applied(ValueChange),
    /// The raw value was not a finite number; nothing changed.
    InvalidNumber,
    /// No entry with that id; nothing changed.
    NotFound,
}

/// Caller's answer to a cascading-delete prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Proceed with the cascade.
    Confirmed,
    /// Leave the dataset untouched.
    Declined,
}

/// Result of committing a delete proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The target and `removed` are gone.
    Deleted {
        /// Deleted record.
        target: MasterRef,
        /// Dependents removed in the same transition.
        removed: Dependents,
    },
    /// A cascade was declined; nothing changed.
    Declined {
        /// Record that was kept.
        target: MasterRef,
        /// Dependents that would have been removed.
        dependents: Dependents,
    },
    /// The delete is refused; nothing changed.
    Blocked {
        /// Record that was kept.
        target: MasterRef,
        /// Why.
        reason: BlockReason,
    },
}

/// One measurement typed into a QC inspection form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QcMeasurement {
    /// Size measured against.
    pub qc_size_id: RecordId,
    /// Raw input; blank or unparseable input is skipped.
    pub raw: String,
    /// Optional notes for this measurement.
    pub notes: Option<String>,
}

/// Authoritative owner of the plant [`Dataset`].
///
/// Every mutation runs to completion before returning. Successful dataset
/// mutations push the previous dataset onto the undo stack and append a
/// [`StoredOp`] to the pending audit ops.
#[derive(Debug)]
pub struct PlantStore {
    dataset: Dataset,
    config: StoreConfig,
    undo: VecDeque<Dataset>,
    redo: Vec<Dataset>,
    pending_ops: Vec<StoredOp>,
    next_op_seq: OpSeq,
}

impl Default for PlantStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlantStore {
    /// Empty store with default configuration.
    pub fn new() -> Self {
        Self::from_dataset(Dataset::default())
    }

    /// Store owning `dataset`, default configuration.
    pub fn from_dataset(dataset: Dataset) -> Self {
        Self::with_config(dataset, StoreConfig::default())
    }

    /// Store owning `dataset` with explicit configuration.
    pub fn with_config(dataset: Dataset, config: StoreConfig) -> Self {
        Self {
            dataset,
            config,
            undo: VecDeque::new(),
            redo: Vec::new(),
            pending_ops: Vec::new(),
            next_op_seq: 1,
        }
    }

    /// Continues op numbering after a journal that ends at `seq`.
    pub fn resume_after(&mut self, seq: OpSeq) {
        self.next_op_seq = self.next_op_seq.max(seq.saturating_add(1));
    }

    /// Read access to the whole dataset.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Clone of the whole dataset, for the snapshot gateway.
    pub fn export_dataset(&self) -> Dataset {
        self.dataset.clone()
    }

    /// Active configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Signed-in account.
    pub fn current_user(&self) -> Option<&User> {
        self.dataset.current_user.as_ref()
    }

    // ----- session -----

    /// Exact-match credential check; makes the matching user the session user.
    pub fn sign_in(&mut self, username: &str, password: &str) -> Result<User, StoreError> {
        let user = self
            .dataset
            .find_user(username, password)
            .cloned()
            .ok_or(StoreError::InvalidCredentials)?;
        info!(user = %user.username, "signed in");
        self.dataset.current_user = Some(user.clone());
        self.record(Op::SignIn {
            user_id: user.id.clone(),
        });
        Ok(user)
    }

    /// Clears the session user. Returns false when nobody was signed in.
    pub fn sign_out(&mut self) -> bool {
        if self.dataset.current_user.take().is_none() {
            return false;
        }
        self.record(Op::SignOut);
        true
    }

    /// Base attributes for a new entry authored by the session user.
    pub fn stamp(&self, date: impl Into<String>, time: impl Into<String>) -> Result<EntryBase, StoreError> {
        let user = self.session_user()?;
        Ok(EntryBase::new(user, date, time))
    }

    /// The session user as stored in `users`; a session whose account is gone counts as signed out.
    fn session_user(&self) -> Result<&User, StoreError> {
        let current = self.current_user().ok_or(StoreError::NotSignedIn)?;
        self.dataset.user(&current.id).ok_or(StoreError::NotSignedIn)
    }

    // ----- ledger -----

    /// Prepends `entry` to its collection.
    ///
    /// References are checked and a QC entry's status is re-derived from its size.
    pub fn add_entry(&mut self, entry: impl Into<LogEntry>) -> Result<RecordId, StoreError> {
        let mut entry = entry.into();
        self.validate_entry(&entry)?;
        if let LogEntry::Qc(e) = &mut entry {
            if let Some(size) = self.dataset.qc_size(&e.qc_size_id) {
                e.status = qc::evaluate(e.measured_value, size);
            }
        }

        let kind = entry.kind();
        let id = entry.id().to_string();
        let user_id = entry.base().user_id.clone();
        let prev = self.checkpoint();
        self.dataset.prepend_entry(entry);
        debug!(%kind, %id, "entry added");
        self.commit(prev, Op::AddEntry {
            kind,
            id: id.clone(),
            user_id,
        });
        Ok(id)
    }

    /// Submits one QC entry per size of `qc_item_id` that has a parseable measurement.
    ///
    /// Returns the new ids in size order; the whole inspection is one undo step.
    pub fn record_qc_inspection(
        &mut self,
        qc_item_id: &str,
        date: &str,
        time: &str,
        measurements: &[QcMeasurement],
    ) -> Result<Vec<RecordId>, StoreError> {
        let user = self.session_user()?.clone();
        if self.dataset.qc_item(qc_item_id).is_none() {
            return Err(StoreError::UnknownReference {
                kind: MasterKind::QcItem,
                id: qc_item_id.to_string(),
            });
        }

        let mut entries = Vec::new();
        for size in self.dataset.sizes_of(qc_item_id) {
            let Some(m) = measurements.iter().find(|m| m.qc_size_id == size.id) else {
                continue;
            };
            let Some(value) = qc::parse_measurement(&m.raw) else {
                continue;
            };
            let mut base = EntryBase::new(&user, date, time);
            if let Some(notes) = &m.notes {
                base = base.with_notes(notes.clone());
            }
            entries.push(QcEntry::measured(base, size, value));
        }
        if entries.is_empty() {
            return Err(StoreError::NoMeasurements);
        }

        let prev = self.checkpoint();
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = entry.base.id.clone();
            self.dataset.prepend_entry(entry.into());
            self.record(Op::AddEntry {
                kind: LogKind::Qc,
                id: id.clone(),
                user_id: user.id.clone(),
            });
            ids.push(id);
        }
        self.push_undo(prev);
        debug!(qc_item_id, count = ids.len(), "qc inspection recorded");
        Ok(ids)
    }

    /// Removes an entry. Returns false (and changes nothing) when absent.
    pub fn remove_entry(&mut self, kind: LogKind, id: &str) -> bool {
        if !self.dataset.contains_entry(kind, id) {
            return false;
        }
        let prev = self.checkpoint();
        self.dataset.remove_entry(kind, id);
        debug!(%kind, id, "entry removed");
        self.commit(prev, Op::RemoveEntry {
            kind,
            id: id.to_string(),
        });
        true
    }

    /// Overwrites an entry's value field from raw text.
    ///
    /// QC entries get their status re-judged against the current size; when
    /// the size no longer exists the previous status is kept.
    pub fn edit_value(&mut self, kind: LogKind, id: &str, raw: &str) -> EditOutcome {
        let Some(value) = qc::parse_measurement(raw) else {
            return EditOutcome::InvalidNumber;
        };
        if !self.dataset.contains_entry(kind, id) {
            return EditOutcome::NotFound;
        }

        let prev = self.checkpoint();
        let Some(change) = self.dataset.set_value(kind, id, value) else {
            return EditOutcome::NotFound;
        };
        if kind == LogKind::Qc && !change.status_recomputed {
            warn!(id, "qc size missing, status left as it was");
        }
        debug!(%kind, id, value, "value edited");
        self.commit(prev, Op::EditValue {
            kind,
            id: id.to_string(),
            value,
            prev: change.previous,
            status: change.status.map(|(_, after)| after),
        });
        EditOutcome::Applied(change)
    }

    /// Clones one collection, storage order.
    pub fn entries(&self, kind: LogKind) -> Vec<LogEntry> {
        self.dataset.entries(kind)
    }

    /// Filters one collection; newest first.
    pub fn query(&self, kind: LogKind, criteria: &FilterCriteria) -> Vec<LogEntry> {
        filter::filter(&self.dataset.entries(kind), criteria)
    }

    /// Dashboard figures for the current dataset.
    pub fn summary(&self) -> PlantSummary {
        stats::summarize(&self.dataset)
    }

    // ----- master data -----

    /// Creates or replaces a machine. Returns true when replaced.
    pub fn put_machine(&mut self, machine: Machine) -> bool {
        let target = MasterRef::Machine(machine.id.clone());
        self.put(target, |d| upsert(&mut d.machines, machine, |a, b| a.id == b.id))
    }

    /// Creates or replaces a worker. Returns true when replaced.
    pub fn put_worker(&mut self, worker: Worker) -> bool {
        let target = MasterRef::Worker(worker.id.clone());
        self.put(target, |d| upsert(&mut d.workers, worker, |a, b| a.id == b.id))
    }

    /// Creates or replaces an input item. Returns true when replaced.
    pub fn put_input_item(&mut self, item: InputItem) -> bool {
        let target = MasterRef::InputItem(item.id.clone());
        self.put(target, |d| upsert(&mut d.input_items, item, |a, b| a.id == b.id))
    }

    /// Creates or replaces an output item. Returns true when replaced.
    pub fn put_output_item(&mut self, item: OutputItem) -> bool {
        let target = MasterRef::OutputItem(item.id.clone());
        self.put(target, |d| upsert(&mut d.output_items, item, |a, b| a.id == b.id))
    }

    /// Creates or replaces a QC item. Returns true when replaced.
    pub fn put_qc_item(&mut self, item: QcItem) -> bool {
        let target = MasterRef::QcItem(item.id.clone());
        self.put(target, |d| upsert(&mut d.qc_items, item, |a, b| a.id == b.id))
    }

    /// Creates or replaces a QC size. Returns true when replaced.
    ///
    /// The parent item must exist, and a size already used by QC entries
    /// cannot move to another item.
    pub fn put_qc_size(&mut self, size: QcSize) -> Result<bool, StoreError> {
        if self.dataset.qc_item(&size.qc_item_id).is_none() {
            return Err(StoreError::UnknownReference {
                kind: MasterKind::QcItem,
                id: size.qc_item_id.clone(),
            });
        }
        check_finite("min_val", size.min_val)?;
        check_finite("max_val", size.max_val)?;
        let moved_with_entries = self
            .dataset
            .qc_logs
            .iter()
            .any(|e| e.qc_size_id == size.id && e.qc_item_id != size.qc_item_id);
        if moved_with_entries {
            return Err(StoreError::SizeItemMismatch {
                qc_size_id: size.id,
                qc_item_id: size.qc_item_id,
            });
        }
        let target = MasterRef::QcSize(size.id.clone());
        Ok(self.put(target, |d| upsert(&mut d.qc_sizes, size, |a, b| a.id == b.id)))
    }

    /// Adds an account; usernames are unique.
    pub fn create_user(&mut self, user: User) -> Result<(), StoreError> {
        if self.dataset.user_by_username(&user.username).is_some() {
            return Err(StoreError::UsernameTaken(user.username));
        }
        if self.dataset.user(&user.id).is_some() {
            return Err(StoreError::DuplicateId(user.id));
        }
        info!(username = %user.username, "user created");
        self.put(MasterRef::User(user.id.clone()), |d| upsert(&mut d.users, user, |a, b| a.id == b.id));
        Ok(())
    }

    /// Replaces an existing account, refreshing the session copy when it is the session user.
    pub fn update_user(&mut self, user: User) -> Result<(), StoreError> {
        if self.dataset.user(&user.id).is_none() {
            return Err(StoreError::UnknownReference {
                kind: MasterKind::User,
                id: user.id,
            });
        }
        if self
            .dataset
            .user_by_username(&user.username)
            .is_some_and(|other| other.id != user.id)
        {
            return Err(StoreError::UsernameTaken(user.username));
        }
        self.put(MasterRef::User(user.id.clone()), |d| {
            if d.current_user.as_ref().is_some_and(|u| u.id == user.id) {
                d.current_user = Some(user.clone());
            }
            upsert(&mut d.users, user, |a, b| a.id == b.id)
        });
        Ok(())
    }

    // ----- deletion -----

    /// Classifies a delete request against the current dataset.
    pub fn propose_delete(&self, target: MasterRef) -> Result<DeleteProposal, StoreError> {
        Ok(integrity::propose_delete(
            &self.dataset,
            target,
            &self.config.protected_username,
        )?)
    }

    /// Applies a proposal obtained from [`PlantStore::propose_delete`].
    ///
    /// Clean proposals delete regardless of `confirmation`; blocked proposals
    /// never mutate. A cascade removes the target and all its dependents in
    /// one transition, and only when confirmed.
    pub fn commit_delete(
        &mut self,
        proposal: DeleteProposal,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, StoreError> {
        let current = self.propose_delete(proposal.target().clone())?;
        if current != proposal {
            return Err(StoreError::StaleProposal);
        }

        let target = match proposal {
            DeleteProposal::Blocked { target, reason } => {
                info!(kind = %target.kind(), id = target.id(), ?reason, "delete blocked");
                return Ok(DeleteOutcome::Blocked { target, reason });
            }
            DeleteProposal::NeedsConfirmation { target, dependents } if confirmation == Confirmation::Declined => {
                return Ok(DeleteOutcome::Declined { target, dependents });
            }
            DeleteProposal::Clean { target, .. } | DeleteProposal::NeedsConfirmation { target, .. } => target,
        };

        let prev = self.checkpoint();
        let removed = integrity::remove_cascading(&mut self.dataset, &target);
        info!(
            kind = %target.kind(),
            id = target.id(),
            entries = removed.entries(),
            sizes = removed.qc_sizes,
            "master record deleted"
        );
        self.commit(prev, Op::DeleteMaster {
            target: target.clone(),
            removed,
        });
        Ok(DeleteOutcome::Deleted { target, removed })
    }

    /// Single-call delete: clean deletes go through, cascades ask `confirm`,
    /// blocked requests are reported.
    pub fn request_delete(
        &mut self,
        target: MasterRef,
        confirm: impl FnOnce(&Dependents) -> bool,
    ) -> Result<DeleteOutcome, StoreError> {
        let proposal = self.propose_delete(target)?;
        let confirmation = match &proposal {
            DeleteProposal::NeedsConfirmation { dependents, .. } => {
                if confirm(dependents) {
                    Confirmation::Confirmed
                } else {
                    Confirmation::Declined
                }
            }
            DeleteProposal::Clean { .. } => Confirmation::Confirmed,
            DeleteProposal::Blocked { .. } => Confirmation::Declined,
        };
        self.commit_delete(proposal, confirmation)
    }

    // ----- reports and filters -----

    /// Puts a report at the top of the history.
    pub fn add_report(&mut self, report: SavedReport) -> Result<(), StoreError> {
        if self.dataset.saved_reports.iter().any(|r| r.id == report.id) {
            return Err(StoreError::DuplicateId(report.id));
        }
        let prev = self.checkpoint();
        let id = report.id.clone();
        self.dataset.saved_reports.insert(0, report);
        self.commit(prev, Op::AddReport { id });
        Ok(())
    }

    /// Drops a report from the history. Returns false when absent.
    pub fn remove_report(&mut self, id: &str) -> bool {
        let Some(pos) = self.dataset.saved_reports.iter().position(|r| r.id == id) else {
            return false;
        };
        let prev = self.checkpoint();
        self.dataset.saved_reports.remove(pos);
        self.commit(prev, Op::RemoveReport { id: id.to_string() });
        true
    }

    /// Appends a filter preset.
    pub fn save_filter(&mut self, saved: SavedFilter) -> Result<(), StoreError> {
        if self.dataset.saved_filters.iter().any(|f| f.id == saved.id) {
            return Err(StoreError::DuplicateId(saved.id));
        }
        let prev = self.checkpoint();
        let id = saved.id.clone();
        self.dataset.saved_filters.push(saved);
        self.commit(prev, Op::SaveFilter { id });
        Ok(())
    }

    // ----- undo / redo / journal -----

    /// Restores the dataset as it was before the last mutation.
    ///
    /// The session user is not part of the history: it stays signed in,
    /// refreshed from the restored account, or is signed out when the
    /// restored dataset no longer has that account.
    pub fn undo(&mut self) -> Result<(), StoreError> {
        let restored = self.undo.pop_back().ok_or(StoreError::NothingToUndo)?;
        let current = self.restore(restored);
        self.redo.push(current);
        self.record(Op::Undo);
        Ok(())
    }

    /// Re-applies the last undone mutation.
    pub fn redo(&mut self) -> Result<(), StoreError> {
        let restored = self.redo.pop().ok_or(StoreError::NothingToRedo)?;
        let current = self.restore(restored);
        self.undo.push_back(current);
        self.record(Op::Redo);
        Ok(())
    }

    /// Takes the ops committed since the last drain.
    pub fn drain_pending_ops(&mut self) -> Vec<StoredOp> {
        std::mem::take(&mut self.pending_ops)
    }

    /// Depth of the undo stack.
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Depth of the redo stack.
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Sequence of the most recent op, 0 when none.
    pub fn latest_op_seq(&self) -> OpSeq {
        self.next_op_seq.saturating_sub(1)
    }

    fn validate_entry(&self, entry: &LogEntry) -> Result<(), StoreError> {
        let d = &self.dataset;
        let base = entry.base();
        if d.contains_entry(entry.kind(), &base.id) {
            return Err(StoreError::DuplicateId(base.id.clone()));
        }
        require(d.user(&base.user_id).is_some(), MasterKind::User, &base.user_id)?;

        match entry {
            LogEntry::Machine(e) => {
                check_finite("items_produced", e.items_produced)?;
                let machine = d.machine(&e.machine_id).ok_or_else(|| StoreError::UnknownReference {
                    kind: MasterKind::Machine,
                    id: e.machine_id.clone(),
                })?;
                if machine.status != MachineStatus::Active {
                    return Err(StoreError::MachineUnavailable {
                        id: machine.id.clone(),
                        status: machine.status,
                    });
                }
                require(d.worker(&e.worker_id).is_some(), MasterKind::Worker, &e.worker_id)?;
            }
            LogEntry::Input(e) => {
                check_finite("weight", e.weight)?;
                require(d.input_item(&e.input_item_id).is_some(), MasterKind::InputItem, &e.input_item_id)?;
            }
            LogEntry::Output(e) => {
                check_finite("weight", e.weight)?;
                require(d.output_item(&e.output_item_id).is_some(), MasterKind::OutputItem, &e.output_item_id)?;
            }
            LogEntry::Qc(e) => {
                check_finite("measured_value", e.measured_value)?;
                require(d.qc_item(&e.qc_item_id).is_some(), MasterKind::QcItem, &e.qc_item_id)?;
                let size = d.qc_size(&e.qc_size_id).ok_or_else(|| StoreError::UnknownReference {
                    kind: MasterKind::QcSize,
                    id: e.qc_size_id.clone(),
                })?;
                if size.qc_item_id != e.qc_item_id {
                    return Err(StoreError::SizeItemMismatch {
                        qc_size_id: e.qc_size_id.clone(),
                        qc_item_id: e.qc_item_id.clone(),
                    });
                }
            }
            LogEntry::Attendance(e) => {
                check_finite("hours_worked", e.hours_worked)?;
                require(d.worker(&e.worker_id).is_some(), MasterKind::Worker, &e.worker_id)?;
            }
        }
        Ok(())
    }

    fn put(&mut self, target: MasterRef, apply: impl FnOnce(&mut Dataset) -> bool) -> bool {
        let prev = self.checkpoint();
        let replaced = apply(&mut self.dataset);
        debug!(kind = %target.kind(), id = target.id(), replaced, "master record saved");
        self.commit(prev, Op::PutMaster { target, replaced });
        replaced
    }

    fn restore(&mut self, mut restored: Dataset) -> Dataset {
        restored.current_user = self
            .dataset
            .current_user
            .as_ref()
            .and_then(|u| restored.user(&u.id).cloned());
        if self.dataset.current_user.is_some() && restored.current_user.is_none() {
            info!("session user no longer exists, signed out");
        }
        std::mem::replace(&mut self.dataset, restored)
    }

    fn checkpoint(&self) -> Option<Dataset> {
        (self.config.undo_depth > 0).then(|| self.dataset.clone())
    }

    fn commit(&mut self, prev: Option<Dataset>, op: Op) -> StoredOp {
        self.push_undo(prev);
        self.record(op)
    }

    fn push_undo(&mut self, prev: Option<Dataset>) {
        self.redo.clear();
        let Some(prev) = prev else {
            return;
        };
        self.undo.push_back(prev);
        while self.undo.len() > self.config.undo_depth {
            self.undo.pop_front();
        }
    }

    fn record(&mut self, op: Op) -> StoredOp {
        let seq = self.next_op_seq;
        self.next_op_seq += 1;
        let stored = StoredOp {
            seq,
            ts_ms: now_ms(),
            op,
        };
        self.pending_ops.push(stored.clone());
        stored
    }
}

fn require(found: bool, kind: MasterKind, id: &str) -> Result<(), StoreError> {
    if found {
        Ok(())
    } else {
        Err(StoreError::UnknownReference {
            kind,
            id: id.to_string(),
        })
    }
}

fn check_finite(field: &'static str, v: f64) -> Result<(), StoreError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(StoreError::InvalidValue { field })
    }
}

fn upsert<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T, &T) -> bool) -> bool {
    if let Some(slot) = items.iter_mut().find(|existing| same(existing, &item)) {
        *slot = item;
        true
    } else {
        items.push(item);
        false
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
