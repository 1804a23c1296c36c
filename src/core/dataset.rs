//! The aggregate root holding every collection, plus typed ledger primitives.

use serde::{Deserialize, Serialize};

use crate::{
    engine::qc,
    entry::{AttendanceEntry, InputEntry, LogEntry, LogRecord, MachineEntry, OutputEntry, QcEntry, ValueField},
    master::{InputItem, Machine, OutputItem, QcItem, QcSize, SavedFilter, SavedReport, User, Worker},
    types::{LogKind, QcStatus},
};

/// Whole plant dataset: session user, master data, logs, reports and filters.
///
/// Log collections are stored most-recent-first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    /// Signed-in account, if any.
    pub current_user: Option<User>,
    /// Login accounts.
    pub users: Vec<User>,
    /// Machines.
    pub machines: Vec<Machine>,
    /// Workers.
    pub workers: Vec<Worker>,
    /// Raw material items.
    pub input_items: Vec<InputItem>,
    /// Output items.
    pub output_items: Vec<OutputItem>,
    /// QC categories.
    pub qc_items: Vec<QcItem>,
    /// QC acceptance ranges.
    pub qc_sizes: Vec<QcSize>,
    /// Production log.
    pub machine_logs: Vec<MachineEntry>,
    /// Material input log.
    pub input_logs: Vec<InputEntry>,
    /// Output log.
    pub output_logs: Vec<OutputEntry>,
    /// QC log.
    pub qc_logs: Vec<QcEntry>,
    /// Attendance log.
    pub attendance_logs: Vec<AttendanceEntry>,
    /// Report history, newest first.
    pub saved_reports: Vec<SavedReport>,
    /// Filter presets in creation order.
    pub saved_filters: Vec<SavedFilter>,
}

/// Result of overwriting an entry's value field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueChange {
    /// Value before the edit.
    pub previous: f64,
    /// Value after the edit.
    pub value: f64,
    /// QC status before and after; `None` for non-QC kinds.
    pub status: Option<(QcStatus, QcStatus)>,
    /// False when a QC entry's size was missing and its status was kept.
    pub status_recomputed: bool,
}

impl Dataset {
    /// Clones the entries of one collection into [`LogEntry`] values, storage order.
    pub fn entries(&self, kind: LogKind) -> Vec<LogEntry> {
        match kind {
            LogKind::Machine => wrap(&self.machine_logs),
            LogKind::Input => wrap(&self.input_logs),
            LogKind::Output => wrap(&self.output_logs),
            LogKind::Qc => wrap(&self.qc_logs),
            LogKind::Attendance => wrap(&self.attendance_logs),
        }
    }

    /// Number of entries in one collection.
    pub fn entry_count(&self, kind: LogKind) -> usize {
        match kind {
            LogKind::Machine => self.machine_logs.len(),
            LogKind::Input => self.input_logs.len(),
            LogKind::Output => self.output_logs.len(),
            LogKind::Qc => self.qc_logs.len(),
            LogKind::Attendance => self.attendance_logs.len(),
        }
    }

    /// Clones one entry by id.
    pub fn entry(&self, kind: LogKind, id: &str) -> Option<LogEntry> {
        match kind {
            LogKind::Machine => find_entry(&self.machine_logs, id).cloned().map(Into::into),
            LogKind::Input => find_entry(&self.input_logs, id).cloned().map(Into::into),
            LogKind::Output => find_entry(&self.output_logs, id).cloned().map(Into::into),
            LogKind::Qc => find_entry(&self.qc_logs, id).cloned().map(Into::into),
            LogKind::Attendance => find_entry(&self.attendance_logs, id).cloned().map(Into::into),
        }
    }

    /// Returns true when the collection holds an entry with `id`.
    pub fn contains_entry(&self, kind: LogKind, id: &str) -> bool {
        match kind {
            LogKind::Machine => find_entry(&self.machine_logs, id).is_some(),
            LogKind::Input => find_entry(&self.input_logs, id).is_some(),
            LogKind::Output => find_entry(&self.output_logs, id).is_some(),
            LogKind::Qc => find_entry(&self.qc_logs, id).is_some(),
            LogKind::Attendance => find_entry(&self.attendance_logs, id).is_some(),
        }
    }

    /// Puts `entry` at the front of its collection.
    pub(crate) fn prepend_entry(&mut self, entry: LogEntry) {
        match entry {
            LogEntry::Machine(e) => self.machine_logs.insert(0, e),
            LogEntry::Input(e) => self.input_logs.insert(0, e),
            LogEntry::Output(e) => self.output_logs.insert(0, e),
            LogEntry::Qc(e) => self.qc_logs.insert(0, e),
            LogEntry::Attendance(e) => self.attendance_logs.insert(0, e),
        }
    }

    /// Removes an entry by id, returning it.
    pub(crate) fn remove_entry(&mut self, kind: LogKind, id: &str) -> Option<LogEntry> {
        match kind {
            LogKind::Machine => remove_by_id(&mut self.machine_logs, id).map(Into::into),
            LogKind::Input => remove_by_id(&mut self.input_logs, id).map(Into::into),
            LogKind::Output => remove_by_id(&mut self.output_logs, id).map(Into::into),
            LogKind::Qc => remove_by_id(&mut self.qc_logs, id).map(Into::into),
            LogKind::Attendance => remove_by_id(&mut self.attendance_logs, id).map(Into::into),
        }
    }

    /// Overwrites the value field of one entry; QC entries are re-judged.
    ///
    /// Returns `None` when no entry has `id`.
    pub(crate) fn set_value(&mut self, kind: LogKind, id: &str, value: f64) -> Option<ValueChange> {
        let plain = |previous: f64| ValueChange {
            previous,
            value,
            status: None,
            status_recomputed: false,
        };
        match kind {
            LogKind::Machine => set_in(&mut self.machine_logs, id, value).map(plain),
            LogKind::Input => set_in(&mut self.input_logs, id, value).map(plain),
            LogKind::Output => set_in(&mut self.output_logs, id, value).map(plain),
            LogKind::Attendance => set_in(&mut self.attendance_logs, id, value).map(plain),
            LogKind::Qc => {
                let entry = self.qc_logs.iter_mut().find(|e| e.base.id == id)?;
                let previous = entry.measured_value;
                let before = entry.status;
                entry.set_value(value);
                let size = self.qc_sizes.iter().find(|s| s.id == entry.qc_size_id);
                if let Some(size) = size {
                    entry.status = qc::evaluate(value, size);
                }
                Some(ValueChange {
                    previous,
                    value,
                    status: Some((before, entry.status)),
                    status_recomputed: size.is_some(),
                })
            }
        }
    }

    /// Looks up a machine.
    pub fn machine(&self, id: &str) -> Option<&Machine> {
        self.machines.iter().find(|m| m.id == id)
    }

    /// Looks up a worker.
    pub fn worker(&self, id: &str) -> Option<&Worker> {
        self.workers.iter().find(|w| w.id == id)
    }

    /// Looks up an input item.
    pub fn input_item(&self, id: &str) -> Option<&InputItem> {
        self.input_items.iter().find(|i| i.id == id)
    }

    /// Looks up an output item.
    pub fn output_item(&self, id: &str) -> Option<&OutputItem> {
        self.output_items.iter().find(|i| i.id == id)
    }

    /// Looks up a QC item.
    pub fn qc_item(&self, id: &str) -> Option<&QcItem> {
        self.qc_items.iter().find(|i| i.id == id)
    }

    /// Looks up a QC size.
    pub fn qc_size(&self, id: &str) -> Option<&QcSize> {
        self.qc_sizes.iter().find(|s| s.id == id)
    }

    /// QC sizes belonging to one item, in storage order.
    pub fn sizes_of(&self, qc_item_id: &str) -> impl Iterator<Item = &QcSize> {
        self.qc_sizes.iter().filter(move |s| s.qc_item_id == qc_item_id)
    }

    /// Looks up a user by id.
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Looks up a user by exact username.
    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    /// Exact-match credential lookup; no hashing.
    pub fn find_user(&self, username: &str, password: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.username == username && u.password == password)
    }
}

fn wrap<T: Clone + Into<LogEntry>>(logs: &[T]) -> Vec<LogEntry> {
    logs.iter().cloned().map(Into::into).collect()
}

fn find_entry<'a, T: LogRecord>(logs: &'a [T], id: &str) -> Option<&'a T> {
    logs.iter().find(|e| e.base().id == id)
}

fn remove_by_id<T: LogRecord>(logs: &mut Vec<T>, id: &str) -> Option<T> {
    let pos = logs.iter().position(|e| e.base().id == id)?;
    Some(logs.remove(pos))
}

fn set_in<T: ValueField>(logs: &mut [T], id: &str, value: f64) -> Option<f64> {
    let entry = logs.iter_mut().find(|e| e.base().id == id)?;
    let previous = entry.value();
    entry.set_value(value);
    Some(previous)
}
