//! Log entry records, the [`LogEntry`] sum type, and the [`LogRecord`] accessor trait.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    engine::qc,
    master::{QcSize, User},
    types::{LogKind, QcStatus, RecordId, new_record_id},
};

/// Attributes shared by every log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryBase {
    /// Stable id.
    pub id: RecordId,
    /// Author account id.
    pub user_id: RecordId,
    /// Author username at capture time; never re-derived.
    pub username: String,
    /// Capture instant.
    pub timestamp: DateTime<Utc>,
    /// Business date, `YYYY-MM-DD`.
    pub date: String,
    /// Business time, zero-padded 24-hour `HH:mm`.
    pub time: String,
    /// Optional free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl EntryBase {
    /// Builds a base with a fresh id, the current instant, and a snapshot of `user`.
    pub fn new(user: &User, date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            user_id: user.id.clone(),
            username: user.username.clone(),
            timestamp: Utc::now(),
            date: date.into(),
            time: time.into(),
            notes: None,
        }
    }

    /// Sets notes, treating blank text as absent.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        self.notes = if notes.trim().is_empty() { None } else { Some(notes) };
        self
    }
}

/// Machine production record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineEntry {
    /// Shared attributes.
    #[serde(flatten)]
    pub base: EntryBase,
    /// Producing machine.
    pub machine_id: RecordId,
    /// Operating worker.
    pub worker_id: RecordId,
    /// Batch number or other detail.
    pub detail: String,
    /// Quantity produced.
    pub items_produced: f64,
}

/// Raw material input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEntry {
    /// Shared attributes.
    #[serde(flatten)]
    pub base: EntryBase,
    /// Consumed material.
    pub input_item_id: RecordId,
    /// Source or other detail.
    pub detail: String,
    /// Weight consumed.
    pub weight: f64,
}

/// Finished output record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEntry {
    /// Shared attributes.
    #[serde(flatten)]
    pub base: EntryBase,
    /// Produced item.
    pub output_item_id: RecordId,
    /// Destination or other detail.
    pub detail: String,
    /// Weight produced.
    pub weight: f64,
}

/// QC measurement record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcEntry {
    /// Shared attributes.
    #[serde(flatten)]
    pub base: EntryBase,
    /// Inspection category.
    pub qc_item_id: RecordId,
    /// Acceptance range measured against.
    pub qc_size_id: RecordId,
    /// Measured value.
    pub measured_value: f64,
    /// Verdict for `measured_value` against the size at last write.
    pub status: QcStatus,
}

impl QcEntry {
    /// Builds an entry for `size` with its status already evaluated.
    pub fn measured(base: EntryBase, size: &QcSize, measured_value: f64) -> Self {
        Self {
            base,
            qc_item_id: size.qc_item_id.clone(),
            qc_size_id: size.id.clone(),
            measured_value,
            status: qc::evaluate(measured_value, size),
        }
    }
}

/// Worker attendance record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    /// Shared attributes; `date` mirrors `work_date`.
    #[serde(flatten)]
    pub base: EntryBase,
    /// Attending worker.
    pub worker_id: RecordId,
    /// Hours worked on `work_date`.
    pub hours_worked: f64,
    /// Day worked, `YYYY-MM-DD`.
    pub work_date: String,
}

impl AttendanceEntry {
    /// Builds an entry whose business date is the day worked.
    pub fn new(mut base: EntryBase, worker_id: impl Into<RecordId>, work_date: impl Into<String>, hours_worked: f64) -> Self {
        let work_date = work_date.into();
        base.date = work_date.clone();
        Self {
            base,
            worker_id: worker_id.into(),
            hours_worked,
            work_date,
        }
    }
}

/// Read access shared by all log entry shapes.
pub trait LogRecord {
    /// Collection this entry belongs to.
    fn kind(&self) -> LogKind;
    /// Shared attributes.
    fn base(&self) -> &EntryBase;
    /// The entry's single numeric value field.
    fn value(&self) -> f64;
    /// Free-text detail, if the shape has one.
    fn detail(&self) -> Option<&str> {
        None
    }
    /// Referenced machine, if any.
    fn machine_id(&self) -> Option<&str> {
        None
    }
    /// Referenced worker, if any.
    fn worker_id(&self) -> Option<&str> {
        None
    }

    /// Lowercased `detail notes id machine_id worker_id`, missing fields empty.
    fn keyword_haystack(&self) -> String {
        let base = self.base();
        format!(
            "{} {} {} {} {}",
            self.detail().unwrap_or(""),
            base.notes.as_deref().unwrap_or(""),
            base.id,
            self.machine_id().unwrap_or(""),
            self.worker_id().unwrap_or(""),
        )
        .to_lowercase()
    }
}

/// Write access to the single editable value field.
pub(crate) trait ValueField: LogRecord {
    fn set_value(&mut self, value: f64);
}

impl LogRecord for MachineEntry {
    fn kind(&self) -> LogKind {
        LogKind::Machine
    }
    fn base(&self) -> &EntryBase {
        &self.base
    }
    fn value(&self) -> f64 {
        self.items_produced
    }
    fn detail(&self) -> Option<&str> {
        Some(&self.detail)
    }
    fn machine_id(&self) -> Option<&str> {
        Some(&self.machine_id)
    }
    fn worker_id(&self) -> Option<&str> {
        Some(&self.worker_id)
    }
}

impl ValueField for MachineEntry {
    fn set_value(&mut self, value: f64) {
        self.items_produced = value;
    }
}

impl LogRecord for InputEntry {
    fn kind(&self) -> LogKind {
        LogKind::Input
    }
    fn base(&self) -> &EntryBase {
        &self.base
    }
    fn value(&self) -> f64 {
        self.weight
    }
    fn detail(&self) -> Option<&str> {
        Some(&self.detail)
    }
}

impl ValueField for InputEntry {
    fn set_value(&mut self, value: f64) {
        self.weight = value;
    }
}

impl LogRecord for OutputEntry {
    fn kind(&self) -> LogKind {
        LogKind::Output
    }
    fn base(&self) -> &EntryBase {
        &self.base
    }
    fn value(&self) -> f64 {
        self.weight
    }
    fn detail(&self) -> Option<&str> {
        Some(&self.detail)
    }
}

impl ValueField for OutputEntry {
    fn set_value(&mut self, value: f64) {
        self.weight = value;
    }
}

impl LogRecord for QcEntry {
    fn kind(&self) -> LogKind {
        LogKind::Qc
    }
    fn base(&self) -> &EntryBase {
        &self.base
    }
    fn value(&self) -> f64 {
        self.measured_value
    }
}

impl ValueField for QcEntry {
    fn set_value(&mut self, value: f64) {
        self.measured_value = value;
    }
}

impl LogRecord for AttendanceEntry {
    fn kind(&self) -> LogKind {
        LogKind::Attendance
    }
    fn base(&self) -> &EntryBase {
        &self.base
    }
    fn value(&self) -> f64 {
        self.hours_worked
    }
    fn worker_id(&self) -> Option<&str> {
        Some(&self.worker_id)
    }
}

impl ValueField for AttendanceEntry {
    fn set_value(&mut self, value: f64) {
        self.hours_worked = value;
    }
}

/// Any log entry, tagged by collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LogEntry {
    /// Machine production.
    Machine(MachineEntry),
    /// Material input.
    Input(InputEntry),
    /// Finished output.
    Output(OutputEntry),
    /// QC measurement.
    Qc(QcEntry),
    /// Attendance.
    Attendance(AttendanceEntry),
}

impl LogEntry {
    fn as_record(&self) -> &dyn LogRecord {
        match self {
            LogEntry::Machine(e) => e,
            LogEntry::Input(e) => e,
            LogEntry::Output(e) => e,
            LogEntry::Qc(e) => e,
            LogEntry::Attendance(e) => e,
        }
    }

    /// Entry id.
    pub fn id(&self) -> &str {
        &self.base().id
    }
}

impl LogRecord for LogEntry {
    fn kind(&self) -> LogKind {
        self.as_record().kind()
    }
    fn base(&self) -> &EntryBase {
        self.as_record().base()
    }
    fn value(&self) -> f64 {
        self.as_record().value()
    }
    fn detail(&self) -> Option<&str> {
        self.as_record().detail()
    }
    fn machine_id(&self) -> Option<&str> {
        self.as_record().machine_id()
    }
    fn worker_id(&self) -> Option<&str> {
        self.as_record().worker_id()
    }
}

impl From<MachineEntry> for LogEntry {
    fn from(value: MachineEntry) -> Self {
        Self::Machine(value)
    }
}

impl From<InputEntry> for LogEntry {
    fn from(value: InputEntry) -> Self {
        Self::Input(value)
    }
}

impl From<OutputEntry> for LogEntry {
    fn from(value: OutputEntry) -> Self {
        Self::Output(value)
    }
}

impl From<QcEntry> for LogEntry {
    fn from(value: QcEntry) -> Self {
        Self::Qc(value)
    }
}

impl From<AttendanceEntry> for LogEntry {
    fn from(value: AttendanceEntry) -> Self {
        Self::Attendance(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn operator() -> User {
        User {
            id: "u2".into(),
            username: "operator".into(),
            full_name: "Line Operator".into(),
            role: Role::User,
            password: "user".into(),
        }
    }

    #[test]
    fn keyword_haystack_joins_optional_fields() {
        let mut base = EntryBase::new(&operator(), "2024-06-01", "08:00").with_notes("Night SHIFT");
        base.id = "p1".into();
        let entry = MachineEntry {
            base,
            machine_id: "m1".into(),
            worker_id: "w1".into(),
            detail: "Batch A-100".into(),
            items_produced: 120.0,
        };
        assert_eq!(entry.keyword_haystack(), "batch a-100 night shift p1 m1 w1");

        let mut base = EntryBase::new(&operator(), "2024-06-01", "08:00");
        base.id = "q1".into();
        let size = QcSize {
            id: "sz1".into(),
            qc_item_id: "qc1".into(),
            name: "Small".into(),
            min_val: 1.0,
            max_val: 2.0,
        };
        let qc = QcEntry::measured(base, &size, 1.5);
        assert_eq!(qc.keyword_haystack(), "  q1  ");
    }

    #[test]
    fn attendance_date_follows_work_date() {
        let base = EntryBase::new(&operator(), "2024-06-03", "17:00");
        let entry = AttendanceEntry::new(base, "w1", "2024-06-01", 7.5);
        assert_eq!(entry.base.date, "2024-06-01");
        assert_eq!(LogEntry::from(entry).value(), 7.5);
    }

    #[test]
    fn blank_notes_are_absent() {
        let base = EntryBase::new(&operator(), "2024-06-01", "08:00").with_notes("  ");
        assert_eq!(base.notes, None);
    }
}
