//! Shared primitive IDs and plant-wide enums.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Opaque identifier carried by every master record and log entry.
pub type RecordId = String;
/// Monotonic operation sequence number.
pub type OpSeq = u64;

/// Generates a fresh opaque record id.
pub fn new_record_id() -> RecordId {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Operational state of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    /// Available for production logging.
    #[default]
    Active,
    /// Down for maintenance.
    Maintenance,
    /// Switched off or decommissioned.
    Offline,
}

/// Access role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Maintains master data and reports.
    Admin,
    /// Operator capturing logs.
    User,
}

/// QC verdict for a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QcStatus {
    /// Measurement inside the size's acceptance range.
    Correct,
    /// Measurement outside the acceptance range.
    Wrong,
}

impl fmt::Display for QcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QcStatus::Correct => "CORRECT",
            QcStatus::Wrong => "WRONG",
        })
    }
}

/// Tag for the five log collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Machine production log.
    Machine,
    /// Raw material input log.
    Input,
    /// Finished output log.
    Output,
    /// Quality-control measurement log.
    Qc,
    /// Worker attendance log.
    Attendance,
}

impl LogKind {
    /// All kinds in dashboard order.
    pub const ALL: [LogKind; 5] = [
        LogKind::Machine,
        LogKind::Input,
        LogKind::Output,
        LogKind::Qc,
        LogKind::Attendance,
    ];

    /// Stable lowercase tag.
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Machine => "machine",
            LogKind::Input => "input",
            LogKind::Output => "output",
            LogKind::Qc => "qc",
            LogKind::Attendance => "attendance",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown kind tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for LogKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The capture views tag their kind as "<kind>_entry".
        let tag = s.strip_suffix("_entry").unwrap_or(s);
        LogKind::ALL
            .into_iter()
            .find(|k| k.as_str() == tag)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Tag for master-data collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasterKind {
    /// Production machines.
    Machine,
    /// Shop-floor workers.
    Worker,
    /// Raw material items.
    InputItem,
    /// Finished goods items.
    OutputItem,
    /// QC inspection categories.
    QcItem,
    /// QC acceptance ranges.
    QcSize,
    /// Login accounts.
    User,
}

impl fmt::Display for MasterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MasterKind::Machine => "machine",
            MasterKind::Worker => "worker",
            MasterKind::InputItem => "input item",
            MasterKind::OutputItem => "output item",
            MasterKind::QcItem => "qc item",
            MasterKind::QcSize => "qc size",
            MasterKind::User => "user",
        };
        f.write_str(s)
    }
}
