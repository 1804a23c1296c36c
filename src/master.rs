//! Master-data records, saved reports and saved filters.

use serde::{Deserialize, Serialize};

use crate::types::{MachineStatus, MasterKind, RecordId, Role};

/// Production machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    /// Stable id.
    pub id: RecordId,
    /// Display name, e.g. `CNC-01`.
    pub name: String,
    /// Free-form machine type.
    #[serde(rename = "type")]
    pub machine_type: String,
    /// Operational state.
    pub status: MachineStatus,
}

/// Shop-floor worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    /// Stable id.
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Job role.
    pub role: String,
}

/// Raw material consumed by production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputItem {
    /// Stable id.
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Unit of measure.
    pub unit: String,
}

/// Finished goods or scrap produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputItem {
    /// Stable id.
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Unit of measure.
    pub unit: String,
}

/// QC inspection category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QcItem {
    /// Stable id.
    pub id: RecordId,
    /// Display name.
    pub name: String,
}

/// Inclusive acceptance range scoped to one [`QcItem`].
///
/// `min_val <= max_val` is assumed by the evaluator but not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcSize {
    /// Stable id.
    pub id: RecordId,
    /// Owning QC item.
    pub qc_item_id: RecordId,
    /// Display name, e.g. `Small Gear (10mm)`.
    pub name: String,
    /// Lower bound, inclusive.
    pub min_val: f64,
    /// Upper bound, inclusive.
    pub max_val: f64,
}

/// Login account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable id.
    pub id: RecordId,
    /// Unique login name.
    pub username: String,
    /// Display name.
    pub full_name: String,
    /// Access role.
    pub role: Role,
    /// Plaintext password; the credential check is intentionally minimal.
    pub password: String,
}

impl User {
    /// Returns true for administrator accounts.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Exported report kept in the report history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedReport {
    /// Stable id.
    pub id: RecordId,
    /// File name shown to the user.
    pub name: String,
    /// Username of the generating account.
    pub generated_by: String,
    /// Generation instant, RFC 3339.
    pub generated_at: String,
    /// Section name of the exported log collection.
    pub module: String,
    /// Human summary of the filter used.
    pub filter_summary: String,
    /// Download location or inline data URI.
    pub download_url: String,
}

/// Named filter preset; `criteria` is opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFilter {
    /// Stable id.
    pub id: RecordId,
    /// Preset name.
    pub name: String,
    /// Caller-defined filter payload.
    pub criteria: serde_json::Value,
}

/// Typed reference to one master record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum MasterRef {
    /// A [`Machine`].
    Machine(RecordId),
    /// A [`Worker`].
    Worker(RecordId),
    /// An [`InputItem`].
    InputItem(RecordId),
    /// An [`OutputItem`].
    OutputItem(RecordId),
    /// A [`QcItem`].
    QcItem(RecordId),
    /// A [`QcSize`].
    QcSize(RecordId),
    /// A [`User`].
    User(RecordId),
}

impl MasterRef {
    /// Collection the referenced record lives in.
    pub fn kind(&self) -> MasterKind {
        match self {
            MasterRef::Machine(_) => MasterKind::Machine,
            MasterRef::Worker(_) => MasterKind::Worker,
            MasterRef::InputItem(_) => MasterKind::InputItem,
            MasterRef::OutputItem(_) => MasterKind::OutputItem,
            MasterRef::QcItem(_) => MasterKind::QcItem,
            MasterRef::QcSize(_) => MasterKind::QcSize,
            MasterRef::User(_) => MasterKind::User,
        }
    }

    /// Referenced id.
    pub fn id(&self) -> &str {
        match self {
            MasterRef::Machine(id)
            | MasterRef::Worker(id)
            | MasterRef::InputItem(id)
            | MasterRef::OutputItem(id)
            | MasterRef::QcItem(id)
            | MasterRef::QcSize(id)
            | MasterRef::User(id) => id,
        }
    }
}
