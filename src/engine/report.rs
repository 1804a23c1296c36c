//! CSV export of log collections and report-history records.

use chrono::{DateTime, Utc};

use crate::{
    entry::{LogEntry, LogRecord},
    master::SavedReport,
    types::{LogKind, new_record_id},
};

/// Report generation failure.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The selected collection holds no entries.
    #[error("no data available for {0}")]
    NoData(LogKind),
    /// Entries of different kinds were passed to one export.
    #[error("expected {expected} entries, found {found}")]
    MixedKinds {
        /// Kind of the first entry.
        expected: LogKind,
        /// Offending kind.
        found: LogKind,
    },
    /// CSV encoding failed.
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    /// The writer could not be finalised.
    #[error("csv buffer: {0}")]
    Buffer(String),
}

const COMMON: [&str; 7] = ["id", "user_id", "username", "timestamp", "date", "time", "notes"];

/// Module label used in report names.
pub fn section_name(kind: LogKind) -> &'static str {
    match kind {
        LogKind::Machine => "MachineProduction",
        LogKind::Input => "InputMaterials",
        LogKind::Output => "OutputGoods",
        LogKind::Qc => "QualityControl",
        LogKind::Attendance => "WorkerAttendance",
    }
}

/// Column names for one collection.
pub fn header(kind: LogKind) -> Vec<&'static str> {
    let extra: &[&str] = match kind {
        LogKind::Machine => &["machine_id", "worker_id", "detail", "items_produced"],
        LogKind::Input => &["input_item_id", "detail", "weight"],
        LogKind::Output => &["output_item_id", "detail", "weight"],
        LogKind::Qc => &["qc_item_id", "qc_size_id", "measured_value", "status"],
        LogKind::Attendance => &["worker_id", "hours_worked", "work_date"],
    };
    COMMON.iter().chain(extra).copied().collect()
}

fn to_row(entry: &LogEntry) -> Vec<String> {
    let base = entry.base();
    let mut row = vec![
        base.id.clone(),
        base.user_id.clone(),
        base.username.clone(),
        base.timestamp.to_rfc3339(),
        base.date.clone(),
        base.time.clone(),
        base.notes.clone().unwrap_or_default(),
    ];
    match entry {
        LogEntry::Machine(e) => row.extend([
            e.machine_id.clone(),
            e.worker_id.clone(),
            e.detail.clone(),
            e.items_produced.to_string(),
        ]),
        LogEntry::Input(e) => row.extend([e.input_item_id.clone(), e.detail.clone(), e.weight.to_string()]),
        LogEntry::Output(e) => row.extend([e.output_item_id.clone(), e.detail.clone(), e.weight.to_string()]),
        LogEntry::Qc(e) => row.extend([
            e.qc_item_id.clone(),
            e.qc_size_id.clone(),
            e.measured_value.to_string(),
            e.status.to_string(),
        ]),
        LogEntry::Attendance(e) => row.extend([
            e.worker_id.clone(),
            e.hours_worked.to_string(),
            e.work_date.clone(),
        ]),
    }
    row
}

/// Writes a header line plus one row per entry. All entries must share a kind.
pub fn export_csv(kind: LogKind, entries: &[LogEntry]) -> Result<String, ReportError> {
    if entries.is_empty() {
        return Err(ReportError::NoData(kind));
    }
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(header(kind))?;
    for entry in entries {
        if entry.kind() != kind {
            return Err(ReportError::MixedKinds {
                expected: kind,
                found: entry.kind(),
            });
        }
        wtr.write_record(to_row(entry))?;
    }
    let bytes = wtr.into_inner().map_err(|e| ReportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReportError::Buffer(e.to_string()))
}

/// Exports `entries` and wraps the CSV in a report-history record.
///
/// The name follows `<Section>_<YYYYMMDD>_<author>.xlsx`; the CSV is
/// percent-encoded into a `data:` URL.
pub fn build_report(
    kind: LogKind,
    entries: &[LogEntry],
    generated_by: &str,
    filter_summary: &str,
    now: DateTime<Utc>,
) -> Result<SavedReport, ReportError> {
    let csv = export_csv(kind, entries)?;
    let section = section_name(kind);
    Ok(SavedReport {
        id: new_record_id(),
        name: format!("{section}_{}_{}.xlsx", now.format("%Y%m%d"), file_safe(generated_by)),
        generated_by: generated_by.to_string(),
        generated_at: now.to_rfc3339(),
        module: section.to_string(),
        filter_summary: filter_summary.to_string(),
        download_url: format!("data:text/csv;charset=utf-8,{}", urlencoding::encode(&csv)),
    })
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{core::seed::initial_dataset, types::LogKind};

    #[test]
    fn machine_export_has_header_and_rows() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        let data = initial_dataset(now);
        let csv = export_csv(LogKind::Machine, &data.entries(LogKind::Machine)).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,user_id,username,timestamp,date,time,notes,machine_id,worker_id,detail,items_produced"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("p1,u2,operator,"));
        assert!(row.ends_with(",m1,w1,Batch A-100,120"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn empty_collection_is_refused() {
        let err = export_csv(LogKind::Qc, &[]).unwrap_err();
        assert!(matches!(err, ReportError::NoData(LogKind::Qc)));
    }

    #[test]
    fn report_name_uses_section_date_and_author() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        let data = initial_dataset(now);
        let report = build_report(LogKind::Machine, &data.entries(LogKind::Machine), "admin", "All Records", now).unwrap();
        assert_eq!(report.name, "MachineProduction_20240305_admin.xlsx");
        assert_eq!(report.module, "MachineProduction");
        assert!(report.download_url.starts_with("data:text/csv;charset=utf-8,id%2Cuser_id%2C"));
    }

    #[test]
    fn download_url_escapes_payload_and_name_is_file_safe() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        let mut data = initial_dataset(now);
        data.machine_logs[0].detail = "Lot #5 100%".into();
        let report = build_report(LogKind::Machine, &data.entries(LogKind::Machine), "ops team/b", "", now).unwrap();

        let payload = report.download_url.trim_start_matches("data:text/csv;charset=utf-8,");
        assert!(!payload.contains(['\n', '#', ' ']));
        assert!(payload.contains("Lot%20%235%20100%25"));
        assert!(payload.contains("%0A"));
        assert_eq!(urlencoding::decode(payload).unwrap(), export_csv(LogKind::Machine, &data.entries(LogKind::Machine)).unwrap());
        assert_eq!(report.name, "MachineProduction_20240305_ops_team_b.xlsx");
    }
}
