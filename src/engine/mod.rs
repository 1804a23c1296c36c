//! Pure domain rules over the dataset.

/// Log-entry filtering and presets.
pub mod filter;
/// Referential integrity and delete classification.
pub mod integrity;
/// QC range evaluation and measurement parsing.
pub mod qc;
/// CSV export and report-history records.
pub mod report;
/// Dashboard aggregates.
pub mod stats;
