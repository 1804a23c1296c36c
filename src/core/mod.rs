//! In-memory aggregate, authoritative store, and seed data.

/// Aggregate root and typed ledger primitives.
pub mod dataset;
/// Default dataset for a first run.
pub mod seed;
/// Authoritative plant store with undo/redo and audit journal.
pub mod store;
