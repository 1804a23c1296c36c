//! Async single-writer runtime around [`crate::core::store::PlantStore`].

/// Runtime event types.
pub mod events;
/// Runtime handle and spawn entry point.
pub mod handle;
