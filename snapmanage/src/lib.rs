//! Snapshot lifecycle management for a single copy-on-write dataset: creating,
//! listing, destroying and rolling back snapshots, with an in-memory store kept in step
//! with whatever storage system does the real work.
//!
pub mod backing;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod operations;
pub mod store;
pub mod types;

pub use backing::BackingSystem;
pub use error::{BackingError, Result, SnapshotError};
pub use operations::{RollbackOutcome, RollbackPlan, SnapshotOperations};
pub use store::SnapshotStore;
pub use types::{Dataset, Snapshot, SnapshotRecord};
