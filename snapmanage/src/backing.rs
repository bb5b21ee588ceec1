use crate::error::BackingError;
use crate::types::{Dataset, SnapshotRecord};

/// The snapshot primitives of the underlying storage system. Nothing in this crate
/// implements it for real storage; the binary supplies a ZFS implementation and tests
/// supply doubles.
///
/// Timeouts and retries, if any, are the implementation's business.
pub trait BackingSystem {
    /// Take snapshot `name` of `dataset`.
    fn create_snapshot(&self, dataset: &Dataset, name: &str) -> Result<(), BackingError>;

    /// Revert `dataset` to snapshot `name`, destroying every later snapshot.
    fn rollback_to(&self, dataset: &Dataset, name: &str) -> Result<(), BackingError>;

    /// Destroy snapshot `name` of `dataset`.
    fn destroy_snapshot(&self, dataset: &Dataset, name: &str) -> Result<(), BackingError>;

    /// Every snapshot of `dataset`, oldest first.
    fn enumerate(&self, dataset: &Dataset) -> Result<Vec<SnapshotRecord>, BackingError>;
}

impl<B: BackingSystem + ?Sized> BackingSystem for &B {
    fn create_snapshot(&self, dataset: &Dataset, name: &str) -> Result<(), BackingError> {
        (**self).create_snapshot(dataset, name)
    }

    fn rollback_to(&self, dataset: &Dataset, name: &str) -> Result<(), BackingError> {
        (**self).rollback_to(dataset, name)
    }

    fn destroy_snapshot(&self, dataset: &Dataset, name: &str) -> Result<(), BackingError> {
        (**self).destroy_snapshot(dataset, name)
    }

    fn enumerate(&self, dataset: &Dataset) -> Result<Vec<SnapshotRecord>, BackingError> {
        (**self).enumerate(dataset)
    }
}
