use crate::backing::BackingSystem;
use crate::error::{BackingError, Result, SnapshotError};
use crate::store::SnapshotStore;
use crate::types::{validate_snapshot_name, Dataset, Snapshot, SnapshotRecord};
use time::OffsetDateTime;
use tracing::{info, warn};

/// What a rollback to `target` destroys: every snapshot taken after it, plus any
/// changes made to the live dataset since.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollbackPlan {
    pub dataset: Dataset,
    pub target: Snapshot,
    pub doomed: Vec<Snapshot>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// Nothing was done. Call again with confirmation to carry out the plan.
    Planned(RollbackPlan),
    Executed(RollbackPlan),
}

impl RollbackOutcome {
    pub fn plan(&self) -> &RollbackPlan {
        match self {
            Self::Planned(plan) | Self::Executed(plan) => plan,
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed(_))
    }
}

/// Creates, lists, destroys and rolls back the snapshots of one dataset, keeping the
/// store in step with the backing system.
///
/// The store only ever changes after the backing system has confirmed a change, so a
/// failed backing call leaves it exactly as it was. It may still be stale if something
/// else has touched the dataset: `reconcile()` is the way back to the truth.
///
/// Mutating operations take `&mut self`. Share one instance between threads by wrapping
/// it in a `Mutex`; separate datasets need no common lock.
#[derive(Debug)]
pub struct SnapshotOperations<B> {
    store: SnapshotStore,
    backing: B,
}

impl<B: BackingSystem> SnapshotOperations<B> {
    pub fn new(store: SnapshotStore, backing: B) -> Self {
        Self { store, backing }
    }

    pub fn dataset(&self) -> &Dataset {
        self.store.dataset()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn backing(&self) -> &B {
        &self.backing
    }

    /// Known snapshots, oldest first. Does not consult the backing system.
    pub fn list(&self) -> impl Iterator<Item = &Snapshot> + '_ {
        self.store.list()
    }

    pub fn create(&mut self, name: &str) -> Result<&Snapshot> {
        validate_snapshot_name(name)?;

        if self.store.contains(name) {
            return Err(SnapshotError::DuplicateName {
                dataset: self.dataset().to_string(),
                name: name.to_string(),
            });
        }

        self.backing
            .create_snapshot(self.store.dataset(), name)
            .map_err(|e| backing_failure("create", self.store.dataset(), name, e))?;

        let created_at = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        info!(dataset = %self.store.dataset(), name, "created snapshot");
        self.store.add(SnapshotRecord::new(name, created_at))
    }

    /// Works out what rolling back to `name` would destroy. Changes nothing.
    pub fn plan_rollback(&self, name: &str) -> Result<RollbackPlan> {
        let target = self.store.find(name)?;

        Ok(RollbackPlan {
            dataset: self.dataset().clone(),
            target: target.clone(),
            doomed: self.store.after(target.sequence).cloned().collect(),
        })
    }

    /// Without `confirm` this is `plan_rollback()`. With it, the dataset is rolled back
    /// and every later snapshot is dropped from the store. There is no undo.
    pub fn rollback(&mut self, name: &str, confirm: bool) -> Result<RollbackOutcome> {
        let plan = self.plan_rollback(name)?;

        if !confirm {
            return Ok(RollbackOutcome::Planned(plan));
        }

        self.backing
            .rollback_to(&plan.dataset, name)
            .map_err(|e| backing_failure("rollback", &plan.dataset, name, e))?;

        self.store.truncate_after(plan.target.sequence)?;
        info!(
            dataset = %plan.dataset,
            name,
            destroyed = plan.doomed.len(),
            "rolled back"
        );

        Ok(RollbackOutcome::Executed(plan))
    }

    pub fn destroy(&mut self, name: &str) -> Result<Snapshot> {
        self.store.find(name)?;

        self.backing
            .destroy_snapshot(self.store.dataset(), name)
            .map_err(|e| backing_failure("destroy", self.store.dataset(), name, e))?;

        info!(dataset = %self.store.dataset(), name, "destroyed snapshot");
        self.store.remove(name)
    }

    /// Rebuilds the store from the backing system's own list of snapshots, returning how
    /// many there are. Safe to repeat.
    pub fn reconcile(&mut self) -> Result<usize> {
        let records = self
            .backing
            .enumerate(self.store.dataset())
            .map_err(|e| backing_failure("reconcile", self.store.dataset(), "", e))?;

        self.store.replace_from(records)?;
        info!(dataset = %self.store.dataset(), snapshots = self.store.len(), "reconciled");
        Ok(self.store.len())
    }
}

fn backing_failure(
    operation: &'static str,
    dataset: &Dataset,
    name: &str,
    source: BackingError,
) -> SnapshotError {
    warn!(%dataset, name, error = %source, "{} failed", operation);
    SnapshotError::Backing { operation, source }
}
