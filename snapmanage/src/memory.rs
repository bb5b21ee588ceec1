//! An in-memory backing system, for exercising the operations without real storage.
//!
use crate::backing::BackingSystem;
use crate::error::BackingError;
use crate::types::{Dataset, SnapshotRecord};
use std::cell::RefCell;
use std::collections::HashMap;
use time::{Duration, OffsetDateTime};

#[derive(Debug, Default)]
struct State {
    datasets: HashMap<String, Vec<SnapshotRecord>>,
    calls: Vec<String>,
    fail_next: Option<String>,
    ticks: i64,
}

/// Behaves like a well-mannered ZFS: names are unique per dataset, rollback discards
/// everything newer than the target, and every snapshot is one second younger than the
/// last. Failures can be queued up with `fail_next()`.
///
#[derive(Debug, Default)]
pub struct MemoryBacking {
    state: RefCell<State>,
}

impl MemoryBacking {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next call, whatever it is, fails with this message.
    pub fn fail_next(&self, message: &str) {
        self.state.borrow_mut().fail_next = Some(message.to_string());
    }

    /// Every call made so far, as `verb dataset@name`.
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn snapshots(&self, dataset: &str) -> Vec<String> {
        self.state
            .borrow()
            .datasets
            .get(dataset)
            .map(|list| list.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Takes a snapshot behind the back of anything holding a store, as another process
    /// would.
    pub fn insert_external(&self, dataset: &str, name: &str) {
        let mut state = self.state.borrow_mut();
        let created_at = state.tick();
        state
            .datasets
            .entry(dataset.to_string())
            .or_default()
            .push(SnapshotRecord::new(name, created_at));
    }

    fn call(&self, verb: &str, dataset: &Dataset, name: &str) -> Result<(), BackingError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("{} {}", verb, dataset.snapshot_path(name)));

        match state.fail_next.take() {
            Some(message) => Err(BackingError::new(message)),
            None => Ok(()),
        }
    }
}

impl State {
    fn tick(&mut self) -> OffsetDateTime {
        self.ticks += 1;
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(self.ticks)
    }
}

impl BackingSystem for MemoryBacking {
    fn create_snapshot(&self, dataset: &Dataset, name: &str) -> Result<(), BackingError> {
        self.call("snapshot", dataset, name)?;
        let mut state = self.state.borrow_mut();
        let created_at = state.tick();
        let list = state.datasets.entry(dataset.to_string()).or_default();

        if list.iter().any(|r| r.name == name) {
            return Err(BackingError::new(format!(
                "{} already exists",
                dataset.snapshot_path(name)
            )));
        }

        list.push(SnapshotRecord::new(name, created_at));
        Ok(())
    }

    fn rollback_to(&self, dataset: &Dataset, name: &str) -> Result<(), BackingError> {
        self.call("rollback", dataset, name)?;
        let mut state = self.state.borrow_mut();
        let list = state.datasets.entry(dataset.to_string()).or_default();

        match list.iter().position(|r| r.name == name) {
            Some(position) => {
                list.truncate(position + 1);
                Ok(())
            }
            None => Err(BackingError::new(format!(
                "{} does not exist",
                dataset.snapshot_path(name)
            ))),
        }
    }

    fn destroy_snapshot(&self, dataset: &Dataset, name: &str) -> Result<(), BackingError> {
        self.call("destroy", dataset, name)?;
        let mut state = self.state.borrow_mut();
        let list = state.datasets.entry(dataset.to_string()).or_default();

        match list.iter().position(|r| r.name == name) {
            Some(position) => {
                list.remove(position);
                Ok(())
            }
            None => Err(BackingError::new(format!(
                "{} does not exist",
                dataset.snapshot_path(name)
            ))),
        }
    }

    fn enumerate(&self, dataset: &Dataset) -> Result<Vec<SnapshotRecord>, BackingError> {
        self.call("list", dataset, "")?;
        Ok(self
            .state
            .borrow()
            .datasets
            .get(dataset.name())
            .cloned()
            .unwrap_or_default())
    }
}
