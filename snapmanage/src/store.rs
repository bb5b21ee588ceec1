use crate::error::{Result, SnapshotError};
use crate::types::{Dataset, Snapshot, SnapshotRecord};
use std::collections::HashSet;
use tracing::debug;

/// The ordered, authoritative list of snapshots for one dataset. Records are kept in
/// ascending `sequence` order, and a sequence number is never handed out twice, even
/// after the snapshot which held it has gone.
///
#[derive(Debug)]
pub struct SnapshotStore {
    dataset: Dataset,
    snapshots: Vec<Snapshot>,
    next_sequence: u64,
}

impl SnapshotStore {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            snapshots: Vec::new(),
            next_sequence: 1,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Every snapshot, oldest first. Calling this has no side effects, so it can be
    /// walked as often as you like.
    pub fn list(&self) -> impl Iterator<Item = &Snapshot> + '_ {
        self.snapshots.iter()
    }

    /// Snapshots taken after the one with the given sequence number.
    pub fn after(&self, sequence: u64) -> impl Iterator<Item = &Snapshot> + '_ {
        self.snapshots.iter().filter(move |s| s.sequence > sequence)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snapshots.iter().any(|s| s.name == name)
    }

    pub fn find(&self, name: &str) -> Result<&Snapshot> {
        self.snapshots
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| SnapshotError::NotFound(name.to_string()))
    }

    /// Appends a snapshot, giving it the next sequence number.
    pub fn add(&mut self, record: SnapshotRecord) -> Result<&Snapshot> {
        if self.contains(&record.name) {
            return Err(SnapshotError::DuplicateName {
                dataset: self.dataset.to_string(),
                name: record.name,
            });
        }

        let snapshot = Snapshot {
            name: record.name,
            created_at: record.created_at,
            sequence: self.take_sequence(),
        };

        debug!(
            dataset = %self.dataset,
            name = %snapshot.name,
            sequence = snapshot.sequence,
            "added snapshot"
        );
        self.snapshots.push(snapshot);
        Ok(&self.snapshots[self.snapshots.len() - 1])
    }

    /// Drops every snapshot newer than the one with the given sequence number, and
    /// returns what was dropped.
    pub fn truncate_after(&mut self, sequence: u64) -> Result<Vec<Snapshot>> {
        let position = self
            .snapshots
            .iter()
            .position(|s| s.sequence == sequence)
            .ok_or_else(|| SnapshotError::NotFound(format!("sequence {}", sequence)))?;

        let removed = self.snapshots.split_off(position + 1);
        debug!(dataset = %self.dataset, sequence, removed = removed.len(), "truncated snapshots");
        Ok(removed)
    }

    pub fn remove(&mut self, name: &str) -> Result<Snapshot> {
        let position = self
            .snapshots
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| SnapshotError::NotFound(name.to_string()))?;

        let removed = self.snapshots.remove(position);
        debug!(dataset = %self.dataset, name, sequence = removed.sequence, "removed snapshot");
        Ok(removed)
    }

    /// Rebuilds the store from a backing system enumeration, given oldest first.
    ///
    /// A snapshot we already know keeps its sequence number as long as that keeps the
    /// numbers rising; anything else gets a fresh one. Creation times are taken from the
    /// records. The new contents are only swapped in once complete, so on error the
    /// store is as it was.
    pub fn replace_from(&mut self, records: Vec<SnapshotRecord>) -> Result<()> {
        let mut seen = HashSet::new();
        let mut rebuilt = Vec::with_capacity(records.len());
        let mut next_sequence = self.next_sequence;
        let mut last_sequence = 0;

        for record in records {
            if !seen.insert(record.name.clone()) {
                return Err(SnapshotError::DuplicateName {
                    dataset: self.dataset.to_string(),
                    name: record.name,
                });
            }

            let sequence = match self.find(&record.name) {
                Ok(known) if known.sequence > last_sequence => known.sequence,
                _ => {
                    next_sequence += 1;
                    next_sequence - 1
                }
            };

            last_sequence = sequence;
            rebuilt.push(Snapshot {
                name: record.name,
                created_at: record.created_at,
                sequence,
            });
        }

        debug!(
            dataset = %self.dataset,
            before = self.snapshots.len(),
            after = rebuilt.len(),
            "replaced snapshots"
        );
        self.snapshots = rebuilt;
        self.next_sequence = next_sequence;
        Ok(())
    }

    fn take_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }
}
