use crate::error::SnapshotError;
use std::fmt;
use time::OffsetDateTime;

/// Longest snapshot name the backing system will accept.
pub const MAX_NAME_LEN: usize = 255;

/// A hierarchical storage namespace, e.g. `pool/fs`. Immutable once built.
///
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dataset(String);

impl Dataset {
    pub fn new(name: &str) -> Result<Self, SnapshotError> {
        let invalid = |reason: &str| SnapshotError::InvalidDataset {
            dataset: name.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("dataset name is empty"));
        }

        if let Some(c) = name.chars().find(|c| matches!(c, '@' | '#' | '\0')) {
            return Err(invalid(&format!("'{}' is not allowed", c.escape_default())));
        }

        if name.split('/').any(str::is_empty) {
            return Err(invalid("empty path component"));
        }

        Ok(Self(name.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// The full name the backing system knows a snapshot of this dataset by.
    pub fn snapshot_path(&self, snapname: &str) -> String {
        format!("{}@{}", self.0, snapname)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point-in-time, read-only state of a dataset. Never mutated after creation.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub name: String,
    pub created_at: OffsetDateTime,
    pub sequence: u64,
}

/// A snapshot as the backing system reports it, before it has been given a sequence.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub name: String,
    pub created_at: OffsetDateTime,
}

impl SnapshotRecord {
    pub fn new(name: &str, created_at: OffsetDateTime) -> Self {
        Self {
            name: name.to_string(),
            created_at,
        }
    }
}

/// Checks a snapshot name against the backing system's naming rules. This is purely
/// syntactic: whether the name is already taken is the store's business.
///
pub fn validate_snapshot_name(name: &str) -> Result<(), SnapshotError> {
    let invalid = |reason: String| SnapshotError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("snapshot name is empty".to_string()));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(invalid(format!("longer than {} bytes", MAX_NAME_LEN)));
    }

    match name.chars().find(|c| matches!(c, '/' | '\0' | '@' | '#')) {
        Some(c) => Err(invalid(format!("'{}' is not allowed", c.escape_default()))),
        None => Ok(()),
    }
}
