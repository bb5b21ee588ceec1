use std::error::Error as StdError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Everything that can go wrong managing the snapshots of a dataset.
///
/// `DuplicateName`, `InvalidName` and `InvalidDataset` are always raised before the
/// backing system is touched. `NotFound` is raised by store lookups.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot '{name}' already exists on {dataset}")]
    DuplicateName { dataset: String, name: String },

    #[error("no snapshot '{0}'")]
    NotFound(String),

    #[error("invalid snapshot name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("invalid dataset '{dataset}': {reason}")]
    InvalidDataset { dataset: String, reason: String },

    #[error("{operation} failed on the backing system")]
    Backing {
        operation: &'static str,
        #[source]
        source: BackingError,
    },
}

/// A failure reported by a backing system adapter.
///
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BackingError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl BackingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io;

    #[test]
    fn test_backing_error_keeps_source() {
        let err = SnapshotError::Backing {
            operation: "create",
            source: BackingError::with_source(
                "zfs snapshot rpool@a",
                io::Error::new(io::ErrorKind::NotFound, "no zfs"),
            ),
        };

        assert_eq!("create failed on the backing system", err.to_string());

        let backing = err.source().unwrap();
        assert_eq!("zfs snapshot rpool@a", backing.to_string());
        assert_eq!("no zfs", backing.source().unwrap().to_string());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            "snapshot 'a' already exists on rpool",
            SnapshotError::DuplicateName {
                dataset: "rpool".to_string(),
                name: "a".to_string()
            }
            .to_string()
        );
        assert_eq!(
            "no snapshot 'missing'",
            SnapshotError::NotFound("missing".to_string()).to_string()
        );
        assert!(BackingError::new("dataset is busy").source().is_none());
    }
}
