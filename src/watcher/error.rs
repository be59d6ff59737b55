//! Watcher error types.

use std::path::PathBuf;

use crate::store::StoreError;

/// Errors that abort ingestion of a single file for one tick.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// File disappeared between discovery and read.
    #[error("Hand-history file deleted: {0}")]
    FileDeleted(PathBuf),

    /// Permission denied accessing file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisting hands or committing the offset failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl WatcherError {
    pub(crate) fn from_open(err: std::io::Error, path: PathBuf) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileDeleted(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_history_file_maps_to_deleted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Aludra II.txt");
        let err = std::fs::File::open(&path).unwrap_err();

        let err = WatcherError::from_open(err, path.clone());
        assert!(matches!(&err, WatcherError::FileDeleted(p) if *p == path));
        assert!(err.to_string().starts_with("Hand-history file deleted: "));
    }

    #[test]
    fn test_denied_open_maps_to_permission_denied() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let err = WatcherError::from_open(denied, PathBuf::from("/hh/table.txt"));
        assert_eq!(err.to_string(), "Permission denied: /hh/table.txt");
    }

    #[test]
    fn test_other_open_errors_stay_io() {
        let busy = std::io::Error::from(std::io::ErrorKind::Interrupted);
        let err = WatcherError::from_open(busy, PathBuf::from("/hh/table.txt"));
        assert!(matches!(err, WatcherError::Io(_)));
    }

    #[test]
    fn test_rejected_offset_commit_surfaces_as_store_error() {
        let err: WatcherError = StoreError::NotRegistered(7).into();
        assert!(matches!(err, WatcherError::Store(StoreError::NotRegistered(7))));
        assert_eq!(err.to_string(), "Store error: File id 7 is not registered");
    }
}
