//! Store error types.

use std::path::PathBuf;

/// Errors that can occur while reading or writing the hand store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Failed to open or create database.
    #[error("Failed to open database at {path}: {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Failed to execute SQL.
    #[error("Database query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// Blocking task was cancelled.
    #[error("Blocking task cancelled")]
    TaskCancelled,

    /// Failed to create parent directory.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An offset commit named a file id the store has never issued.
    #[error("File id {0} is not registered")]
    NotRegistered(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dir_names_the_directory() {
        let err = StoreError::CreateDir {
            path: PathBuf::from("/readonly/hand-tracker"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to create directory /readonly/hand-tracker: "));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_query_wraps_missing_row() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Query(_)));
        assert!(err.to_string().starts_with("Database query failed: "));
    }

    #[test]
    fn test_not_registered_display() {
        assert_eq!(
            StoreError::NotRegistered(42).to_string(),
            "File id 42 is not registered"
        );
    }
}
