//! Hand-history file discovery.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::error::WatcherError;

/// A candidate file with the metadata seen when it was listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryFile {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size: u64,
}

impl HistoryFile {
    /// Modification time as whole seconds since the epoch.
    #[must_use]
    pub fn mtime_secs(&self) -> i64 {
        self.modified
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
    }

    /// Whether the file was modified within `window` of `now`.
    ///
    /// Modification times in the future count as recent.
    #[must_use]
    pub fn modified_within(&self, now: SystemTime, window: Duration) -> bool {
        now.duration_since(self.modified)
            .map_or(true, |age| age <= window)
    }
}

/// List regular files in `dir` with the given extension, newest first.
///
/// Entries whose metadata cannot be read are skipped.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn list_history_files(dir: &Path, extension: &str) -> Result<Vec<HistoryFile>, WatcherError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| WatcherError::from_open(e, dir.to_path_buf()))?;

    let mut files: Vec<HistoryFile> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            Some(HistoryFile {
                path: entry.path(),
                modified: metadata.modified().ok()?,
                size: metadata.len(),
            })
        })
        .collect();

    files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}
