//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::default_database_path;
use crate::watcher::TailerOptions;

/// Tracker configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Directory the poker client writes hand histories into.
    pub hand_history_dir: PathBuf,
    pub database_path: PathBuf,
    /// Screen name whose dealt cards are recorded.
    pub hero: Option<String>,
    pub file_extension: String,
    pub poll_interval_ms: u64,
    /// Files not modified within this window are skipped after the first pass.
    pub lookback_window_secs: u64,
    /// Idle time before a trailing partial hand is imported as final.
    pub idle_flush_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            hand_history_dir: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
            database_path: default_database_path(),
            hero: None,
            file_extension: "txt".to_string(),
            poll_interval_ms: 1000,
            lookback_window_secs: 300,
            idle_flush_secs: 3,
        }
    }
}

impl TrackerConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Tailer settings derived from this configuration.
    #[must_use]
    pub fn tailer_options(&self) -> TailerOptions {
        TailerOptions {
            extension: self.file_extension.trim_start_matches('.').to_string(),
            lookback_window: Duration::from_secs(self.lookback_window_secs),
            idle_flush: Duration::from_secs(self.idle_flush_secs),
            hero: self.hero.clone(),
        }
    }
}
