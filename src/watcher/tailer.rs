//! Incremental hand-history file tailer.
//!
//! Each tick lists the hand-history directory, reads whatever each recent
//! file gained since its committed offset and persists the complete hands.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::batch::{IngestBatch, ReadContext};
use super::discovery::{list_history_files, HistoryFile};
use super::error::WatcherError;
use crate::store::HandStore;

/// Default look-back window for files considered on a regular tick.
pub const DEFAULT_LOOKBACK_WINDOW: Duration = Duration::from_secs(300);

/// Default idle time after which a carried partial hand is flushed.
pub const DEFAULT_IDLE_FLUSH: Duration = Duration::from_secs(3);

/// Tunables for [`FileTailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailerOptions {
    /// File extension of hand-history files, without the dot.
    pub extension: String,
    pub lookback_window: Duration,
    pub idle_flush: Duration,
    /// Screen name whose hole cards are recorded.
    pub hero: Option<String>,
}

impl Default for TailerOptions {
    fn default() -> Self {
        Self {
            extension: "txt".to_string(),
            lookback_window: DEFAULT_LOOKBACK_WINDOW,
            idle_flush: DEFAULT_IDLE_FLUSH,
            hero: None,
        }
    }
}

/// Totals for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub files_scanned: usize,
    pub hands_persisted: usize,
    pub duplicates: usize,
    pub malformed_hands: usize,
    pub malformed_lines: usize,
    pub anomalies: usize,
    pub files_failed: usize,
}

impl TickReport {
    fn absorb(&mut self, other: &Self) {
        self.hands_persisted += other.hands_persisted;
        self.duplicates += other.duplicates;
        self.malformed_hands += other.malformed_hands;
        self.malformed_lines += other.malformed_lines;
        self.anomalies += other.anomalies;
    }
}

/// Bytes of an unfinished hand kept between ticks.
///
/// `start` always equals the committed offset of the file, so losing the
/// cache only costs a re-read.
#[derive(Debug)]
struct Carry {
    start: u64,
    bytes: Vec<u8>,
    since: Instant,
}

/// Polls a hand-history directory and ingests file growth.
pub struct FileTailer {
    dir: PathBuf,
    store: Arc<dyn HandStore>,
    options: TailerOptions,
    carries: HashMap<PathBuf, Carry>,
    bootstrapped: bool,
}

impl std::fmt::Debug for FileTailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTailer")
            .field("dir", &self.dir)
            .field("options", &self.options)
            .field("carried_files", &self.carries.len())
            .field("bootstrapped", &self.bootstrapped)
            .finish_non_exhaustive()
    }
}

impl FileTailer {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, store: Arc<dyn HandStore>, options: TailerOptions) -> Self {
        Self {
            dir: dir.into(),
            store,
            options,
            carries: HashMap::new(),
            bootstrapped: false,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of partial-hand bytes held in memory for `path`.
    #[must_use]
    pub fn carried_bytes(&self, path: &Path) -> usize {
        self.carries.get(path).map_or(0, |c| c.bytes.len())
    }

    /// Run one pass over the directory.
    ///
    /// The first tick considers every file; later ticks only files modified
    /// within the look-back window, newest first. A failing file is logged
    /// and skipped, its offset left untouched.
    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        let files = match list_history_files(&self.dir, &self.options.extension) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "Cannot list hand histories");
                return report;
            }
        };

        let bootstrap = !self.bootstrapped;
        let now = SystemTime::now();
        for file in files {
            if !bootstrap && !file.modified_within(now, self.options.lookback_window) {
                // Sorted newest first: everything after is older still.
                break;
            }
            report.files_scanned += 1;

            match self.ingest_file(&file).await {
                Ok(outcome) => report.absorb(&outcome),
                Err(e) => {
                    tracing::warn!(path = %file.path.display(), error = %e, "Failed to ingest file");
                    report.files_failed += 1;
                }
            }
        }
        self.bootstrapped = true;

        if report.hands_persisted > 0 {
            tracing::info!(
                files = report.files_scanned,
                hands = report.hands_persisted,
                duplicates = report.duplicates,
                malformed = report.malformed_hands,
                "Imported hands"
            );
        }
        report
    }

    /// Tick every `poll` until `cancel` fires.
    ///
    /// Ticks never overlap: a slow tick delays the next one.
    pub async fn watch(&mut self, poll: Duration, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(poll);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::info!(dir = %self.dir.display(), "Stopped watching hand histories");
                    return;
                }
                _ = interval.tick() => {
                    let report = self.tick().await;
                    tracing::debug!(?report, "Tick finished");
                }
            }
        }
    }

    async fn ingest_file(&mut self, file: &HistoryFile) -> Result<TickReport, WatcherError> {
        let path = file.path.as_path();
        let (file_id, mut offset) = match self.store.get_file_offset(path).await? {
            Some(state) => (state.file_id, state.offset),
            None => {
                let id = self
                    .store
                    .register_file(path, file.mtime_secs(), file.size)
                    .await?;
                (id, 0)
            }
        };

        if file.size < offset {
            tracing::warn!(
                path = %path.display(),
                old_offset = offset,
                new_len = file.size,
                "File truncated, resetting offset to 0"
            );
            offset = 0;
            self.carries.remove(path);
        }

        if self.carries.get(path).is_some_and(|c| c.start != offset) {
            self.carries.remove(path);
        }
        let cached = self.carries.get(path).map_or(0, |c| c.bytes.len() as u64);
        let read_end = offset + cached;

        let hero = self.options.hero.as_deref();
        let mut ctx = ReadContext {
            path,
            file_id,
            base: offset,
            mtime: file.mtime_secs(),
            size: file.size,
            hero,
        };

        let batch = if file.size > read_end {
            let fresh = read_range(path, read_end, file.size).await?;
            let mut buffer = self
                .carries
                .get(path)
                .map(|c| c.bytes.clone())
                .unwrap_or_default();
            buffer.extend_from_slice(&fresh);
            ctx.size = read_end + fresh.len() as u64;
            IngestBatch::prepare(&ctx, &buffer)
        } else {
            let idle = self
                .carries
                .get(path)
                .is_some_and(|c| c.since.elapsed() >= self.options.idle_flush);
            if !idle {
                return Ok(TickReport::default());
            }
            let carry = self
                .carries
                .get(path)
                .map(|c| c.bytes.clone())
                .unwrap_or_default();
            tracing::debug!(path = %path.display(), offset, "Flushing idle partial hand");
            IngestBatch::flush(&ctx, &carry)
        };

        let outcome = batch.apply(self.store.as_ref()).await?;

        if batch.carry.is_empty() {
            self.carries.remove(path);
        } else {
            let since = match self.carries.get(path) {
                Some(c) if c.bytes == batch.carry => c.since,
                _ => Instant::now(),
            };
            self.carries.insert(
                path.to_path_buf(),
                Carry {
                    start: batch.commit.offset,
                    bytes: batch.carry.clone(),
                    since,
                },
            );
        }

        if outcome.persisted > 0 || batch.malformed_hands > 0 {
            tracing::debug!(
                path = %path.display(),
                offset = batch.commit.offset,
                persisted = outcome.persisted,
                duplicates = outcome.duplicates,
                "Ingested file growth"
            );
        }

        Ok(TickReport {
            hands_persisted: outcome.persisted,
            duplicates: outcome.duplicates,
            malformed_hands: batch.malformed_hands,
            malformed_lines: batch.malformed_lines,
            anomalies: batch.anomalies,
            ..TickReport::default()
        })
    }
}

/// Read bytes `[start, end)`, or fewer if the file shrank meanwhile.
async fn read_range(path: &Path, start: u64, end: u64) -> Result<Vec<u8>, WatcherError> {
    let mut file = File::open(path)
        .await
        .map_err(|e| WatcherError::from_open(e, path.to_path_buf()))?;
    file.seek(std::io::SeekFrom::Start(start)).await?;

    let mut buf = Vec::new();
    file.take(end.saturating_sub(start)).read_to_end(&mut buf).await?;
    Ok(buf)
}
