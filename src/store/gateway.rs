//! Persistence gateway used by the file tailer.

use std::path::Path;

use async_trait::async_trait;

use super::error::StoreError;
use crate::stats::{AnalyzedHand, PlayerStats};

/// Read progress recorded for a hand-history file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileState {
    pub file_id: i64,
    /// Byte offset up to which every complete hand has been persisted.
    pub offset: u64,
    /// Modification time (seconds since the epoch) seen at that commit.
    pub mtime: i64,
    pub size: u64,
}

/// Offset to commit once a batch of hands has been persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetCommit {
    pub offset: u64,
    pub mtime: i64,
    pub size: u64,
}

/// What applying a batch did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub persisted: usize,
    pub duplicates: usize,
}

/// Durable storage for hands, file offsets and the statistics accumulator.
#[async_trait]
pub trait HandStore: Send + Sync {
    /// Create or update the entry for `path` and return its id.
    async fn register_file(&self, path: &Path, mtime: i64, size: u64) -> Result<i64, StoreError>;

    /// Committed progress for `path`, or `None` if it was never registered.
    async fn get_file_offset(&self, path: &Path) -> Result<Option<FileState>, StoreError>;

    async fn commit_file_offset(
        &self,
        file_id: i64,
        commit: OffsetCommit,
    ) -> Result<(), StoreError>;

    /// Store a hand and merge its counters.
    ///
    /// Returns `false` without writing anything when the hand id is already
    /// stored.
    async fn persist_hand(&self, file_id: i64, hand: &AnalyzedHand) -> Result<bool, StoreError>;

    /// Create-or-get a player by screen name.
    async fn resolve_player_id(&self, name: &str) -> Result<i64, StoreError>;

    async fn count_hands(&self) -> Result<u64, StoreError>;

    /// Accumulated rows for one player, one per playing context.
    async fn player_stats(&self, name: &str) -> Result<Vec<PlayerStats>, StoreError>;

    /// Persist every hand of a growth increment, then commit its offset.
    ///
    /// The offset is only committed after every hand succeeded. Stores that
    /// can do so should override this to run as a single transaction.
    async fn apply_batch(
        &self,
        file_id: i64,
        hands: &[AnalyzedHand],
        commit: OffsetCommit,
    ) -> Result<BatchOutcome, StoreError> {
        let mut outcome = BatchOutcome::default();
        for hand in hands {
            if self.persist_hand(file_id, hand).await? {
                outcome.persisted += 1;
            } else {
                outcome.duplicates += 1;
            }
        }
        self.commit_file_offset(file_id, commit).await?;
        Ok(outcome)
    }
}
