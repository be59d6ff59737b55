//! Per-hand player statistics.
//!
//! [`compute_stats`] walks a hand's actions once and produces one
//! [`PlayerStats`] per dealt-in player, keyed by the playing context.

mod engine;
mod types;

pub use engine::{compute_stats, HandStats};
pub use types::{stack_bucket, PlayerStats, StatCounters, StatsKey};

use crate::hand::HandRecord;

/// A hand together with the counters it contributes.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedHand {
    pub record: HandRecord,
    pub stats: HandStats,
}

impl AnalyzedHand {
    /// Compute the counters for a hand whose positions are already assigned.
    #[must_use]
    pub fn new(record: HandRecord) -> Self {
        let stats = compute_stats(&record);
        Self { record, stats }
    }
}
