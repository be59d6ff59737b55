//! One file's growth increment, prepared before anything is persisted.

use std::path::Path;

use crate::hand::assign_positions;
use crate::parser::{bom_len, parse_hand, split_hands, ParseError};
use crate::stats::AnalyzedHand;
use crate::store::{BatchOutcome, HandStore, OffsetCommit, StoreError};

/// Hands parsed from a read together with the offset to commit after them.
///
/// Building a batch touches no durable state; [`IngestBatch::apply`] is the
/// only step that writes, and it commits the offset last.
#[derive(Debug, Clone)]
pub struct IngestBatch {
    pub file_id: i64,
    pub hands: Vec<AnalyzedHand>,
    /// Blocks discarded because their header did not parse.
    pub malformed_hands: usize,
    pub malformed_lines: usize,
    pub anomalies: usize,
    pub commit: OffsetCommit,
    /// Trailing bytes of an unfinished hand, starting at `commit.offset`.
    pub carry: Vec<u8>,
}

/// Where a buffer sits in its file.
#[derive(Debug, Clone, Copy)]
pub struct ReadContext<'a> {
    pub path: &'a Path,
    pub file_id: i64,
    /// File offset of the first byte of the buffer.
    pub base: u64,
    pub mtime: i64,
    pub size: u64,
    pub hero: Option<&'a str>,
}

fn offset_after(base: u64, len: usize) -> u64 {
    base + u64::try_from(len).unwrap_or(u64::MAX)
}

impl IngestBatch {
    fn empty(ctx: &ReadContext<'_>, offset: u64) -> Self {
        Self {
            file_id: ctx.file_id,
            hands: Vec::new(),
            malformed_hands: 0,
            malformed_lines: 0,
            anomalies: 0,
            commit: OffsetCommit {
                offset,
                mtime: ctx.mtime,
                size: ctx.size,
            },
            carry: Vec::new(),
        }
    }

    /// Split `buffer` into complete hands and a carried remainder.
    #[must_use]
    pub fn prepare(ctx: &ReadContext<'_>, buffer: &[u8]) -> Self {
        let skip = bom_len(buffer, ctx.base);
        let body = &buffer[skip..];
        let split = split_hands(body);

        let mut batch = Self::empty(ctx, offset_after(ctx.base, skip + split.consumed()));
        for range in split.hands {
            let offset = offset_after(ctx.base, skip + range.start);
            batch.analyze(ctx, offset, &body[range]);
        }
        batch.carry = body[split.carry].to_vec();
        batch
    }

    /// Treat an idle carried remainder as the file's final hand.
    #[must_use]
    pub fn flush(ctx: &ReadContext<'_>, carry: &[u8]) -> Self {
        let mut batch = Self::empty(ctx, offset_after(ctx.base, carry.len()));
        if !carry.iter().all(u8::is_ascii_whitespace) {
            batch.analyze(ctx, ctx.base, carry);
        }
        batch
    }

    fn analyze(&mut self, ctx: &ReadContext<'_>, offset: u64, block: &[u8]) {
        let parsed = match parse_hand(block, ctx.hero) {
            Ok(parsed) => parsed,
            Err(ParseError::EmptyBlock) => return,
            Err(e) => {
                tracing::warn!(
                    path = %ctx.path.display(),
                    offset,
                    error = %e,
                    "Discarding hand with malformed header"
                );
                self.malformed_hands += 1;
                return;
            }
        };

        let mut record = parsed.record;
        if let Err(e) = assign_positions(&mut record) {
            tracing::warn!(
                path = %ctx.path.display(),
                hand_id = %record.hand_id,
                error = %e,
                "Position labels omitted for hand"
            );
        }

        let hand = AnalyzedHand::new(record);
        self.malformed_lines += parsed.malformed_lines;
        self.anomalies += hand.stats.anomalies;
        self.hands.push(hand);
    }

    /// Persist every hand, then commit the offset.
    ///
    /// # Errors
    ///
    /// Returns the store error; the offset is then left where it was.
    pub async fn apply(&self, store: &dyn HandStore) -> Result<BatchOutcome, StoreError> {
        store.apply_batch(self.file_id, &self.hands, self.commit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::BOM;

    const HAND: &str = "PokerStars Hand #1:  Hold'em No Limit ($0.01/$0.02 USD) - 2024/11/20 19:33:05 CET\n\
Table 'Aludra' 6-max Seat #1 is the button\n\
Seat 1: alice ($2 in chips)\n\
Seat 2: bob ($2 in chips)\n\
alice: posts small blind $0.01\n\
bob: posts big blind $0.02\n\
*** HOLE CARDS ***\n\
alice: folds\n\
Uncalled bet ($0.01) returned to bob\n\
bob collected $0.02 from pot\n\
*** SUMMARY ***\n\
Total pot $0.02 | Rake $0\n\
Seat 1: alice (button) (small blind) folded before Flop\n\
Seat 2: bob (big blind) collected ($0.02)\n\
\n\
\n";

    fn ctx(base: u64) -> ReadContext<'static> {
        ReadContext {
            path: Path::new("/hh/table.txt"),
            file_id: 1,
            base,
            mtime: 0,
            size: 0,
            hero: None,
        }
    }

    #[test]
    fn test_prepare_complete_hands() {
        let buffer = format!("{HAND}{}", HAND.replace("#1:", "#2:"));
        let batch = IngestBatch::prepare(&ctx(0), buffer.as_bytes());

        assert_eq!(batch.hands.len(), 2);
        assert!(batch.carry.is_empty());
        assert_eq!(batch.commit.offset, buffer.len() as u64);
        let bob = batch.hands[0].stats.get("bob").unwrap();
        assert_eq!(bob.counters.won_hand, 1);
    }

    #[test]
    fn test_prepare_carries_partial_hand() {
        let partial = &HAND[..HAND.len() / 2];
        let buffer = format!("{HAND}{partial}");
        let batch = IngestBatch::prepare(&ctx(100), buffer.as_bytes());

        assert_eq!(batch.hands.len(), 1);
        assert_eq!(batch.carry, partial.as_bytes());
        assert_eq!(batch.commit.offset, 100 + HAND.len() as u64);
    }

    #[test]
    fn test_bom_only_stripped_at_file_start() {
        let mut buffer = BOM.to_vec();
        buffer.extend_from_slice(HAND.as_bytes());

        let batch = IngestBatch::prepare(&ctx(0), &buffer);
        assert_eq!(batch.hands.len(), 1);
        assert_eq!(batch.commit.offset, buffer.len() as u64);
    }

    #[test]
    fn test_malformed_header_counted() {
        let broken = HAND.replace("Table 'Aludra' 6-max", "Table");
        let batch = IngestBatch::prepare(&ctx(0), broken.as_bytes());
        assert!(batch.hands.is_empty());
        assert_eq!(batch.malformed_hands, 1);
        assert_eq!(batch.commit.offset, broken.len() as u64);
    }

    #[test]
    fn test_unresolved_button_still_analyzed() {
        let block = HAND.replace("Seat #1 is the button", "Seat #5 is the button");
        let batch = IngestBatch::prepare(&ctx(0), block.as_bytes());
        assert_eq!(batch.hands.len(), 1);
        let alice = batch.hands[0].stats.get("alice").unwrap();
        assert_eq!(alice.key.position, None);
        assert_eq!(alice.counters.hands, 1);
    }

    #[test]
    fn test_flush_parses_carry() {
        let unterminated = HAND.trim_end();
        let batch = IngestBatch::flush(&ctx(40), unterminated.as_bytes());
        assert_eq!(batch.hands.len(), 1);
        assert!(batch.carry.is_empty());
        assert_eq!(batch.commit.offset, 40 + unterminated.len() as u64);
    }

    #[test]
    fn test_flush_whitespace_only() {
        let batch = IngestBatch::flush(&ctx(10), b"\r\n\r\n");
        assert!(batch.hands.is_empty());
        assert_eq!(batch.malformed_hands, 0);
        assert_eq!(batch.commit.offset, 14);
    }
}
