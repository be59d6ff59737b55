//! Splits a byte buffer into hand blocks.

use std::ops::Range;

/// Literal that opens every hand.
pub const HAND_START_MARKER: &[u8] = b"PokerStars Hand #";

/// UTF-8 byte-order mark some clients write at the start of a file.
pub const BOM: &[u8] = b"\xEF\xBB\xBF";

const SUMMARY_MARKER: &[u8] = b"*** SUMMARY ***";

/// Result of splitting a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Complete hands, in file order.
    pub hands: Vec<Range<usize>>,
    /// Unterminated tail to prepend to the next read. Empty when nothing is pending.
    pub carry: Range<usize>,
}

impl Split {
    /// Bytes that no longer need to be read again: everything before the carry.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.carry.start
    }
}

/// Length of the byte-order mark to skip for a read starting at `offset`.
///
/// Only a read from the very start of the file can carry one.
#[must_use]
pub fn bom_len(buf: &[u8], offset: u64) -> usize {
    if offset == 0 && buf.starts_with(BOM) {
        BOM.len()
    } else {
        0
    }
}

/// Offsets of every line that begins with the hand-start marker.
fn hand_starts(buf: &[u8]) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut line_start = 0;
    while line_start < buf.len() {
        if buf[line_start..].starts_with(HAND_START_MARKER) {
            starts.push(line_start);
        }
        match buf[line_start..].iter().position(|&b| b == b'\n') {
            Some(nl) => line_start += nl + 1,
            None => break,
        }
    }
    starts
}

/// A trailing hand is finished once its summary is followed by a blank line.
fn is_terminated(block: &[u8]) -> bool {
    let has_summary = block
        .windows(SUMMARY_MARKER.len())
        .any(|w| w == SUMMARY_MARKER);
    has_summary && (block.ends_with(b"\n\n") || block.ends_with(b"\n\r\n"))
}

/// Split `buf` into hand ranges.
///
/// Each line starting with [`HAND_START_MARKER`] opens a range that closes at
/// the next marker. The last range is only returned as a hand when it is
/// terminated; otherwise it becomes the carry. Bytes before the first marker
/// are dropped. A buffer without any marker is carried whole unless it is
/// only whitespace.
#[must_use]
pub fn split_hands(buf: &[u8]) -> Split {
    let starts = hand_starts(buf);

    let Some(&last) = starts.last() else {
        let carry = if buf.iter().all(u8::is_ascii_whitespace) {
            buf.len()..buf.len()
        } else {
            0..buf.len()
        };
        return Split {
            hands: Vec::new(),
            carry,
        };
    };

    let mut hands: Vec<Range<usize>> = starts.windows(2).map(|w| w[0]..w[1]).collect();

    let carry = if is_terminated(&buf[last..]) {
        hands.push(last..buf.len());
        buf.len()..buf.len()
    } else {
        last..buf.len()
    };

    Split { hands, carry }
}
