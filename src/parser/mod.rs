//! Hand-history parsing.
//!
//! Turns raw bytes into [`HandRecord`]s: the splitter finds hand boundaries,
//! the header parser reads session metadata and the body parser walks the
//! remaining lines.

mod body;
mod error;
mod grammar;
mod header;
mod splitter;

use std::collections::HashSet;

pub use body::{BodyParser, HandBody, LineOutcome, Phase};
pub use error::ParseError;
pub use grammar::{classify_body, classify_summary, parse_money, BodyLine, Marker, SummaryLine};
pub use header::{parse_header, HandHeader};
pub use splitter::{bom_len, split_hands, Split, BOM, HAND_START_MARKER};

use crate::hand::HandRecord;

/// A parsed hand plus the number of body lines that had to be skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedHand {
    pub record: HandRecord,
    pub malformed_lines: usize,
}

/// Parse one hand block.
///
/// Seats come back sorted by seat number with each player at most once.
///
/// # Errors
///
/// Returns [`ParseError::EmptyBlock`] for a blank block and
/// [`ParseError::MalformedHeader`] when the first two lines do not match.
pub fn parse_hand(block: &[u8], hero: Option<&str>) -> Result<ParsedHand, ParseError> {
    let text = String::from_utf8_lossy(block);
    let mut lines = text.lines().map(|l| l.trim_start_matches('\u{feff}'));

    let start = lines
        .by_ref()
        .find(|l| !l.trim().is_empty())
        .ok_or(ParseError::EmptyBlock)?;
    let table = lines
        .next()
        .ok_or_else(|| ParseError::MalformedHeader("missing table line".to_string()))?;
    let header = parse_header(start.trim_end(), table.trim_end())?;

    let mut parser = BodyParser::new(hero);
    for line in lines {
        parser.feed(line);
    }
    let mut body = parser.finish();

    body.seats.sort_by_key(|s| s.seat);
    let mut seen = HashSet::new();
    body.seats.retain(|s| {
        let first = seen.insert(s.player.clone());
        if !first {
            tracing::warn!(
                hand_id = %header.hand_id,
                player = %s.player,
                seat = s.seat,
                "Dropping duplicate seat for player"
            );
        }
        first
    });

    Ok(ParsedHand {
        record: HandRecord {
            hand_id: header.hand_id,
            game: header.game,
            currency: header.currency,
            header_blinds: header.blinds,
            local_time: header.local_time,
            timezone: header.timezone,
            table_name: header.table_name,
            max_seats: header.max_seats,
            button_seat: header.button_seat,
            seats: body.seats,
            posts: body.posts,
            actions: body.actions,
            hero_cards: body.hero_cards,
            board: body.board,
            results: body.results,
        },
        malformed_lines: body.malformed_lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::{ActionKind, GameKind, Street};

    const HAND: &str = "\u{feff}PokerStars Hand #100: Tournament #200, $0.98+$0.12 USD Hold'em No Limit - Level I (10/20) - 2024/11/20 19:33:05 CET [2024/11/20 13:33:05 ET]\r
Table '200 1' 9-max Seat #3 is the button\r
Seat 3: carol (1500 in chips)\r
Seat 1: alice (1500 in chips)\r
Seat 2: bob (1500 in chips)\r
alice: posts small blind 10\r
bob: posts big blind 20\r
*** HOLE CARDS ***\r
Dealt to alice [Ah Ad]\r
carol: raises 40 to 60\r
alice: folds\r
bob: calls 40\r
*** FLOP *** [2c 7d Ks]\r
bob: checks\r
carol: bets 80\r
bob: folds\r
Uncalled bet (80) returned to carol\r
carol collected 130 from pot\r
carol: doesn't show hand\r
*** SUMMARY ***\r
Total pot 130 | Rake 0\r
Board [2c 7d Ks]\r
Seat 1: alice (small blind) folded before Flop\r
Seat 2: bob (big blind) folded on the Flop\r
Seat 3: carol (button) collected (130)\r
\r
\r
";

    #[test]
    fn test_parse_full_hand() {
        let parsed = parse_hand(HAND.as_bytes(), Some("alice")).unwrap();
        let hand = parsed.record;

        assert_eq!(parsed.malformed_lines, 0);
        assert_eq!(hand.hand_id, "100");
        assert!(matches!(hand.game, GameKind::Tournament { .. }));
        assert_eq!(hand.button_seat, 3);
        let seats: Vec<u8> = hand.seats.iter().map(|s| s.seat).collect();
        assert_eq!(seats, [1, 2, 3]);
        assert_eq!(hand.posts.len(), 2);
        assert_eq!(hand.actions.len(), 6);
        assert_eq!(hand.actions[3].street, Street::Flop);
        assert_eq!(hand.actions[4].kind, ActionKind::Bet);
        assert_eq!(hand.hero_cards.as_deref(), Some("Ah Ad"));
        assert_eq!(hand.board.len(), 3);
        assert_eq!(hand.results.len(), 3);
        assert_eq!(hand.big_blind(), Some(20.0));
    }

    #[test]
    fn test_malformed_header_rejects_hand() {
        let block = HAND.replace("Table '200 1' 9-max", "Table broken");
        let err = parse_hand(block.as_bytes(), None).unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeader(_)));
    }

    #[test]
    fn test_blank_block() {
        assert_eq!(parse_hand(b"\r\n  \r\n", None), Err(ParseError::EmptyBlock));
    }

    #[test]
    fn test_duplicate_player_seat_dropped() {
        let block = HAND.replace("Seat 2: bob (1500 in chips)", "Seat 2: alice (1500 in chips)");
        let hand = parse_hand(block.as_bytes(), None).unwrap().record;
        assert_eq!(hand.seats.len(), 2);
        assert_eq!(hand.seats[0].seat, 1);
    }

    #[test]
    fn test_unknown_body_line_counted() {
        let block = HAND.replace("*** HOLE CARDS ***", "something unexpected happened");
        let parsed = parse_hand(block.as_bytes(), None).unwrap();
        assert_eq!(parsed.malformed_lines, 1);
        assert_eq!(parsed.record.actions.len(), 6);
    }
}
