//! Hand-start and table line parsing.

use chrono::NaiveDateTime;

use super::error::ParseError;
use super::grammar::{parse_money, CASH_HEADER, LEVEL_BLINDS, TABLE, TOURNAMENT_HEADER};
use crate::hand::GameKind;

/// Session metadata from the first two lines of a hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandHeader {
    pub hand_id: String,
    pub game: GameKind,
    pub currency: Option<String>,
    pub blinds: Option<(f64, f64)>,
    pub local_time: NaiveDateTime,
    pub timezone: String,
    pub table_name: String,
    pub max_seats: u8,
    pub button_seat: u8,
}

fn parse_local_time(raw: &str) -> Result<NaiveDateTime, ParseError> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&normalized, "%Y/%m/%d %H:%M:%S")
        .map_err(|e| ParseError::MalformedHeader(format!("bad timestamp {raw:?}: {e}")))
}

fn blinds(sb: Option<&str>, bb: Option<&str>) -> Option<(f64, f64)> {
    Some((parse_money(sb?)?, parse_money(bb?)?))
}

/// Parse the hand-start line and the table line.
///
/// # Errors
///
/// Returns [`ParseError::MalformedHeader`] when either line fails to match.
pub fn parse_header(start_line: &str, table_line: &str) -> Result<HandHeader, ParseError> {
    let (hand_id, game, currency, header_blinds, local_dt, local_tz) =
        if let Some(caps) = TOURNAMENT_HEADER.captures(start_line) {
            let level = LEVEL_BLINDS.captures(start_line);
            let level_blinds = level.as_ref().and_then(|l| {
                blinds(
                    l.name("sb").map(|m| m.as_str()),
                    l.name("bb").map(|m| m.as_str()),
                )
            });
            (
                caps["hand_id"].to_string(),
                GameKind::Tournament {
                    tournament_id: caps["tournament_id"].to_string(),
                    buy_in: caps["buy_in"].to_string(),
                },
                caps["currency"].to_string(),
                level_blinds,
                caps["local_dt"].to_string(),
                caps["local_tz"].to_string(),
            )
        } else if let Some(caps) = CASH_HEADER.captures(start_line) {
            (
                caps["hand_id"].to_string(),
                GameKind::Cash {
                    stakes: caps["stakes"].to_string(),
                },
                caps["currency"].to_string(),
                blinds(
                    caps.name("sb").map(|m| m.as_str()),
                    caps.name("bb").map(|m| m.as_str()),
                ),
                caps["local_dt"].to_string(),
                caps["local_tz"].to_string(),
            )
        } else {
            return Err(ParseError::MalformedHeader(format!(
                "hand-start line: {start_line}"
            )));
        };

    let table = TABLE
        .captures(table_line)
        .ok_or_else(|| ParseError::MalformedHeader(format!("table line: {table_line}")))?;

    let max_seats = table["max_seats"]
        .parse()
        .map_err(|_| ParseError::MalformedHeader(format!("seat count: {table_line}")))?;
    let button_seat = table["button"]
        .parse()
        .map_err(|_| ParseError::MalformedHeader(format!("button seat: {table_line}")))?;

    Ok(HandHeader {
        hand_id,
        game,
        currency: Some(currency),
        blinds: header_blinds,
        local_time: parse_local_time(&local_dt)?,
        timezone: local_tz,
        table_name: table["table"].to_string(),
        max_seats,
        button_seat,
    })
}
