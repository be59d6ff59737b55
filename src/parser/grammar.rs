//! Line grammar for the hand-history text format.
//!
//! Each line shape has its own classifier returning a typed line or `None`.
//! Classifiers are tried in a fixed order; the first match wins.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::hand::{ActionKind, PlayerResult, Post, PostKind, Seat};

/// Amount as written: optional currency prefix, decimal point or comma.
const MONEY: &str = r"[^\d\s()/\[\]]*\d+(?:[.,]\d+)?";

const LOCAL_DT: &str = r"(?P<local_dt>\d{4}/\d{2}/\d{2}\s+\d{1,2}:\d{2}:\d{2})\s+(?P<local_tz>[A-Z]{2,5})";

fn compile(pattern: &str) -> Regex {
    let pattern = pattern.replace("{MONEY}", MONEY).replace("{LOCAL_DT}", LOCAL_DT);
    Regex::new(&pattern).expect("hand-history grammar pattern must compile")
}

pub(crate) static TOURNAMENT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^PokerStars Hand #(?P<hand_id>\d+):\s+Tournament #(?P<tournament_id>\d+),\s+(?P<buy_in>{MONEY}(?:\+{MONEY})+)\s+(?P<currency>[A-Z]{3})\b.*?\s-\s{LOCAL_DT}",
    )
});

pub(crate) static CASH_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^PokerStars Hand #(?P<hand_id>\d+):\s+.*?\((?P<stakes>(?P<sb>{MONEY})/(?P<bb>{MONEY}))\s+(?P<currency>[A-Z]{3})\)\s*-\s*{LOCAL_DT}",
    )
});

pub(crate) static LEVEL_BLINDS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"Level\s+\S+\s+\((?P<sb>{MONEY})/(?P<bb>{MONEY})\)"));

pub(crate) static TABLE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^Table '(?P<table>[^']*)'\s+(?P<max_seats>\d+)-max(?:\s+\([^)]*\))?\s+Seat #(?P<button>\d+) is the button\s*$",
    )
});

static SEAT: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^Seat (?P<seat>\d+): (?P<player>.+?) \((?P<chips>{MONEY}) in chips(?:, (?P<bounty>{MONEY}) bounty)?\)(?P<rest>.*)$",
    )
});

static POST: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^(?P<player>.+?): posts (?P<kind>the ante|small blind|big blind) (?P<amount>{MONEY})(?: and is all-in)?\s*$",
    )
});

static DEALT: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^Dealt to (?P<player>.+?) \[(?P<cards>[^\]]+)\](?: \[[^\]]+\])?\s*$")
});

static ACTION: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^(?P<player>.+?): (?P<verb>folds|checks|calls|bets|raises)(?: (?P<amount>{MONEY})(?: to (?P<to>{MONEY}))?)?(?: \[[^\]]*\])?(?P<all_in> and is all-in)?\s*$",
    )
});

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^\*\*\* (?P<name>HOLE CARDS|FLOP|TURN|RIVER|SHOW ?DOWN|SUMMARY) \*\*\*(?: \[(?P<first>[^\]]+)\])?(?: \[(?P<second>[^\]]+)\])?\s*$",
    )
});

static UNCALLED: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^Uncalled bet \((?P<amount>{MONEY})\) returned to (?P<player>.+?)\s*$")
});

static COLLECTED: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^(?P<player>.+?) collected (?P<amount>{MONEY}) from (?:side |main )?pot(?:-\d+)?\s*$")
});

static DISCLOSURE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^(?P<player>.+?): (?:shows \[(?P<cards>[^\]]+)\].*|mucks hand|doesn't show hand)\s*$",
    )
});

/// Lines that carry no statistical content: chat, connection and seating notices.
static NOTICE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r#"^(?:.+? said, ".*"|.+?(?::)? (?:is sitting out|sits out|has timed out(?: while disconnected)?|is disconnected|is connected|has returned|leaves the table|will be allowed to play after the button|joins the table at seat #\d+|was removed from the table.*|finished the tournament.*|wins the tournament.*|re-buys.*)|Total pot .*|Board \[.*\]|Hand was run (?:twice|three times)|\*\*\* (?:FIRST|SECOND|THIRD) (?:FLOP|TURN|RIVER) \*\*\*.*)\s*$"#,
    )
});

static SEAT_RESULT: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^Seat (?P<seat>\d+): (?P<player>.+?)(?: \((?:button|small blind|big blind)\))* (?:showed \[(?P<showed>[^\]]+)\](?: and (?:won|lost)(?: \((?P<won>{MONEY})\))?.*)?|mucked(?: \[(?P<mucked>[^\]]+)\])?.*|collected \((?P<collected>{MONEY})\).*|(?P<folded>folded\b.*)|lost\b.*|is sitting out)\s*$",
    )
});

/// Street and section markers.
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    HoleCards,
    Flop(Vec<String>),
    Turn(String),
    River(String),
    ShowDown,
    Summary,
}

/// An action line before it is tagged with its street.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionLine {
    pub player: String,
    pub kind: ActionKind,
    pub amount: Option<f64>,
    pub raise_from: Option<f64>,
    pub raise_to: Option<f64>,
    pub all_in: bool,
}

/// A recognized line outside the summary section.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyLine {
    Marker(Marker),
    Seat(Seat),
    Post(Post),
    Dealt { player: String, cards: String },
    Action(ActionLine),
    Uncalled { player: String, amount: f64 },
    Collected { player: String, amount: f64 },
    Disclosure { player: String, cards: Option<String> },
    Notice,
}

/// A recognized line inside the summary section.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryLine {
    Marker(Marker),
    Result(PlayerResult),
    Notice,
}

type Classifier<T> = fn(&str) -> Option<T>;

const BODY_CLASSIFIERS: &[Classifier<BodyLine>] = &[
    body_marker,
    body_seat,
    body_post,
    dealt,
    body_action,
    uncalled,
    collected,
    disclosure,
    body_notice,
];

const SUMMARY_CLASSIFIERS: &[Classifier<SummaryLine>] =
    &[summary_marker, summary_result, summary_notice];

/// Classify a line from the dealing and betting part of a hand.
#[must_use]
pub fn classify_body(line: &str) -> Option<BodyLine> {
    BODY_CLASSIFIERS.iter().find_map(|classify| classify(line))
}

/// Classify a line after the summary marker.
#[must_use]
pub fn classify_summary(line: &str) -> Option<SummaryLine> {
    SUMMARY_CLASSIFIERS.iter().find_map(|classify| classify(line))
}

/// Parse an amount, dropping currency symbols and non-breaking spaces.
///
/// A decimal comma is read as a decimal point.
#[must_use]
pub fn parse_money(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn money(caps: &Captures<'_>, name: &str) -> Option<f64> {
    caps.name(name).and_then(|m| parse_money(m.as_str()))
}

fn text(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name).map(|m| m.as_str().trim().to_string())
}

fn cards(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

fn body_marker(line: &str) -> Option<BodyLine> {
    marker(line).map(BodyLine::Marker)
}

fn body_seat(line: &str) -> Option<BodyLine> {
    seat(line).map(BodyLine::Seat)
}

fn body_post(line: &str) -> Option<BodyLine> {
    post(line).map(BodyLine::Post)
}

fn body_action(line: &str) -> Option<BodyLine> {
    action(line).map(BodyLine::Action)
}

fn body_notice(line: &str) -> Option<BodyLine> {
    NOTICE.is_match(line).then_some(BodyLine::Notice)
}

fn summary_marker(line: &str) -> Option<SummaryLine> {
    marker(line).map(SummaryLine::Marker)
}

fn summary_result(line: &str) -> Option<SummaryLine> {
    seat_result(line).map(SummaryLine::Result)
}

fn summary_notice(line: &str) -> Option<SummaryLine> {
    NOTICE.is_match(line).then_some(SummaryLine::Notice)
}

fn marker(line: &str) -> Option<Marker> {
    let caps = MARKER.captures(line)?;
    let marker = match &caps["name"] {
        "HOLE CARDS" => Marker::HoleCards,
        "FLOP" => Marker::Flop(cards(caps.name("first")?.as_str())),
        "TURN" => Marker::Turn(text(&caps, "second")?),
        "RIVER" => Marker::River(text(&caps, "second")?),
        "SUMMARY" => Marker::Summary,
        _ => Marker::ShowDown,
    };
    Some(marker)
}

fn seat(line: &str) -> Option<Seat> {
    let caps = SEAT.captures(line)?;
    let rest = caps.name("rest").map_or("", |m| m.as_str());
    Some(Seat {
        seat: caps["seat"].parse().ok()?,
        player: text(&caps, "player")?,
        chips: money(&caps, "chips")?,
        bounty: money(&caps, "bounty"),
        sitting_out: rest.contains("is sitting out") || rest.contains("out of hand"),
        position: None,
    })
}

fn post(line: &str) -> Option<Post> {
    let caps = POST.captures(line)?;
    let kind = match &caps["kind"] {
        "the ante" => PostKind::Ante,
        "small blind" => PostKind::SmallBlind,
        _ => PostKind::BigBlind,
    };
    Some(Post {
        player: text(&caps, "player")?,
        kind,
        amount: money(&caps, "amount")?,
    })
}

fn dealt(line: &str) -> Option<BodyLine> {
    let caps = DEALT.captures(line)?;
    Some(BodyLine::Dealt {
        player: text(&caps, "player")?,
        cards: text(&caps, "cards")?,
    })
}

fn action(line: &str) -> Option<ActionLine> {
    let caps = ACTION.captures(line)?;
    let kind = match &caps["verb"] {
        "folds" => ActionKind::Fold,
        "checks" => ActionKind::Check,
        "calls" => ActionKind::Call,
        "bets" => ActionKind::Bet,
        _ => ActionKind::Raise,
    };
    let amount = money(&caps, "amount");
    let to = money(&caps, "to");

    // Exactly one amount shape per verb.
    let (amount, raise_from, raise_to) = match (kind, amount, to) {
        (ActionKind::Fold | ActionKind::Check, None, None) => (None, None, None),
        (ActionKind::Call | ActionKind::Bet, Some(a), None) => (Some(a), None, None),
        (ActionKind::Raise, Some(from), Some(to)) => (None, Some(from), Some(to)),
        _ => return None,
    };

    Some(ActionLine {
        player: text(&caps, "player")?,
        kind,
        amount,
        raise_from,
        raise_to,
        all_in: caps.name("all_in").is_some(),
    })
}

fn uncalled(line: &str) -> Option<BodyLine> {
    let caps = UNCALLED.captures(line)?;
    Some(BodyLine::Uncalled {
        player: text(&caps, "player")?,
        amount: money(&caps, "amount")?,
    })
}

fn collected(line: &str) -> Option<BodyLine> {
    let caps = COLLECTED.captures(line)?;
    Some(BodyLine::Collected {
        player: text(&caps, "player")?,
        amount: money(&caps, "amount")?,
    })
}

fn disclosure(line: &str) -> Option<BodyLine> {
    let caps = DISCLOSURE.captures(line)?;
    Some(BodyLine::Disclosure {
        player: text(&caps, "player")?,
        cards: text(&caps, "cards"),
    })
}

fn seat_result(line: &str) -> Option<PlayerResult> {
    let caps = SEAT_RESULT.captures(line)?;
    let cards = text(&caps, "showed").or_else(|| text(&caps, "mucked"));
    let collected = money(&caps, "won").or_else(|| money(&caps, "collected"));
    Some(PlayerResult {
        seat: caps["seat"].parse().ok()?,
        player: text(&caps, "player")?,
        cards,
        collected,
        folded: caps.name("folded").is_some(),
    })
}
