//! Structured hand record types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Betting round an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
}

impl Street {
    /// Returns the string representation for database storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
        }
    }
}

/// What a player did when it was their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
}

impl ActionKind {
    /// Returns the string representation for database storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fold => "fold",
            Self::Check => "check",
            Self::Call => "call",
            Self::Bet => "bet",
            Self::Raise => "raise",
        }
    }
}

/// Forced bet kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    Ante,
    SmallBlind,
    BigBlind,
}

impl PostKind {
    /// Returns the string representation for database storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ante => "ante",
            Self::SmallBlind => "small_blind",
            Self::BigBlind => "big_blind",
        }
    }
}

/// Seat role relative to the button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "BTN")]
    Button,
    #[serde(rename = "SB")]
    SmallBlind,
    #[serde(rename = "BB")]
    BigBlind,
    #[serde(rename = "UTG")]
    UnderTheGun,
    #[serde(rename = "UTG+1")]
    UnderTheGun1,
    #[serde(rename = "MP1")]
    Middle1,
    #[serde(rename = "MP2")]
    Middle2,
    #[serde(rename = "HJ")]
    Hijack,
    #[serde(rename = "CO")]
    Cutoff,
}

impl Position {
    /// Short label used in hand-history tooling and as the stats bucket key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "BTN",
            Self::SmallBlind => "SB",
            Self::BigBlind => "BB",
            Self::UnderTheGun => "UTG",
            Self::UnderTheGun1 => "UTG+1",
            Self::Middle1 => "MP1",
            Self::Middle2 => "MP2",
            Self::Hijack => "HJ",
            Self::Cutoff => "CO",
        }
    }

    /// Inverse of [`Self::as_str`].
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        [
            Self::Button,
            Self::SmallBlind,
            Self::BigBlind,
            Self::UnderTheGun,
            Self::UnderTheGun1,
            Self::Middle1,
            Self::Middle2,
            Self::Hijack,
            Self::Cutoff,
        ]
        .into_iter()
        .find(|p| p.as_str() == label)
    }

    /// Cutoff and button are the stealing seats.
    #[must_use]
    pub fn is_steal_seat(&self) -> bool {
        matches!(self, Self::Cutoff | Self::Button)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cash game or tournament, with the descriptor that identifies the game.
#[derive(Debug, Clone, PartialEq)]
pub enum GameKind {
    Cash {
        /// Stakes pair as written, e.g. `€0.01/€0.02`.
        stakes: String,
    },
    Tournament {
        tournament_id: String,
        /// Buy-in plus fee as written, e.g. `$0.98+$0.12`.
        buy_in: String,
    },
}

impl GameKind {
    /// Returns the string representation for database storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash { .. } => "cash",
            Self::Tournament { .. } => "tournament",
        }
    }

    #[must_use]
    pub fn tournament_id(&self) -> Option<&str> {
        match self {
            Self::Tournament { tournament_id, .. } => Some(tournament_id),
            Self::Cash { .. } => None,
        }
    }
}

/// A seat declaration from the top of the hand.
#[derive(Debug, Clone, PartialEq)]
pub struct Seat {
    pub seat: u8,
    pub player: String,
    pub chips: f64,
    pub bounty: Option<f64>,
    pub sitting_out: bool,
    /// Filled in by the position assigner.
    pub position: Option<Position>,
}

/// An ante or blind.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub player: String,
    pub kind: PostKind,
    pub amount: f64,
}

/// One player action, tagged with the street it happened on.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub street: Street,
    pub player: String,
    pub kind: ActionKind,
    /// Bet or call amount.
    pub amount: Option<f64>,
    pub raise_from: Option<f64>,
    pub raise_to: Option<f64>,
    pub all_in: bool,
}

impl Action {
    /// Action without any chips attached (fold or check).
    #[must_use]
    pub fn bare(street: Street, player: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            street,
            player: player.into(),
            kind,
            amount: None,
            raise_from: None,
            raise_to: None,
            all_in: false,
        }
    }
}

/// Per-player outcome from the summary section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerResult {
    pub seat: u8,
    pub player: String,
    /// Cards shown or mucked at showdown.
    pub cards: Option<String>,
    /// Amount collected from the pot.
    pub collected: Option<f64>,
    /// The summary says the player folded.
    pub folded: bool,
}

/// A fully parsed hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandRecord {
    pub hand_id: String,
    pub game: GameKind,
    pub currency: Option<String>,
    /// Small/big blind from the header (cash stakes or tournament level).
    pub header_blinds: Option<(f64, f64)>,
    pub local_time: NaiveDateTime,
    pub timezone: String,
    pub table_name: String,
    pub max_seats: u8,
    pub button_seat: u8,
    pub seats: Vec<Seat>,
    pub posts: Vec<Post>,
    pub actions: Vec<Action>,
    pub hero_cards: Option<String>,
    pub board: Vec<String>,
    pub results: Vec<PlayerResult>,
}

impl HandRecord {
    /// Big blind size: the first big-blind post, else the header blinds.
    #[must_use]
    pub fn big_blind(&self) -> Option<f64> {
        self.posts
            .iter()
            .find(|p| p.kind == PostKind::BigBlind)
            .map(|p| p.amount)
            .or(self.header_blinds.map(|(_, bb)| bb))
            .filter(|bb| *bb > 0.0)
    }

    /// Player who posted the big blind, if any.
    #[must_use]
    pub fn big_blind_player(&self) -> Option<&str> {
        self.posts
            .iter()
            .find(|p| p.kind == PostKind::BigBlind)
            .map(|p| p.player.as_str())
    }

    /// Seats dealt into the hand.
    pub fn active_seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(|s| !s.sitting_out)
    }

    /// Number of seats dealt into the hand.
    #[must_use]
    pub fn seats_occupied(&self) -> usize {
        self.active_seats().count()
    }

    #[must_use]
    pub fn result_of(&self, player: &str) -> Option<&PlayerResult> {
        self.results.iter().find(|r| r.player == player)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Minimal cash hand with the given seats, button and blinds.
    pub fn hand(seats: &[(u8, &str, f64)], button_seat: u8) -> HandRecord {
        HandRecord {
            hand_id: "1000".to_string(),
            game: GameKind::Cash {
                stakes: "$0.50/$1".to_string(),
            },
            currency: Some("USD".to_string()),
            header_blinds: Some((0.5, 1.0)),
            local_time: chrono::NaiveDate::from_ymd_opt(2024, 11, 20)
                .and_then(|d| d.and_hms_opt(19, 33, 5))
                .unwrap(),
            timezone: "CET".to_string(),
            table_name: "Test".to_string(),
            max_seats: 6,
            button_seat,
            seats: seats
                .iter()
                .map(|(seat, player, chips)| Seat {
                    seat: *seat,
                    player: (*player).to_string(),
                    chips: *chips,
                    bounty: None,
                    sitting_out: false,
                    position: None,
                })
                .collect(),
            posts: Vec::new(),
            actions: Vec::new(),
            hero_cards: None,
            board: Vec::new(),
            results: Vec::new(),
        }
    }
}
