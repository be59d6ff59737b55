//! Per-line state machine for the body of a hand.

use super::grammar::{classify_body, classify_summary, BodyLine, Marker, SummaryLine};
use crate::hand::{Action, PlayerResult, Post, Seat, Street};

/// Which part of the hand the parser is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Seats, posts and betting on the given street.
    Play(Street),
    /// After the summary marker: seat lines are results.
    Summary,
}

/// How a single line was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Produced a record.
    Recorded,
    /// Recognized but carries nothing to record.
    Recognized,
    /// Matched no grammar and was skipped.
    Malformed,
}

/// Everything collected from the body lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandBody {
    pub seats: Vec<Seat>,
    pub posts: Vec<Post>,
    pub actions: Vec<Action>,
    pub hero_cards: Option<String>,
    pub board: Vec<String>,
    pub results: Vec<PlayerResult>,
    pub malformed_lines: usize,
}

/// Line-at-a-time body parser.
#[derive(Debug)]
pub struct BodyParser<'a> {
    hero: Option<&'a str>,
    phase: Phase,
    body: HandBody,
}

impl<'a> BodyParser<'a> {
    /// Start in preflop, outside the summary.
    ///
    /// `hero` is the screen name whose dealt cards should be kept.
    #[must_use]
    pub fn new(hero: Option<&'a str>) -> Self {
        Self {
            hero,
            phase: Phase::Play(Street::Preflop),
            body: HandBody::default(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Feed one line, without its terminator.
    pub fn feed(&mut self, line: &str) -> LineOutcome {
        let line = line.trim_end();
        if line.is_empty() {
            return LineOutcome::Recognized;
        }

        let outcome = match self.phase {
            Phase::Play(street) => classify_body(line).map(|l| self.apply_body(street, l)),
            Phase::Summary => classify_summary(line).map(|l| self.apply_summary(l)),
        };

        outcome.unwrap_or_else(|| {
            tracing::warn!(line = %line, phase = ?self.phase, "Skipping malformed line");
            self.body.malformed_lines += 1;
            LineOutcome::Malformed
        })
    }

    /// Finish the hand and hand back what was collected.
    #[must_use]
    pub fn finish(self) -> HandBody {
        self.body
    }

    fn apply_marker(&mut self, marker: Marker) -> LineOutcome {
        match marker {
            Marker::HoleCards | Marker::ShowDown => return LineOutcome::Recognized,
            Marker::Flop(cards) => {
                self.phase = Phase::Play(Street::Flop);
                self.body.board = cards;
            }
            Marker::Turn(card) => {
                self.phase = Phase::Play(Street::Turn);
                self.body.board.push(card);
            }
            Marker::River(card) => {
                self.phase = Phase::Play(Street::River);
                self.body.board.push(card);
            }
            Marker::Summary => self.phase = Phase::Summary,
        }
        LineOutcome::Recognized
    }

    fn apply_body(&mut self, street: Street, line: BodyLine) -> LineOutcome {
        match line {
            BodyLine::Marker(marker) => self.apply_marker(marker),
            BodyLine::Seat(seat) => {
                self.body.seats.push(seat);
                LineOutcome::Recorded
            }
            BodyLine::Post(post) => {
                self.body.posts.push(post);
                LineOutcome::Recorded
            }
            BodyLine::Dealt { player, cards } => {
                if self.hero == Some(player.as_str()) {
                    self.body.hero_cards = Some(cards);
                    LineOutcome::Recorded
                } else {
                    LineOutcome::Recognized
                }
            }
            BodyLine::Action(a) => {
                self.body.actions.push(Action {
                    street,
                    player: a.player,
                    kind: a.kind,
                    amount: a.amount,
                    raise_from: a.raise_from,
                    raise_to: a.raise_to,
                    all_in: a.all_in,
                });
                LineOutcome::Recorded
            }
            BodyLine::Uncalled { .. }
            | BodyLine::Collected { .. }
            | BodyLine::Disclosure { .. }
            | BodyLine::Notice => LineOutcome::Recognized,
        }
    }

    fn apply_summary(&mut self, line: SummaryLine) -> LineOutcome {
        match line {
            SummaryLine::Marker(marker) => self.apply_marker(marker),
            SummaryLine::Result(result) => {
                self.body.results.push(result);
                LineOutcome::Recorded
            }
            SummaryLine::Notice => LineOutcome::Recognized,
        }
    }
}
