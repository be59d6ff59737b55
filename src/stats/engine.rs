//! Single-pass statistics over a hand's actions.
//!
//! For each action the opportunities of the acting player are recorded from
//! the state before the action, then the action updates the state and its
//! occurrence counters.

use std::collections::{HashMap, HashSet};

use super::types::{stack_bucket, PlayerStats, StatCounters, StatsKey};
use crate::hand::{Action, ActionKind, HandRecord, Position, Street};

/// Counters for every dealt-in player of one hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandStats {
    /// One entry per dealt-in player, in seat order.
    pub players: Vec<PlayerStats>,
    /// Actions that could not be attributed to a dealt-in player.
    pub anomalies: usize,
}

impl HandStats {
    #[must_use]
    pub fn get(&self, player: &str) -> Option<&PlayerStats> {
        self.players.iter().find(|s| s.key.player == player)
    }
}

/// Preflop raise sequence.
#[derive(Debug, Default)]
struct Preflop<'h> {
    open_raiser: Option<&'h str>,
    three_bettor: Option<&'h str>,
    four_bettor: Option<&'h str>,
    aggressor: Option<&'h str>,
    had_caller_before_three_bet: bool,
    opener_responded: bool,
    bb_vs_steal_counted: bool,
}

/// Per-street trackers, reset at each street transition.
#[derive(Debug)]
struct StreetState<'h> {
    street: Street,
    first_bettor: Option<&'h str>,
    /// The first bet was a continuation bet or barrel.
    continuation: bool,
    acted: HashSet<&'h str>,
    checked: HashSet<&'h str>,
    responded: HashSet<&'h str>,
    check_raise_counted: HashSet<&'h str>,
}

impl<'h> StreetState<'h> {
    fn new(street: Street) -> Self {
        Self {
            street,
            first_bettor: None,
            continuation: false,
            acted: HashSet::new(),
            checked: HashSet::new(),
            responded: HashSet::new(),
            check_raise_counted: HashSet::new(),
        }
    }
}

struct Walk<'h> {
    hand: &'h HandRecord,
    index: HashMap<&'h str, usize>,
    positions: Vec<Option<Position>>,
    stats: Vec<PlayerStats>,
    active: HashSet<&'h str>,
    bb_player: Option<&'h str>,
    pre: Preflop<'h>,
    street: StreetState<'h>,
    /// Player entitled to a continuation bet on the current street.
    initiative: Option<&'h str>,
    anomalies: usize,
}

/// Compute every dealt-in player's counters for one hand.
///
/// The accumulator map is built once from the seat list. Actions by players
/// not dealt in are counted as anomalies and skipped.
#[must_use]
pub fn compute_stats(hand: &HandRecord) -> HandStats {
    let mut walk = Walk::new(hand);
    for action in &hand.actions {
        walk.step(action);
    }
    walk.finish()
}

impl<'h> Walk<'h> {
    fn new(hand: &'h HandRecord) -> Self {
        let big_blind = hand.big_blind();
        let seats_occupied = u8::try_from(hand.seats_occupied()).unwrap_or(u8::MAX);

        let mut index = HashMap::new();
        let mut positions = Vec::new();
        let mut stats = Vec::new();
        for seat in hand.active_seats() {
            index.insert(seat.player.as_str(), stats.len());
            positions.push(seat.position);
            stats.push(PlayerStats {
                key: StatsKey {
                    player: seat.player.clone(),
                    position: seat.position,
                    max_seats: hand.max_seats,
                    seats_occupied,
                    stack_bucket: stack_bucket(seat.chips, big_blind),
                },
                counters: StatCounters {
                    hands: 1,
                    ..StatCounters::default()
                },
            });
        }

        Self {
            hand,
            active: index.keys().copied().collect(),
            index,
            positions,
            stats,
            bb_player: hand.big_blind_player().or_else(|| {
                hand.active_seats()
                    .find(|s| s.position == Some(Position::BigBlind))
                    .map(|s| s.player.as_str())
            }),
            pre: Preflop::default(),
            street: StreetState::new(Street::Preflop),
            initiative: None,
            anomalies: 0,
        }
    }

    fn is_steal_seat(&self, player: &str) -> bool {
        self.index
            .get(player)
            .and_then(|&i| self.positions[i])
            .is_some_and(|p| p.is_steal_seat())
    }

    fn step(&mut self, action: &'h Action) {
        let player = action.player.as_str();
        let Some(&idx) = self.index.get(player) else {
            tracing::warn!(
                hand_id = %self.hand.hand_id,
                player = %player,
                street = action.street.as_str(),
                "Action references a player not dealt in"
            );
            self.anomalies += 1;
            return;
        };

        if !self.active.contains(player) {
            tracing::debug!(
                hand_id = %self.hand.hand_id,
                player = %player,
                "Ignoring action from folded player"
            );
            return;
        }

        if action.street != self.street.street {
            self.enter_street(action.street);
        }

        match action.street {
            Street::Preflop => self.preflop(idx, player, action.kind),
            street => self.postflop(street, idx, player, action.kind),
        }
        self.street.acted.insert(player);
    }

    fn enter_street(&mut self, street: Street) {
        let carried = if self.street.continuation {
            self.street.first_bettor
        } else {
            None
        };
        self.initiative = match street {
            Street::Preflop => None,
            Street::Flop => self.pre.aggressor.filter(|a| self.active.contains(a)),
            Street::Turn | Street::River => carried,
        };
        self.street = StreetState::new(street);
    }

    fn preflop(&mut self, idx: usize, player: &'h str, kind: ActionKind) {
        let steal_seat = self.is_steal_seat(player);
        let opener_steals = self.pre.open_raiser.is_some_and(|o| self.is_steal_seat(o));
        let is_bb = self.bb_player == Some(player);
        let pre = &mut self.pre;
        let c = &mut self.stats[idx].counters;

        let facing_open =
            pre.three_bettor.is_none() && pre.open_raiser.is_some_and(|o| o != player);
        let facing_three_bet =
            pre.four_bettor.is_none() && pre.three_bettor.is_some_and(|t| t != player);
        let opener_vs_three_bet = pre.three_bettor.is_some()
            && pre.open_raiser == Some(player)
            && !pre.opener_responded;
        let bb_vs_steal = is_bb && facing_open && opener_steals && !pre.bb_vs_steal_counted;

        if pre.open_raiser.is_none() {
            c.rfi_opp += 1;
            if steal_seat {
                c.steal_opp += 1;
            }
        }
        if facing_open {
            c.three_bet_opp += 1;
            if pre.had_caller_before_three_bet {
                c.squeeze_opp += 1;
            }
            if !is_bb {
                c.cold_call_opp += 1;
            }
        }
        if facing_three_bet {
            c.four_bet_opp += 1;
        }
        if opener_vs_three_bet {
            c.fold_to_three_bet_opp += 1;
            c.call_vs_three_bet_opp += 1;
            pre.opener_responded = true;
        }
        if bb_vs_steal {
            c.fold_bb_vs_steal_opp += 1;
            pre.bb_vs_steal_counted = true;
        }

        match kind {
            ActionKind::Fold => {
                if opener_vs_three_bet {
                    c.fold_to_three_bet += 1;
                }
                if bb_vs_steal {
                    c.fold_bb_vs_steal += 1;
                }
                self.active.remove(player);
            }
            ActionKind::Call => {
                c.vpip = 1;
                if facing_open {
                    pre.had_caller_before_three_bet = true;
                    if !is_bb {
                        c.cold_call += 1;
                    }
                }
                if opener_vs_three_bet && pre.four_bettor.is_none() {
                    c.call_vs_three_bet += 1;
                }
            }
            ActionKind::Bet | ActionKind::Raise => {
                c.vpip = 1;
                c.pfr = 1;
                if pre.open_raiser.is_none() {
                    pre.open_raiser = Some(player);
                    c.rfi += 1;
                    if steal_seat {
                        c.steal += 1;
                    }
                } else if facing_open {
                    pre.three_bettor = Some(player);
                    c.three_bet += 1;
                    if pre.had_caller_before_three_bet {
                        c.squeeze += 1;
                    }
                } else if facing_three_bet {
                    pre.four_bettor = Some(player);
                    c.four_bet += 1;
                }
                pre.aggressor = Some(player);
            }
            ActionKind::Check => {}
        }
    }

    fn postflop(&mut self, street: Street, idx: usize, player: &'h str, kind: ActionKind) {
        let st = &mut self.street;
        let c = &mut self.stats[idx].counters;

        let first_action = !st.acted.contains(player);
        let unopened = st.first_bettor.is_none();

        let continuation_opp = unopened && first_action && self.initiative == Some(player);
        let donk_opp = street == Street::Flop
            && unopened
            && first_action
            && self.initiative.is_some_and(|a| {
                a != player && self.active.contains(a) && !st.acted.contains(a)
            });
        let facing_continuation = st.continuation
            && st.first_bettor != Some(player)
            && st.responded.insert(player);
        let check_raise_opp = street == Street::Flop
            && st.checked.contains(player)
            && st.first_bettor.is_some_and(|b| b != player)
            && st.check_raise_counted.insert(player);

        if continuation_opp {
            match street {
                Street::Flop => c.cbet_flop_opp += 1,
                Street::Turn => c.barrel_turn_opp += 1,
                Street::River => c.barrel_river_opp += 1,
                Street::Preflop => {}
            }
        }
        if donk_opp {
            c.donk_flop_opp += 1;
        }
        if facing_continuation {
            match street {
                Street::Flop => c.fold_to_cbet_flop_opp += 1,
                Street::Turn => c.fold_to_barrel_turn_opp += 1,
                Street::River => c.fold_to_barrel_river_opp += 1,
                Street::Preflop => {}
            }
        }
        if check_raise_opp {
            c.check_raise_flop_opp += 1;
        }
        if street == Street::River && first_action {
            c.river_bet_opp = 1;
        }

        // Acting on a street means seeing it, folding included.
        match street {
            Street::Flop => c.saw_flop = 1,
            Street::Turn => c.saw_turn = 1,
            Street::River => c.saw_river = 1,
            Street::Preflop => {}
        }

        match kind {
            ActionKind::Fold => {
                if facing_continuation {
                    match street {
                        Street::Flop => c.fold_to_cbet_flop += 1,
                        Street::Turn => c.fold_to_barrel_turn += 1,
                        Street::River => c.fold_to_barrel_river += 1,
                        Street::Preflop => {}
                    }
                }
                self.active.remove(player);
            }
            ActionKind::Check => {
                st.checked.insert(player);
            }
            ActionKind::Call => {}
            ActionKind::Bet | ActionKind::Raise => {
                if unopened {
                    st.first_bettor = Some(player);
                    if continuation_opp {
                        st.continuation = true;
                        match street {
                            Street::Flop => c.cbet_flop += 1,
                            Street::Turn => c.barrel_turn += 1,
                            Street::River => c.barrel_river += 1,
                            Street::Preflop => {}
                        }
                    } else if donk_opp {
                        c.donk_flop += 1;
                    }
                }
                if check_raise_opp && kind == ActionKind::Raise {
                    c.check_raise_flop += 1;
                }
                if street == Street::River {
                    c.river_bet = 1;
                }
            }
        }
    }

    fn finish(mut self) -> HandStats {
        let board = self.hand.board.len();
        let showdown = self.active.len() >= 2;

        for &player in &self.active {
            let idx = self.index[player];
            let c = &mut self.stats[idx].counters;

            // Players all-in before the board ran out never act on later streets.
            if board >= 3 {
                c.saw_flop = 1;
            }
            if board >= 4 {
                c.saw_turn = 1;
            }
            if board >= 5 {
                c.saw_river = 1;
            }

            let reached = self
                .hand
                .result_of(player)
                .is_none_or(|r| r.cards.is_some() || !r.folded);
            if reached {
                c.went_showdown = 1;
            }
        }

        for result in &self.hand.results {
            if result.collected.unwrap_or(0.0) <= 0.0 {
                continue;
            }
            let Some(&idx) = self.index.get(result.player.as_str()) else {
                continue;
            };
            let c = &mut self.stats[idx].counters;
            c.won_hand = 1;
            if showdown && c.went_showdown == 1 {
                c.won_showdown = 1;
            } else {
                c.won_without_showdown = 1;
            }
        }

        HandStats {
            players: self.stats,
            anomalies: self.anomalies,
        }
    }
}
