//! Per-player statistic counters and their bucket key.

use serde::{Deserialize, Serialize};

use crate::hand::Position;

macro_rules! counters {
    ($($(#[$doc:meta])* $name:ident),+ $(,)?) => {
        /// Opportunity/occurrence counters for one player.
        ///
        /// Every field is a non-negative count; one hand contributes 0 or 1 to each.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct StatCounters {
            $($(#[$doc])* pub $name: u32,)+
        }

        impl StatCounters {
            /// Column names, in declaration order.
            pub const COLUMNS: &'static [&'static str] = &[$(stringify!($name)),+];

            /// Counter values, in the same order as [`Self::COLUMNS`].
            #[must_use]
            pub fn values(&self) -> Vec<u32> {
                vec![$(self.$name),+]
            }

            /// Build from values in [`Self::COLUMNS`] order. Missing values read as zero.
            #[must_use]
            pub fn from_values(values: &[u32]) -> Self {
                let mut iter = values.iter().copied();
                Self {
                    $($name: iter.next().unwrap_or(0),)+
                }
            }

            /// Add every counter of `other` into `self`.
            pub fn merge(&mut self, other: &Self) {
                $(self.$name += other.$name;)+
            }
        }
    };
}

counters! {
    /// Hands dealt in.
    hands,
    /// Voluntarily put chips in preflop.
    vpip,
    /// Raised preflop.
    pfr,
    rfi,
    rfi_opp,
    cold_call,
    cold_call_opp,
    three_bet,
    three_bet_opp,
    fold_to_three_bet,
    fold_to_three_bet_opp,
    call_vs_three_bet,
    call_vs_three_bet_opp,
    four_bet,
    four_bet_opp,
    squeeze,
    squeeze_opp,
    steal,
    steal_opp,
    fold_bb_vs_steal,
    fold_bb_vs_steal_opp,
    saw_flop,
    cbet_flop,
    cbet_flop_opp,
    fold_to_cbet_flop,
    fold_to_cbet_flop_opp,
    check_raise_flop,
    check_raise_flop_opp,
    donk_flop,
    donk_flop_opp,
    saw_turn,
    barrel_turn,
    barrel_turn_opp,
    fold_to_barrel_turn,
    fold_to_barrel_turn_opp,
    saw_river,
    barrel_river,
    barrel_river_opp,
    fold_to_barrel_river,
    fold_to_barrel_river_opp,
    river_bet,
    river_bet_opp,
    went_showdown,
    won_showdown,
    won_hand,
    won_without_showdown,
}

/// Playing context a player's counters are accumulated under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatsKey {
    pub player: String,
    pub position: Option<Position>,
    pub max_seats: u8,
    pub seats_occupied: u8,
    pub stack_bucket: Option<u8>,
}

/// One player's contribution from one hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub key: StatsKey,
    pub counters: StatCounters,
}

/// Coarse starting-stack tier in big blinds.
///
/// `0` below 20bb, `1` below 40bb, `2` below 100bb, `3` otherwise.
/// Undefined without a positive big blind.
#[must_use]
pub fn stack_bucket(chips: f64, big_blind: Option<f64>) -> Option<u8> {
    let bb = big_blind.filter(|bb| *bb > 0.0)?;
    let depth = chips / bb;
    Some(match depth {
        d if d < 20.0 => 0,
        d if d < 40.0 => 1,
        d if d < 100.0 => 2,
        _ => 3,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_bucket_tiers() {
        assert_eq!(stack_bucket(15.0, Some(1.0)), Some(0));
        assert_eq!(stack_bucket(25.0, Some(1.0)), Some(1));
        assert_eq!(stack_bucket(50.0, Some(1.0)), Some(2));
        assert_eq!(stack_bucket(150.0, Some(1.0)), Some(3));
    }

    #[test]
    fn test_stack_bucket_edges() {
        assert_eq!(stack_bucket(20.0, Some(1.0)), Some(1));
        assert_eq!(stack_bucket(100.0, Some(1.0)), Some(3));
        assert_eq!(stack_bucket(3000.0, Some(20.0)), Some(3));
    }

    #[test]
    fn test_stack_bucket_unknown_big_blind() {
        assert_eq!(stack_bucket(100.0, None), None);
        assert_eq!(stack_bucket(100.0, Some(0.0)), None);
    }

    #[test]
    fn test_merge_sums_fields() {
        let mut a = StatCounters {
            hands: 1,
            rfi: 1,
            ..Default::default()
        };
        let b = StatCounters {
            hands: 1,
            rfi_opp: 1,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.hands, 2);
        assert_eq!(a.rfi, 1);
        assert_eq!(a.rfi_opp, 1);
    }

    #[test]
    fn test_columns_match_values() {
        let c = StatCounters {
            won_without_showdown: 7,
            ..Default::default()
        };
        assert_eq!(StatCounters::COLUMNS.len(), c.values().len());
        assert_eq!(StatCounters::COLUMNS.last(), Some(&"won_without_showdown"));
        assert_eq!(StatCounters::from_values(&c.values()), c);
    }
}
