//! Position labels relative to the button.

use super::types::{HandRecord, Position};

use super::types::Position::{
    BigBlind, Button, Cutoff, Hijack, Middle1, Middle2, SmallBlind, UnderTheGun, UnderTheGun1,
};

/// Why positions could not be assigned for a hand.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// The button seat is not in the seat list.
    #[error("Button seat {0} not present in seat list")]
    UnresolvedButton(u8),

    /// No label table for this many dealt-in seats.
    #[error("Unsupported table size: {0} seats dealt in")]
    UnsupportedTableSize(usize),
}

/// Labels in seating order starting at the button, for `n` dealt-in seats.
#[must_use]
pub fn labels_for(n: usize) -> Option<&'static [Position]> {
    let labels: &'static [Position] = match n {
        2 => &[Button, BigBlind],
        3 => &[Button, SmallBlind, BigBlind],
        4 => &[Button, SmallBlind, BigBlind, UnderTheGun],
        5 => &[Button, SmallBlind, BigBlind, UnderTheGun, Cutoff],
        6 => &[Button, SmallBlind, BigBlind, UnderTheGun, Hijack, Cutoff],
        7 => &[
            Button,
            SmallBlind,
            BigBlind,
            UnderTheGun,
            UnderTheGun1,
            Hijack,
            Cutoff,
        ],
        8 => &[
            Button,
            SmallBlind,
            BigBlind,
            UnderTheGun,
            UnderTheGun1,
            Middle1,
            Hijack,
            Cutoff,
        ],
        9 => &[
            Button,
            SmallBlind,
            BigBlind,
            UnderTheGun,
            UnderTheGun1,
            Middle1,
            Middle2,
            Hijack,
            Cutoff,
        ],
        _ => return None,
    };
    Some(labels)
}

/// Attach a position label to every dealt-in seat.
///
/// The seat list is rotated so the button comes first. Sitting-out seats keep
/// their place in the rotation but receive no label and consume none.
///
/// # Errors
///
/// Leaves every label absent and returns an error when the button seat is
/// missing or the number of dealt-in seats has no label table.
pub fn assign_positions(hand: &mut HandRecord) -> Result<(), PositionError> {
    for seat in &mut hand.seats {
        seat.position = None;
    }

    let n = hand.seats.len();
    let button_idx = hand
        .seats
        .iter()
        .position(|s| s.seat == hand.button_seat)
        .ok_or(PositionError::UnresolvedButton(hand.button_seat))?;

    let order: Vec<usize> = (0..n)
        .map(|k| (button_idx + k) % n)
        .filter(|&i| !hand.seats[i].sitting_out)
        .collect();

    let labels =
        labels_for(order.len()).ok_or(PositionError::UnsupportedTableSize(order.len()))?;

    for (&idx, &label) in order.iter().zip(labels) {
        hand.seats[idx].position = Some(label);
    }
    Ok(())
}
