//! Hand record data model and seat positions.

mod position;
mod types;

#[cfg(test)]
pub(crate) use types::fixtures;

pub use position::{assign_positions, labels_for, PositionError};
pub use types::{
    Action, ActionKind, GameKind, HandRecord, PlayerResult, Position, Post, PostKind, Seat,
    Street,
};
