//! Parser error types.

/// Errors that discard a whole hand.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Block has no lines to parse.
    #[error("Empty hand block")]
    EmptyBlock,

    /// The hand-start or table line did not match the grammar.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),
}
