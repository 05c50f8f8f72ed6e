use solitaire_common::card::Card;
use thiserror::Error;

/// Errors reported by the solver before or between searches.
///
/// Running out of states is not an error: it suspends the search, and an
/// exhausted search is reported as [`crate::SolverStatus::Unsolvable`].
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Invalid initial board: {0}")]
    InvalidState(#[from] InvalidState),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No board has been set")]
    NoBoard,

    #[error("The solver is not suspended")]
    NotSuspended,
}

/// Why a board fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidState {
    #[error("card {0} is missing")]
    MissingCard(Card),

    #[error("card {0} appears too many times")]
    ExtraCard(Card),

    #[error("stack {0} contains an empty slot")]
    EmptySlot(usize),

    #[error("the talon contains an empty slot")]
    EmptyTalonSlot,
}
