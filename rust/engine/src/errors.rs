use thiserror::Error;

use crate::table::TableStatus;

/// Why a table operation was refused. A refused operation never changes
/// table state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Seat {seat} does not exist (table has {seats} seats)")]
    SeatOutOfRange { seat: usize, seats: usize },
    #[error("Seat {0} is already taken")]
    SeatTaken(usize),
    #[error("Seat {0} is not held by this player")]
    NotSeatOwner(usize),
    #[error("Seat {0} already has a stake on it")]
    StakePlaced(usize),
    #[error("Unknown player: {0}")]
    UnknownPlayer(String),
    #[error("Player {0} is disconnected")]
    Disconnected(String),
    #[error("Bet of {amount} is below the table minimum of {minimum}")]
    BetBelowMinimum { amount: u64, minimum: u64 },
    #[error("Stake of {amount} exceeds the table maximum of {max}")]
    StakeTooLarge { amount: u64, max: u64 },
    #[error("Insufficient balance: needed {needed}, available {available}")]
    InsufficientBalance { needed: u64, available: u64 },
    #[error("Action not allowed while the table is in {0:?}")]
    WrongPhase(TableStatus),
    #[error("It is not {0}'s turn")]
    NotPlayersTurn(String),
    #[error("Command needs a seat")]
    MissingSeat,
    #[error("Hand cannot be split")]
    CannotSplit,
    #[error("Not every occupied seat has placed a bet")]
    BetsIncomplete,
}

/// Rejected [`crate::table::TableConfig`] values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Table must have between {min} and {max} seats, got {seats}")]
    InvalidSeats { seats: usize, min: usize, max: usize },
    #[error("Minimum bet must be greater than 0")]
    ZeroMinimumBet,
    #[error("Shoe must hold between 1 and {max} decks, got {decks}")]
    InvalidDecks { decks: usize, max: usize },
}
