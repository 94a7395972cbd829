use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable error codes carried by the `ERROR` event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authorization / identity
    RoomNotFound,
    InvalidHost,
    NotHost,
    NotInRoom,

    // Lobby admission
    NameTaken,
    RoomFull,
    GameInProgress,
    NotEnoughPlayers,

    // Answer stage
    PromptNotFound,
    NotAssigned,
    AlreadySubmitted,

    // Voting stage
    OwnMatchup,
    AlreadyVoted,
    InvalidVote,

    // Finale voting
    CannotVoteSelf,
    InvalidTarget,

    // General
    InvalidInput,
    InvalidState,
    InternalPromptSourceFailure,
}

impl ErrorCode {
    /// Returns a short human-readable description of this error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RoomNotFound => "No room exists with that code. It may have ended or expired.",
            Self::InvalidHost => "Host identity does not match this room.",
            Self::NotHost => "Only the host can perform this action.",
            Self::NotInRoom => "You are not a player in this room.",
            Self::NameTaken => "Another player in this room already uses that name.",
            Self::RoomFull => "This room already has the maximum number of players.",
            Self::GameInProgress => "The game has already started; joining is closed.",
            Self::NotEnoughPlayers => "Not enough players to start the game.",
            Self::PromptNotFound => "That prompt does not exist in the current round.",
            Self::NotAssigned => "That prompt was not assigned to you.",
            Self::AlreadySubmitted => "You already submitted an answer for this prompt.",
            Self::OwnMatchup => "You cannot vote on your own matchup.",
            Self::AlreadyVoted => "You already voted on this matchup.",
            Self::InvalidVote => "Votes must pick answer 1 or answer 2.",
            Self::CannotVoteSelf => "You cannot vote for your own answer.",
            Self::InvalidTarget => "No finale answer belongs to that player.",
            Self::InvalidInput => "The provided input is invalid.",
            Self::InvalidState => "The room is not in the right phase for that action.",
            Self::InternalPromptSourceFailure => "Prompt generation failed.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Domain errors produced by room and registry mutators.
///
/// Every variant maps to exactly one wire [`ErrorCode`]; the `ERROR` event is
/// only ever delivered to the offending connection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Room not found")]
    RoomNotFound,
    #[error("Host identity does not match this room")]
    InvalidHost,
    #[error("Only the host can do that")]
    NotHost,
    #[error("You are not in this room")]
    NotInRoom,
    #[error("The name \"{0}\" is already taken in this room")]
    NameTaken(String),
    #[error("Room is full")]
    RoomFull,
    #[error("The game has already started")]
    GameInProgress,
    #[error("At least {0} players are needed to start")]
    NotEnoughPlayers(usize),
    #[error("Prompt {0} not found")]
    PromptNotFound(String),
    #[error("Prompt {0} is not assigned to you")]
    NotAssigned(String),
    #[error("Answer already submitted")]
    AlreadySubmitted,
    #[error("You cannot vote on your own matchup")]
    OwnMatchup,
    #[error("You already voted on this matchup")]
    AlreadyVoted,
    #[error("Invalid vote")]
    InvalidVote,
    #[error("You cannot vote for yourself")]
    CannotVoteSelf,
    #[error("No finale answer belongs to that player")]
    InvalidTarget,
    #[error("{0}")]
    InvalidInput(String),
    #[error("That action is not valid in the current phase")]
    InvalidState,
}

impl GameError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RoomNotFound => ErrorCode::RoomNotFound,
            Self::InvalidHost => ErrorCode::InvalidHost,
            Self::NotHost => ErrorCode::NotHost,
            Self::NotInRoom => ErrorCode::NotInRoom,
            Self::NameTaken(_) => ErrorCode::NameTaken,
            Self::RoomFull => ErrorCode::RoomFull,
            Self::GameInProgress => ErrorCode::GameInProgress,
            Self::NotEnoughPlayers(_) => ErrorCode::NotEnoughPlayers,
            Self::PromptNotFound(_) => ErrorCode::PromptNotFound,
            Self::NotAssigned(_) => ErrorCode::NotAssigned,
            Self::AlreadySubmitted => ErrorCode::AlreadySubmitted,
            Self::OwnMatchup => ErrorCode::OwnMatchup,
            Self::AlreadyVoted => ErrorCode::AlreadyVoted,
            Self::InvalidVote => ErrorCode::InvalidVote,
            Self::CannotVoteSelf => ErrorCode::CannotVoteSelf,
            Self::InvalidTarget => ErrorCode::InvalidTarget,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::InvalidState => ErrorCode::InvalidState,
        }
    }
}
