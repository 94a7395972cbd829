use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for players, stable across reconnections
pub type PlayerId = Uuid;
/// Unique identifier for the host, stable across reconnections
pub type HostId = Uuid;
/// Identifier for a single transport attachment (one per WebSocket)
pub type ConnectionId = Uuid;

/// Sentinel stored when a player never answered before the deadline.
pub const NO_ANSWER: &str = "[No answer]";
/// Sentinel stored when the host skipped a player's pending answers.
pub const SKIPPED: &str = "[Skipped]";

/// Room phase. Rooms start in `Lobby` and end in `GameOver`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    Lobby,
    Prompt,
    Voting,
    Scoring,
    LastLash,
    LastLashVoting,
    GameOver,
}

impl GameState {
    /// Terminal states accept no further game events from the host.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver)
    }
}

/// Finale round flavor.
///
/// `Flashback` completes a story setup, `WordLash` writes a phrase whose
/// words start with given letters, `AcroLash` expands a random acronym.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LastLashMode {
    Flashback,
    WordLash,
    AcroLash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(GameState::GameOver.is_terminal());
        assert!(!GameState::Lobby.is_terminal());
        assert!(!GameState::LastLashVoting.is_terminal());
    }
}
