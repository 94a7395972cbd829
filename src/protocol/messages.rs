use serde::{Deserialize, Serialize};

use super::error_codes::ErrorCode;
use super::types::{GameState, HostId, LastLashMode, PlayerId};

/// Message types sent from host and player clients to the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Create a room; the caller becomes its host.
    /// `host_id` lets a relaunched host shell reuse its stable identity.
    CreateRoom {
        #[serde(default)]
        host_id: Option<HostId>,
    },
    /// Join a room from the lobby
    JoinRoom { room_code: String, player_name: String },
    /// Reattach a disconnected player to their seat
    Rejoin { player_id: PlayerId, room_code: String },
    /// Reattach the host display; `host_id` must match the room's
    RejoinHost { room_code: String, host_id: HostId },
    /// Host starts the game, optionally with a theme
    StartGame {
        room_code: String,
        #[serde(default)]
        theme: Option<String>,
    },
    /// Submit an answer. Regular answers carry `prompt_id`; finale answers
    /// set `is_last_lash` instead and `prompt_id` is ignored.
    SubmitAnswer {
        room_code: String,
        #[serde(default)]
        prompt_id: Option<String>,
        answer: String,
        #[serde(default)]
        is_last_lash: bool,
    },
    /// Vote on the current matchup: 1 for the first answer, 2 for the second
    SubmitVote {
        room_code: String,
        prompt_id: String,
        vote: u8,
    },
    /// Finale vote. Exactly one target in this build; the array shape lets a
    /// ranked-ballot client fail validation instead of silently degrading.
    SubmitLastLashVotes {
        room_code: String,
        votes: Vec<PlayerId>,
    },
    /// Host skips a player's outstanding answers
    SkipPlayer { room_code: String, player_id: PlayerId },
    /// Host removes a player from the lobby
    KickPlayer { room_code: String, player_id: PlayerId },
    /// Host freezes the room timer
    PauseGame { room_code: String },
    /// Host resumes a paused room
    ResumeGame { room_code: String },
    /// Host adds time to the running countdown
    ExtendTime {
        room_code: String,
        #[serde(default)]
        seconds: Option<u64>,
    },
    /// Host ends the game immediately
    EndGame { room_code: String },
    /// Host acknowledges the finale mode reveal and releases the prompt
    ContinueLastWit { room_code: String },
}

/// One player's row in a room snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub connected: bool,
    pub score: u32,
}

/// Read-only view of a room, broadcast as `ROOM_UPDATE`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_code: String,
    pub state: GameState,
    pub current_round: u32,
    pub total_rounds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub paused: bool,
    pub host_connected: bool,
    pub players: Vec<PlayerView>,
}

/// Scoreboard row, sorted descending by score (ties keep join order)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub score: u32,
}

/// A prompt as delivered to one of its two authors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedPrompt {
    pub id: String,
    pub text: String,
}

/// A matchup as presented for voting. Answers are shown in slot order;
/// the author-to-answer mapping is only revealed by `MATCHUP_RESULT`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupView {
    pub prompt_id: String,
    pub prompt_text: String,
    pub answer1: String,
    pub answer2: String,
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub player1_name: String,
    pub player2_name: String,
    pub matchup_index: usize,
    pub total_matchups: usize,
    pub time_limit: u64,
}

/// One author's side of a resolved matchup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupSideResult {
    pub player_id: PlayerId,
    pub player_name: String,
    pub answer: String,
    pub votes: u32,
    pub points: u32,
    pub total_score: u32,
}

/// Resolved matchup, broadcast as `MATCHUP_RESULT`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupResultView {
    pub prompt_id: String,
    pub prompt_text: String,
    pub player1: MatchupSideResult,
    pub player2: MatchupSideResult,
    pub is_jinx: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quipwit: Option<u8>,
}

/// Finale prompt details shared by `LAST_LASH_PHASE` and `LAST_LASH_PROMPT`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastLashDetails {
    pub prompt: String,
    pub mode: LastLashMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letters: Option<Vec<char>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub time_limit: u64,
}

/// Anonymous finale entry presented for voting. `player_id` identifies the
/// author to the server for vote targeting; names are withheld.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinaleEntry {
    pub player_id: PlayerId,
    pub answer: String,
}

/// Finale result row, sorted descending by points
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinaleResultEntry {
    pub player_id: PlayerId,
    pub player_name: String,
    pub answer: String,
    pub votes: u32,
    pub points: u32,
    pub is_winner: bool,
}

/// Phase context resent on reconnection so a client can redraw mid-game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResyncView {
    pub room: RoomSnapshot,
    /// Player's still-unanswered prompts (PROMPT phase only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_prompts: Vec<AssignedPrompt>,
    /// The matchup on screen (VOTING phase only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_matchup: Option<MatchupView>,
    /// Finale details once released (LAST_LASH onward)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_lash: Option<LastLashDetails>,
    /// Shuffled finale entries (LAST_LASH_VOTING only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finale_entries: Vec<FinaleEntry>,
    /// Seconds left on the active countdown, if one is armed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_remaining: Option<u64>,
}

/// Message types sent from the server to host and player clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Room created; the host stores `host_id` for reconnection
    RoomCreated {
        room_code: String,
        host_id: HostId,
        #[serde(skip_serializing_if = "Option::is_none")]
        join_url: Option<String>,
    },
    /// Join confirmed; the player stores `player_id` for reconnection
    RoomJoined {
        room_code: String,
        player_id: PlayerId,
        player_name: String,
    },
    /// Room snapshot (boxed to keep the enum small)
    RoomUpdate(Box<RoomSnapshot>),
    GameStarted {
        room_code: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        theme: Option<String>,
        total_rounds: u32,
    },
    /// Host display: a writing round has begun
    PromptPhase {
        round: u32,
        total_rounds: u32,
        player_count: usize,
        time_limit: u64,
    },
    /// Per-player: the prompts assigned to this player
    ReceivePrompts {
        prompts: Vec<AssignedPrompt>,
        time_limit: u64,
    },
    VotingPhase { matchup_count: usize },
    VoteMatchup(Box<MatchupView>),
    MatchupResult(Box<MatchupResultView>),
    RoundScores {
        round: u32,
        scoreboard: Vec<ScoreEntry>,
    },
    /// Finale mode teaser; the host answers with `continue_last_wit`
    LastWitModeReveal {
        mode: LastLashMode,
        #[serde(skip_serializing_if = "Option::is_none")]
        instructions: Option<String>,
    },
    /// Host display: finale prompt released
    LastLashPhase(Box<LastLashDetails>),
    /// Per-player: finale prompt released
    LastLashPrompt(Box<LastLashDetails>),
    LastLashVoting {
        entries: Vec<FinaleEntry>,
        time_limit: u64,
    },
    LastLashResults { answers: Vec<FinaleResultEntry> },
    GameOver {
        winners: Vec<ScoreEntry>,
        scoreboard: Vec<ScoreEntry>,
    },
    /// Aggregate answer progress for the host display
    PlayerSubmitted {
        player_id: PlayerId,
        player_name: String,
        answers_submitted: usize,
        total_assigned: usize,
    },
    PlayerVoted {
        player_id: PlayerId,
        player_name: String,
    },
    /// Sent to the kicked connection only
    PlayerKicked { room_code: String },
    GamePaused {
        #[serde(skip_serializing_if = "Option::is_none")]
        remaining: Option<u64>,
    },
    GameResumed {
        #[serde(skip_serializing_if = "Option::is_none")]
        remaining: Option<u64>,
    },
    TimerUpdate { remaining: u64 },
    RejoinSuccess(Box<ResyncView>),
    RejoinHostSuccess(Box<ResyncView>),
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<ErrorCode>,
    },
}
