//! Wire protocol: message enums, shared view types, error codes, room codes,
//! and input validation.
//!
//! Inbound events are tagged `snake_case` (`join_room`, `submit_vote`, ...);
//! outbound events are tagged `SCREAMING_SNAKE_CASE` (`ROOM_UPDATE`,
//! `VOTE_MATCHUP`, ...). Payload fields serialize as `camelCase` to match the
//! host and player presentation clients.

pub mod error_codes;
pub mod messages;
pub mod room_codes;
pub mod types;
pub mod validation;

pub use error_codes::{ErrorCode, GameError};

pub use messages::{
    AssignedPrompt, ClientMessage, FinaleEntry, FinaleResultEntry, LastLashDetails,
    MatchupResultView, MatchupSideResult, MatchupView, PlayerView, ResyncView, RoomSnapshot,
    ScoreEntry, ServerMessage,
};

pub use types::{ConnectionId, GameState, HostId, LastLashMode, PlayerId, NO_ANSWER, SKIPPED};
