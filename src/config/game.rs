//! Game rules and server pacing tunables.

use serde::{Deserialize, Serialize};

/// Immutable rule set for a game. Every field has a compiled-in default so a
/// partial config file works; values are read once per handler entry and
/// never mid-transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Minimum players required to start a game
    pub min_players: usize,
    /// Maximum players admitted to a lobby
    pub max_players: usize,
    /// Regular rounds before the finale
    pub rounds_per_game: u32,
    /// Prompts assigned to each player per round
    pub prompts_per_player: usize,
    /// Answer window for regular rounds, seconds
    pub answer_time_secs: u64,
    /// Vote window per matchup, seconds
    pub vote_time_secs: u64,
    /// Finale answer window, seconds
    pub last_lash_answer_time_secs: u64,
    /// Finale vote window, seconds
    pub last_lash_vote_time_secs: u64,
    /// Answers are clamped to this many characters after trimming
    pub max_answer_length: usize,
    /// Room codes are this many uppercase letters
    pub room_code_length: usize,
    /// Points per vote received in a matchup
    pub points_per_vote: u32,
    /// Bonus for a unanimous matchup win
    pub quipwit_bonus: u32,
    /// Bonus for topping the finale vote
    pub last_lash_first_bonus: u32,
    pub max_player_name_length: usize,
    pub max_theme_length: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            min_players: 3,
            max_players: 8,
            rounds_per_game: 2,
            prompts_per_player: 2,
            answer_time_secs: 90,
            vote_time_secs: 30,
            last_lash_answer_time_secs: 90,
            last_lash_vote_time_secs: 45,
            max_answer_length: 100,
            room_code_length: 4,
            points_per_vote: 100,
            quipwit_bonus: 100,
            last_lash_first_bonus: 300,
            max_player_name_length: 15,
            max_theme_length: 120,
        }
    }
}

impl GameRules {
    /// Prompt count for one round: every player authors `prompts_per_player`
    /// answers and each prompt has two authors.
    pub fn prompt_count(&self, player_count: usize) -> usize {
        (player_count * self.prompts_per_player).div_ceil(2)
    }
}

/// Pacing and lifecycle tunables for the server around the rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerTuning {
    /// How often the reaper scans for expired rooms, seconds
    pub room_cleanup_interval_secs: u64,
    /// Rooms older than this are deleted regardless of activity, seconds
    pub max_room_age_secs: u64,
    /// Beat between the voting-phase card and the first matchup, milliseconds
    pub voting_grace_ms: u64,
    /// How long a matchup result stays on screen, seconds
    pub matchup_result_hold_secs: u64,
    /// How long the round scoreboard stays on screen, seconds
    pub round_scores_hold_secs: u64,
    /// How long the finale results stay on screen, seconds
    pub finale_results_hold_secs: u64,
    /// Seconds added by `extend_time` when the host does not specify
    pub default_extend_secs: u64,
}

impl Default for ServerTuning {
    fn default() -> Self {
        Self {
            room_cleanup_interval_secs: 60,
            max_room_age_secs: 3600,
            voting_grace_ms: 1500,
            matchup_result_hold_secs: 4,
            round_scores_hold_secs: 5,
            finale_results_hold_secs: 8,
            default_extend_secs: 30,
        }
    }
}
