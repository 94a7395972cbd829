//! Room state and the mutators that preserve its invariants.
//!
//! A room exclusively owns its players, prompts, and finale block. All
//! mutation happens behind the room's mutex (one logical writer per room);
//! nothing outside this module reaches into the collections directly.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::GameRules;
use crate::protocol::validation::{
    is_sentinel_answer, sanitize_answer, validate_name_uniqueness, validate_player_name,
};
use crate::protocol::{
    ConnectionId, GameError, GameState, HostId, LastLashMode, PlayerId, PlayerView, RoomSnapshot,
    ScoreEntry,
};

use super::timer::ArmedTimer;

/// A seated player. Identity survives transport reattachment; the
/// connection binding is nullable.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub connection: Option<ConnectionId>,
    pub name: String,
    pub connected: bool,
    /// Prompt ids assigned this round
    pub prompts_assigned: Vec<String>,
    /// Answers this player has submitted this round
    pub answers_submitted: usize,
    /// Prompt ids this player has voted on this round
    pub has_voted: HashSet<String>,
}

/// One prompt of the current round with its two authors.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub id: String,
    pub text: String,
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub answer1: Option<String>,
    pub answer2: Option<String>,
    pub votes1: u32,
    pub votes2: u32,
    pub is_jinx: bool,
    /// 1 or 2 when that side won unanimously
    pub quipwit: Option<u8>,
    /// The matchup has been shown to voters
    pub presented: bool,
    /// Votes are closed and points applied
    pub resolved: bool,
}

impl Prompt {
    pub fn new(id: String, text: String, player1: PlayerId, player2: PlayerId) -> Self {
        debug_assert_ne!(player1, player2);
        Self {
            id,
            text,
            player1,
            player2,
            answer1: None,
            answer2: None,
            votes1: 0,
            votes2: 0,
            is_jinx: false,
            quipwit: None,
            presented: false,
            resolved: false,
        }
    }

    /// Which side a player authors: 1, 2, or none.
    pub fn side_of(&self, player: PlayerId) -> Option<u8> {
        if self.player1 == player {
            Some(1)
        } else if self.player2 == player {
            Some(2)
        } else {
            None
        }
    }

    pub fn is_author(&self, player: PlayerId) -> bool {
        self.side_of(player).is_some()
    }

    pub fn both_answered(&self) -> bool {
        self.answer1.is_some() && self.answer2.is_some()
    }
}

/// One player's finale entry.
#[derive(Debug, Clone)]
pub struct FinaleAnswer {
    pub player: PlayerId,
    pub answer: String,
    /// Soft-validation note for WORD_LASH / ACRO_LASH; never rejects
    pub warning: Option<String>,
    pub votes: u32,
    pub points: u32,
    pub is_winner: bool,
}

/// The finale block: one shared prompt, everyone answers, one vote each.
#[derive(Debug, Clone)]
pub struct LastLashRound {
    pub prompt: String,
    pub mode: LastLashMode,
    pub letters: Option<Vec<char>>,
    pub instructions: Option<String>,
    pub answers: Vec<FinaleAnswer>,
    /// voter -> voted-for
    pub votes: HashMap<PlayerId, PlayerId>,
    /// The host confirmed the mode reveal and the prompt went out
    pub released: bool,
    /// Votes are closed and points applied
    pub resolved: bool,
}

/// A single game room.
#[derive(Debug)]
pub struct Room {
    pub code: String,
    pub host_id: HostId,
    pub host_connection: Option<ConnectionId>,
    pub state: GameState,
    /// Join order; kicks are lobby-only so mid-game order is stable
    pub players: Vec<Player>,
    pub current_round: u32,
    pub theme: Option<String>,
    pub prompts: Vec<Prompt>,
    pub scores: HashMap<PlayerId, u32>,
    pub current_matchup: usize,
    /// Prompt texts already used in this game, never repeated
    pub used_prompt_texts: HashSet<String>,
    pub last_lash: Option<LastLashRound>,
    pub paused: bool,
    pub pause_remaining_secs: Option<u64>,
    pub paused_in_state: Option<GameState>,
    pub timer: Option<ArmedTimer>,
    pub timer_generation: u64,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(code: String, host_id: HostId, host_connection: ConnectionId) -> Self {
        Self {
            code,
            host_id,
            host_connection: Some(host_connection),
            state: GameState::Lobby,
            players: Vec::new(),
            current_round: 0,
            theme: None,
            prompts: Vec::new(),
            scores: HashMap::new(),
            current_matchup: 0,
            used_prompt_texts: HashSet::new(),
            last_lash: None,
            paused: false,
            pause_remaining_secs: None,
            paused_in_state: None,
            timer: None,
            timer_generation: 0,
            created_at: Utc::now(),
        }
    }

    // ------------------------------------------------------------------
    // Lobby admission and identity
    // ------------------------------------------------------------------

    /// Admit a player to the lobby. Fails when the game has started, the
    /// room is full, or the name is invalid or taken.
    pub fn add_player(
        &mut self,
        name: &str,
        connection: ConnectionId,
        rules: &GameRules,
    ) -> Result<PlayerId, GameError> {
        if self.state != GameState::Lobby {
            return Err(GameError::GameInProgress);
        }
        if self.players.len() >= rules.max_players {
            return Err(GameError::RoomFull);
        }
        validate_player_name(name, rules)?;
        validate_name_uniqueness(name, &self.players)?;

        let id = Uuid::new_v4();
        self.players.push(Player {
            id,
            connection: Some(connection),
            name: name.trim().to_string(),
            connected: true,
            prompts_assigned: Vec::new(),
            answers_submitted: 0,
            has_voted: HashSet::new(),
        });
        self.scores.insert(id, 0);
        Ok(id)
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == id)?;
        self.scores.remove(&id);
        Some(self.players.remove(idx))
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn mark_player_disconnected(&mut self, id: PlayerId) {
        if let Some(player) = self.player_mut(id) {
            player.connected = false;
            player.connection = None;
        }
    }

    /// Reattach a returning player. Identity is authoritative; the new
    /// connection replaces whatever binding existed.
    pub fn rebind_player(
        &mut self,
        id: PlayerId,
        connection: ConnectionId,
    ) -> Result<(), GameError> {
        let player = self.player_mut(id).ok_or(GameError::NotInRoom)?;
        player.connection = Some(connection);
        player.connected = true;
        Ok(())
    }

    /// Reattach the host display; the caller must present the room's host id.
    pub fn rebind_host(
        &mut self,
        host_id: HostId,
        connection: ConnectionId,
    ) -> Result<(), GameError> {
        if self.host_id != host_id {
            return Err(GameError::InvalidHost);
        }
        self.host_connection = Some(connection);
        Ok(())
    }

    pub fn require_host(&self, connection: ConnectionId) -> Result<(), GameError> {
        if self.host_connection == Some(connection) {
            Ok(())
        } else {
            Err(GameError::NotHost)
        }
    }

    // ------------------------------------------------------------------
    // Answer stage
    // ------------------------------------------------------------------

    /// Record a player's answer to one of their assigned prompts.
    /// Returns `(answers_submitted, total_assigned)` for progress display.
    pub fn submit_answer(
        &mut self,
        player_id: PlayerId,
        prompt_id: &str,
        text: &str,
        rules: &GameRules,
    ) -> Result<(usize, usize), GameError> {
        if self.state != GameState::Prompt {
            return Err(GameError::InvalidState);
        }
        if self.player(player_id).is_none() {
            return Err(GameError::NotInRoom);
        }
        let answer = sanitize_answer(text, rules);

        let prompt = self
            .prompts
            .iter_mut()
            .find(|p| p.id == prompt_id)
            .ok_or_else(|| GameError::PromptNotFound(prompt_id.to_string()))?;

        let side = prompt
            .side_of(player_id)
            .ok_or_else(|| GameError::NotAssigned(prompt_id.to_string()))?;

        let slot = if side == 1 {
            &mut prompt.answer1
        } else {
            &mut prompt.answer2
        };
        if slot.is_some() {
            return Err(GameError::AlreadySubmitted);
        }
        *slot = Some(answer);

        let player = self.player_mut(player_id).ok_or(GameError::NotInRoom)?;
        player.answers_submitted += 1;
        Ok((player.answers_submitted, player.prompts_assigned.len()))
    }

    pub fn all_answers_in(&self) -> bool {
        !self.prompts.is_empty() && self.prompts.iter().all(Prompt::both_answered)
    }

    /// Fill every unanswered side with a sentinel so the phase can advance.
    pub fn sweep_unanswered(&mut self, sentinel: &str) {
        for prompt in &mut self.prompts {
            if prompt.answer1.is_none() {
                prompt.answer1 = Some(sentinel.to_string());
            }
            if prompt.answer2.is_none() {
                prompt.answer2 = Some(sentinel.to_string());
            }
        }
    }

    /// Fill one player's unanswered sides with a sentinel (host skip).
    pub fn fill_player_answers(&mut self, player_id: PlayerId, sentinel: &str) {
        for prompt in &mut self.prompts {
            match prompt.side_of(player_id) {
                Some(1) if prompt.answer1.is_none() => prompt.answer1 = Some(sentinel.to_string()),
                Some(2) if prompt.answer2.is_none() => prompt.answer2 = Some(sentinel.to_string()),
                _ => {}
            }
        }
    }

    // ------------------------------------------------------------------
    // Voting stage
    // ------------------------------------------------------------------

    pub fn current_prompt(&self) -> Option<&Prompt> {
        self.prompts.get(self.current_matchup)
    }

    pub fn current_prompt_mut(&mut self) -> Option<&mut Prompt> {
        self.prompts.get_mut(self.current_matchup)
    }

    /// Players other than the matchup's two authors.
    pub fn eligible_voters(&self) -> usize {
        self.players.len().saturating_sub(2)
    }

    /// Record a vote on the current matchup.
    pub fn submit_vote(
        &mut self,
        voter: PlayerId,
        prompt_id: &str,
        choice: u8,
    ) -> Result<(), GameError> {
        if self.state != GameState::Voting {
            return Err(GameError::InvalidState);
        }

        let current = self.current_matchup;
        let prompt_key = {
            let prompt = self
                .prompts
                .get(current)
                .filter(|p| p.id == prompt_id)
                .ok_or_else(|| GameError::PromptNotFound(prompt_id.to_string()))?;
            if prompt.is_author(voter) {
                return Err(GameError::OwnMatchup);
            }
            if prompt.resolved {
                // window already closed; keeps vote totals within the
                // eligible-voter cap even for late rejoiners
                return Err(GameError::InvalidVote);
            }
            prompt.id.clone()
        };
        if !matches!(choice, 1 | 2) {
            return Err(GameError::InvalidVote);
        }

        let voter_state = self.player(voter).ok_or(GameError::NotInRoom)?;
        if voter_state.has_voted.contains(&prompt_key) {
            return Err(GameError::AlreadyVoted);
        }

        if let Some(prompt) = self.prompts.get_mut(current) {
            if choice == 1 {
                prompt.votes1 += 1;
            } else {
                prompt.votes2 += 1;
            }
        }
        if let Some(voter_state) = self.player_mut(voter) {
            voter_state.has_voted.insert(prompt_key);
        }
        Ok(())
    }

    /// Every eligible voter has voted on the current matchup. Disconnected
    /// players count as eligible; the vote timer closes the window for them.
    pub fn matchup_votes_complete(&self) -> bool {
        self.current_prompt()
            .map(|p| (p.votes1 + p.votes2) as usize >= self.eligible_voters())
            .unwrap_or(false)
    }

    /// Reset per-round voting and submission bookkeeping.
    pub fn reset_round_progress(&mut self) {
        for player in &mut self.players {
            player.prompts_assigned.clear();
            player.answers_submitted = 0;
            player.has_voted.clear();
        }
    }

    // ------------------------------------------------------------------
    // Finale
    // ------------------------------------------------------------------

    /// Record a finale answer: one per player, soft-validated by mode.
    /// Returns the warning, if any, for the submitting client.
    pub fn submit_finale_answer(
        &mut self,
        player_id: PlayerId,
        text: &str,
        rules: &GameRules,
    ) -> Result<Option<String>, GameError> {
        if self.state != GameState::LastLash {
            return Err(GameError::InvalidState);
        }
        if self.player(player_id).is_none() {
            return Err(GameError::NotInRoom);
        }
        let answer = sanitize_answer(text, rules);

        let lash = self.last_lash.as_mut().ok_or(GameError::InvalidState)?;
        if !lash.released {
            return Err(GameError::InvalidState);
        }
        if lash.answers.iter().any(|a| a.player == player_id) {
            return Err(GameError::AlreadySubmitted);
        }

        let warning = validate_finale_answer(lash.mode, lash.letters.as_deref(), &answer);
        lash.answers.push(FinaleAnswer {
            player: player_id,
            answer,
            warning: warning.clone(),
            votes: 0,
            points: 0,
            is_winner: false,
        });
        Ok(warning)
    }

    pub fn finale_answers_in(&self) -> bool {
        self.last_lash
            .as_ref()
            .map(|lash| lash.answers.len() >= self.players.len())
            .unwrap_or(false)
    }

    /// Record a finale vote: one per voter, never for yourself, and only for
    /// players who actually answered.
    pub fn submit_finale_vote(
        &mut self,
        voter: PlayerId,
        target: PlayerId,
    ) -> Result<(), GameError> {
        if self.state != GameState::LastLashVoting {
            return Err(GameError::InvalidState);
        }
        if self.player(voter).is_none() {
            return Err(GameError::NotInRoom);
        }

        let lash = self.last_lash.as_mut().ok_or(GameError::InvalidState)?;
        if lash.resolved {
            return Err(GameError::InvalidVote);
        }
        if lash.votes.contains_key(&voter) {
            return Err(GameError::AlreadyVoted);
        }
        if target == voter {
            return Err(GameError::CannotVoteSelf);
        }
        if !lash.answers.iter().any(|a| a.player == target) {
            return Err(GameError::InvalidTarget);
        }

        lash.votes.insert(voter, target);
        Ok(())
    }

    pub fn finale_votes_complete(&self) -> bool {
        self.last_lash
            .as_ref()
            .map(|lash| lash.votes.len() >= self.players.len())
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Scores and views
    // ------------------------------------------------------------------

    pub fn score_of(&self, player: PlayerId) -> u32 {
        self.scores.get(&player).copied().unwrap_or(0)
    }

    pub fn add_score(&mut self, player: PlayerId, points: u32) {
        *self.scores.entry(player).or_insert(0) += points;
    }

    /// Scoreboard sorted descending by score; ties keep join order.
    pub fn scoreboard(&self) -> Vec<ScoreEntry> {
        let mut entries: Vec<ScoreEntry> = self
            .players
            .iter()
            .map(|p| ScoreEntry {
                player_id: p.id,
                name: p.name.clone(),
                score: self.score_of(p.id),
            })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
    }

    /// Everyone holding the maximum score. Empty rooms have no winners.
    pub fn winners(&self) -> Vec<ScoreEntry> {
        let scoreboard = self.scoreboard();
        let Some(top) = scoreboard.first().map(|e| e.score) else {
            return Vec::new();
        };
        scoreboard.into_iter().filter(|e| e.score == top).collect()
    }

    pub fn snapshot(&self, rules: &GameRules) -> RoomSnapshot {
        RoomSnapshot {
            room_code: self.code.clone(),
            state: self.state,
            current_round: self.current_round,
            total_rounds: rules.rounds_per_game,
            theme: self.theme.clone(),
            paused: self.paused,
            host_connected: self.host_connection.is_some(),
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    id: p.id,
                    name: p.name.clone(),
                    connected: p.connected,
                    score: self.score_of(p.id),
                })
                .collect(),
        }
    }

    // ------------------------------------------------------------------
    // Timer bookkeeping
    // ------------------------------------------------------------------

    pub fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    pub fn timer_remaining_secs(&self) -> Option<u64> {
        if self.paused {
            self.pause_remaining_secs
        } else {
            self.timer.as_ref().map(ArmedTimer::remaining_secs)
        }
    }
}

/// Soft validation of a finale answer against the mode's letter rules.
/// Mismatches attach a warning; the answer is accepted regardless.
pub fn validate_finale_answer(
    mode: LastLashMode,
    letters: Option<&[char]>,
    answer: &str,
) -> Option<String> {
    if is_sentinel_answer(answer) {
        return None;
    }
    let letters = match mode {
        LastLashMode::Flashback => return None,
        LastLashMode::WordLash | LastLashMode::AcroLash => letters?,
    };

    let words: Vec<&str> = answer.split_whitespace().collect();
    if mode == LastLashMode::AcroLash && words.len() != letters.len() {
        return Some(format!(
            "Expected exactly {} words, one per letter",
            letters.len()
        ));
    }
    if words.len() < letters.len() {
        return Some(format!("Expected at least {} words", letters.len()));
    }

    for (word, letter) in words.iter().zip(letters.iter()) {
        let starts_with = word
            .chars()
            .next()
            .map(|c| c.eq_ignore_ascii_case(letter))
            .unwrap_or(false);
        if !starts_with {
            return Some(format!("\"{word}\" should start with '{letter}'"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{NO_ANSWER, SKIPPED};

    fn lobby_room() -> (Room, GameRules) {
        let rules = GameRules::default();
        let room = Room::new("ABCD".to_string(), Uuid::new_v4(), Uuid::new_v4());
        (room, rules)
    }

    fn seated_room(count: usize) -> (Room, GameRules, Vec<PlayerId>) {
        let (mut room, rules) = lobby_room();
        let ids = (0..count)
            .map(|i| {
                room.add_player(&format!("Player{i}"), Uuid::new_v4(), &rules)
                    .unwrap()
            })
            .collect();
        (room, rules, ids)
    }

    #[test]
    fn test_admission_rules() {
        let (mut room, rules) = lobby_room();
        let alice = room.add_player("Alice", Uuid::new_v4(), &rules).unwrap();
        assert_eq!(room.score_of(alice), 0);

        // case-insensitive name collision
        let err = room.add_player("alice", Uuid::new_v4(), &rules).unwrap_err();
        assert_eq!(err, GameError::NameTaken("alice".to_string()));

        for i in 0..7 {
            room.add_player(&format!("P{i}"), Uuid::new_v4(), &rules)
                .unwrap();
        }
        let err = room.add_player("Late", Uuid::new_v4(), &rules).unwrap_err();
        assert_eq!(err, GameError::RoomFull);
    }

    #[test]
    fn test_no_admission_after_start() {
        let (mut room, rules, _) = seated_room(3);
        room.state = GameState::Prompt;
        let err = room.add_player("Dana", Uuid::new_v4(), &rules).unwrap_err();
        assert_eq!(err, GameError::GameInProgress);
    }

    #[test]
    fn test_answer_submission_and_resubmission() {
        let (mut room, rules, ids) = seated_room(3);
        room.state = GameState::Prompt;
        room.prompts.push(Prompt::new(
            "r1_p0".to_string(),
            "Worst superhero".to_string(),
            ids[0],
            ids[1],
        ));
        room.player_mut(ids[0]).unwrap().prompts_assigned = vec!["r1_p0".to_string()];
        room.player_mut(ids[1]).unwrap().prompts_assigned = vec!["r1_p0".to_string()];

        let (done, total) = room.submit_answer(ids[0], "r1_p0", "Captain Naptime", &rules).unwrap();
        assert_eq!((done, total), (1, 1));

        let err = room
            .submit_answer(ids[0], "r1_p0", "second try", &rules)
            .unwrap_err();
        assert_eq!(err, GameError::AlreadySubmitted);

        let err = room
            .submit_answer(ids[2], "r1_p0", "not mine", &rules)
            .unwrap_err();
        assert!(matches!(err, GameError::NotAssigned(_)));

        let err = room
            .submit_answer(ids[1], "r9_p9", "ghost prompt", &rules)
            .unwrap_err();
        assert!(matches!(err, GameError::PromptNotFound(_)));
    }

    #[test]
    fn test_sweep_fills_sentinels() {
        let (mut room, rules, ids) = seated_room(4);
        room.state = GameState::Prompt;
        room.prompts.push(Prompt::new(
            "r1_p0".to_string(),
            "text".to_string(),
            ids[0],
            ids[1],
        ));
        room.submit_answer(ids[0], "r1_p0", "only one side", &rules)
            .unwrap();
        room.player_mut(ids[0]).unwrap().prompts_assigned = vec!["r1_p0".to_string()];

        room.sweep_unanswered(NO_ANSWER);
        assert!(room.all_answers_in());
        assert_eq!(room.prompts[0].answer2.as_deref(), Some(NO_ANSWER));
        assert_eq!(room.prompts[0].answer1.as_deref(), Some("only one side"));
    }

    #[test]
    fn test_vote_rules() {
        let (mut room, rules, ids) = seated_room(4);
        let _ = rules;
        room.state = GameState::Voting;
        let mut prompt = Prompt::new("r1_p0".to_string(), "text".to_string(), ids[0], ids[1]);
        prompt.presented = true;
        room.prompts.push(prompt);

        // authors may not vote on their own matchup
        let err = room.submit_vote(ids[0], "r1_p0", 1).unwrap_err();
        assert_eq!(err, GameError::OwnMatchup);

        room.submit_vote(ids[2], "r1_p0", 1).unwrap();
        let err = room.submit_vote(ids[2], "r1_p0", 2).unwrap_err();
        assert_eq!(err, GameError::AlreadyVoted);
        // the failed re-vote changed nothing
        assert_eq!(room.prompts[0].votes1, 1);
        assert_eq!(room.prompts[0].votes2, 0);

        let err = room.submit_vote(ids[3], "r1_p0", 3).unwrap_err();
        assert_eq!(err, GameError::InvalidVote);

        room.submit_vote(ids[3], "r1_p0", 2).unwrap();
        assert!(room.matchup_votes_complete());
    }

    #[test]
    fn test_finale_answer_rules() {
        let (mut room, rules, ids) = seated_room(3);
        room.state = GameState::LastLash;
        room.last_lash = Some(LastLashRound {
            prompt: "And that is when the lights went out...".to_string(),
            mode: LastLashMode::Flashback,
            letters: None,
            instructions: None,
            answers: Vec::new(),
            votes: HashMap::new(),
            released: true,
            resolved: false,
        });

        assert!(room.submit_finale_answer(ids[0], "the cat did it", &rules).unwrap().is_none());
        let err = room
            .submit_finale_answer(ids[0], "twice", &rules)
            .unwrap_err();
        assert_eq!(err, GameError::AlreadySubmitted);
        assert!(!room.finale_answers_in());

        room.submit_finale_answer(ids[1], "", &rules).unwrap();
        room.submit_finale_answer(ids[2], "aliens", &rules).unwrap();
        assert!(room.finale_answers_in());
        // empty submission stored as the sentinel
        let lash = room.last_lash.as_ref().unwrap();
        assert_eq!(lash.answers[1].answer, NO_ANSWER);
    }

    #[test]
    fn test_finale_vote_rules() {
        let (mut room, rules, ids) = seated_room(4);
        room.state = GameState::LastLash;
        room.last_lash = Some(LastLashRound {
            prompt: "prompt".to_string(),
            mode: LastLashMode::Flashback,
            letters: None,
            instructions: None,
            answers: Vec::new(),
            votes: HashMap::new(),
            released: true,
            resolved: false,
        });
        for id in &ids[..3] {
            room.submit_finale_answer(*id, "an answer", &rules).unwrap();
        }
        room.state = GameState::LastLashVoting;

        let err = room.submit_finale_vote(ids[0], ids[0]).unwrap_err();
        assert_eq!(err, GameError::CannotVoteSelf);

        // ids[3] never answered, so it is not a valid target
        let err = room.submit_finale_vote(ids[0], ids[3]).unwrap_err();
        assert_eq!(err, GameError::InvalidTarget);

        room.submit_finale_vote(ids[0], ids[1]).unwrap();
        let err = room.submit_finale_vote(ids[0], ids[2]).unwrap_err();
        assert_eq!(err, GameError::AlreadyVoted);
    }

    #[test]
    fn test_scoreboard_ties_keep_join_order() {
        let (mut room, _rules, ids) = seated_room(4);
        room.add_score(ids[0], 500);
        room.add_score(ids[1], 500);
        room.add_score(ids[2], 300);
        room.add_score(ids[3], 200);

        let board = room.scoreboard();
        assert_eq!(board[0].player_id, ids[0]);
        assert_eq!(board[1].player_id, ids[1]);
        assert_eq!(board[0].score, 500);
        assert_eq!(board[1].score, 500);

        let winners = room.winners();
        assert_eq!(winners.len(), 2);
        assert!(winners.iter().any(|w| w.player_id == ids[0]));
        assert!(winners.iter().any(|w| w.player_id == ids[1]));
    }

    #[test]
    fn test_winners_of_empty_room() {
        let (room, _rules) = lobby_room();
        assert!(room.winners().is_empty());
    }

    #[test]
    fn test_host_rebind_requires_matching_identity() {
        let (mut room, _rules) = lobby_room();
        let conn = Uuid::new_v4();
        let err = room.rebind_host(Uuid::new_v4(), conn).unwrap_err();
        assert_eq!(err, GameError::InvalidHost);

        room.rebind_host(room.host_id, conn).unwrap();
        assert_eq!(room.host_connection, Some(conn));
        assert!(room.require_host(conn).is_ok());
        assert_eq!(
            room.require_host(Uuid::new_v4()).unwrap_err(),
            GameError::NotHost
        );
    }

    #[test]
    fn test_word_lash_soft_validation() {
        let letters = ['B', 'F', 'D'];
        assert!(
            validate_finale_answer(LastLashMode::WordLash, Some(&letters), "big fluffy dogs")
                .is_none()
        );
        // case-insensitive
        assert!(
            validate_finale_answer(LastLashMode::WordLash, Some(&letters), "Big Fluffy Dogs bark")
                .is_none()
        );
        assert!(
            validate_finale_answer(LastLashMode::WordLash, Some(&letters), "big scary dogs")
                .is_some()
        );
        assert!(validate_finale_answer(LastLashMode::WordLash, Some(&letters), "big").is_some());
    }

    #[test]
    fn test_acro_lash_requires_exact_word_count() {
        let letters = ['C', 'A', 'T'];
        assert!(
            validate_finale_answer(LastLashMode::AcroLash, Some(&letters), "cats attack tuesday")
                .is_none()
        );
        assert!(validate_finale_answer(
            LastLashMode::AcroLash,
            Some(&letters),
            "cats attack every tuesday"
        )
        .is_some());
    }

    #[test]
    fn test_flashback_and_sentinels_skip_validation() {
        assert!(validate_finale_answer(LastLashMode::Flashback, None, "anything").is_none());
        let letters = ['A', 'B'];
        assert!(
            validate_finale_answer(LastLashMode::WordLash, Some(&letters), NO_ANSWER).is_none()
        );
        assert!(validate_finale_answer(LastLashMode::AcroLash, Some(&letters), SKIPPED).is_none());
    }
}
