//! Session FSM entry actions and the timer scheduling glue.
//!
//! Timer expiries re-enter the room through the same mutex as inbound
//! events, so a handler in flight can never race an expiry on the same
//! room. Every armed timer carries a generation; a fire that lost the race
//! to a cancel-and-rearm is a no-op.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;

use crate::game::prompts::PromptSource;
use crate::game::room::{LastLashRound, Room};
use crate::game::timer::{ArmedTimer, TimerTask};
use crate::game::{pairing, scoring, Prompt};
use crate::protocol::{
    AssignedPrompt, FinaleEntry, FinaleResultEntry, LastLashDetails, MatchupResultView,
    MatchupSideResult, MatchupView, ServerMessage, NO_ANSWER,
};

use super::GameServer;

impl GameServer {
    // ------------------------------------------------------------------
    // Timer plumbing
    // ------------------------------------------------------------------

    /// Arm the room's countdown, replacing any existing one. Player-facing
    /// windows tick `TIMER_UPDATE` once a second; presentation holds run
    /// silently. On expiry the task emits a final `{remaining: 0}` tick and
    /// dispatches the expiry action through the room mutex.
    pub(crate) fn arm_timer(
        self: &Arc<Self>,
        room: &mut Room,
        task: TimerTask,
        duration: Duration,
    ) {
        room.cancel_timer();
        room.timer_generation += 1;
        let generation = room.timer_generation;
        let (timer, cancel) = ArmedTimer::new(task, duration, generation);
        let ticks = task.ticks();
        room.timer = Some(timer);

        let server = Arc::clone(self);
        let code = room.code.clone();
        tokio::spawn(async move {
            let mut remaining = duration;
            loop {
                let step = remaining.min(Duration::from_secs(1));
                tokio::select! {
                    () = cancel.cancelled() => return,
                    () = tokio::time::sleep(step) => {}
                }
                remaining = remaining.saturating_sub(step);
                if ticks {
                    server.messenger().emit_to_room(
                        &code,
                        ServerMessage::TimerUpdate {
                            remaining: remaining.as_secs(),
                        },
                    );
                }
                if remaining.is_zero() {
                    break;
                }
            }
            server.on_timer_expired(&code, generation).await;
        });
    }

    pub(crate) async fn on_timer_expired(self: &Arc<Self>, code: &str, generation: u64) {
        let Some(room_arc) = self.registry().get(code).await else {
            return;
        };
        let mut room = room_arc.lock().await;

        let current = room
            .timer
            .as_ref()
            .is_some_and(|timer| timer.generation == generation);
        if !current || room.paused {
            return;
        }
        let Some(task) = room.timer.take().map(|timer| timer.task) else {
            return;
        };

        tracing::debug!(room_code = %room.code, ?task, "Timer expired");
        self.run_timer_task(&mut room, task).await;
    }

    pub(crate) async fn run_timer_task(self: &Arc<Self>, room: &mut Room, task: TimerTask) {
        match task {
            TimerTask::AnswerWindow => self.close_answer_phase(room),
            TimerTask::MatchupIntro => self.present_matchup(room),
            TimerTask::VoteWindow => self.resolve_current_matchup(room),
            TimerTask::MatchupResultHold => {
                room.current_matchup += 1;
                self.present_matchup(room);
            }
            TimerTask::RoundScoresHold => self.after_round_scores(room).await,
            TimerTask::FinaleAnswerWindow => self.begin_finale_voting(room),
            TimerTask::FinaleVoteWindow => self.resolve_finale(room),
            TimerTask::FinaleResultsHold => self.finish_game(room),
        }
    }

    /// True when the countdown's closing condition was already met (e.g.
    /// every answer arrived while the room sat paused).
    pub(crate) fn window_satisfied(room: &Room, task: TimerTask) -> bool {
        match task {
            TimerTask::AnswerWindow => room.all_answers_in(),
            TimerTask::VoteWindow => room.matchup_votes_complete(),
            TimerTask::FinaleAnswerWindow => room.finale_answers_in(),
            TimerTask::FinaleVoteWindow => room.finale_votes_complete(),
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // PROMPT
    // ------------------------------------------------------------------

    /// Enter a writing round: draw prompts, pair authors, deal them out,
    /// and open the answer window.
    pub(crate) async fn begin_prompt_round(self: &Arc<Self>, room: &mut Room) {
        let rules = self.rules().clone();
        room.state = crate::protocol::GameState::Prompt;
        room.current_round += 1;
        room.current_matchup = 0;
        room.prompts.clear();
        room.reset_round_progress();

        let count = rules.prompt_count(room.players.len());
        let theme = room.theme.clone();
        let mut seen = std::mem::take(&mut room.used_prompt_texts);
        let texts = self
            .prompts()
            .generate_prompts(count, &mut seen, theme.as_deref())
            .await;
        room.used_prompt_texts = seen;

        let roster: Vec<_> = room.players.iter().map(|p| p.id).collect();
        let pairs = pairing::assign_pairs(&roster, rules.prompts_per_player);

        for (index, ((player1, player2), text)) in pairs.into_iter().zip(texts).enumerate() {
            let id = format!("r{}_p{}", room.current_round, index);
            for author in [player1, player2] {
                if let Some(player) = room.player_mut(author) {
                    player.prompts_assigned.push(id.clone());
                }
            }
            room.prompts.push(Prompt::new(id, text, player1, player2));
        }

        tracing::info!(
            room_code = %room.code,
            round = room.current_round,
            prompts = room.prompts.len(),
            "Writing round started"
        );

        self.messenger().emit_to_host(
            room.host_connection,
            ServerMessage::PromptPhase {
                round: room.current_round,
                total_rounds: rules.rounds_per_game,
                player_count: room.players.len(),
                time_limit: rules.answer_time_secs,
            },
        );

        for player in &room.players {
            let Some(connection) = player.connection else {
                continue;
            };
            let prompts: Vec<AssignedPrompt> = room
                .prompts
                .iter()
                .filter(|prompt| prompt.is_author(player.id))
                .map(|prompt| AssignedPrompt {
                    id: prompt.id.clone(),
                    text: prompt.text.clone(),
                })
                .collect();
            self.messenger().emit_to_connection(
                connection,
                ServerMessage::ReceivePrompts {
                    prompts,
                    time_limit: rules.answer_time_secs,
                },
            );
        }

        self.arm_timer(
            room,
            TimerTask::AnswerWindow,
            Duration::from_secs(rules.answer_time_secs),
        );
    }

    /// Close the answer window: silent sides get the no-answer sentinel.
    pub(crate) fn close_answer_phase(self: &Arc<Self>, room: &mut Room) {
        room.sweep_unanswered(NO_ANSWER);
        self.begin_voting_phase(room);
    }

    // ------------------------------------------------------------------
    // VOTING
    // ------------------------------------------------------------------

    pub(crate) fn begin_voting_phase(self: &Arc<Self>, room: &mut Room) {
        room.state = crate::protocol::GameState::Voting;
        room.current_matchup = 0;
        for player in &mut room.players {
            player.has_voted.clear();
        }

        self.messenger().emit_to_room(
            &room.code,
            ServerMessage::VotingPhase {
                matchup_count: room.prompts.len(),
            },
        );
        self.arm_timer(
            room,
            TimerTask::MatchupIntro,
            Duration::from_millis(self.tuning().voting_grace_ms),
        );
    }

    /// Put the current matchup on screen, or move to round scores when the
    /// round is out of matchups.
    pub(crate) fn present_matchup(self: &Arc<Self>, room: &mut Room) {
        if room.current_matchup >= room.prompts.len() {
            self.begin_scoring_phase(room);
            return;
        }

        if let Some(prompt) = room.current_prompt_mut() {
            prompt.presented = true;
        }
        let Some(view) = self.matchup_view(room) else {
            self.begin_scoring_phase(room);
            return;
        };

        self.messenger()
            .emit_to_room(&room.code, ServerMessage::VoteMatchup(Box::new(view)));
        self.arm_timer(
            room,
            TimerTask::VoteWindow,
            Duration::from_secs(self.rules().vote_time_secs),
        );
    }

    /// Close votes on the current matchup, score it, and show the result.
    pub(crate) fn resolve_current_matchup(self: &Arc<Self>, room: &mut Room) {
        let rules = self.rules().clone();
        let Some(prompt) = room.current_prompt_mut() else {
            self.begin_scoring_phase(room);
            return;
        };

        let answer1 = prompt.answer1.clone().unwrap_or_else(|| NO_ANSWER.to_string());
        let answer2 = prompt.answer2.clone().unwrap_or_else(|| NO_ANSWER.to_string());
        let outcome =
            scoring::matchup_points(&answer1, &answer2, prompt.votes1, prompt.votes2, &rules);
        prompt.is_jinx = outcome.is_jinx;
        prompt.quipwit = outcome.quipwit;
        prompt.resolved = true;

        let (prompt_id, prompt_text) = (prompt.id.clone(), prompt.text.clone());
        let (player1, player2) = (prompt.player1, prompt.player2);
        let (votes1, votes2) = (prompt.votes1, prompt.votes2);

        room.add_score(player1, outcome.points1);
        room.add_score(player2, outcome.points2);

        tracing::info!(
            room_code = %room.code,
            %prompt_id,
            is_jinx = outcome.is_jinx,
            quipwit = ?outcome.quipwit,
            "Matchup resolved"
        );

        let name_of = |room: &Room, id| {
            room.player(id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "???".to_string())
        };
        let result = MatchupResultView {
            prompt_id,
            prompt_text,
            player1: MatchupSideResult {
                player_id: player1,
                player_name: name_of(room, player1),
                answer: answer1,
                votes: votes1,
                points: outcome.points1,
                total_score: room.score_of(player1),
            },
            player2: MatchupSideResult {
                player_id: player2,
                player_name: name_of(room, player2),
                answer: answer2,
                votes: votes2,
                points: outcome.points2,
                total_score: room.score_of(player2),
            },
            is_jinx: outcome.is_jinx,
            quipwit: outcome.quipwit,
        };

        self.messenger()
            .emit_to_room(&room.code, ServerMessage::MatchupResult(Box::new(result)));
        self.arm_timer(
            room,
            TimerTask::MatchupResultHold,
            Duration::from_secs(self.tuning().matchup_result_hold_secs),
        );
    }

    pub(crate) fn matchup_view(&self, room: &Room) -> Option<MatchupView> {
        let prompt = room.current_prompt()?;
        let name_of = |id| {
            room.player(id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "???".to_string())
        };
        Some(MatchupView {
            prompt_id: prompt.id.clone(),
            prompt_text: prompt.text.clone(),
            answer1: prompt.answer1.clone().unwrap_or_else(|| NO_ANSWER.to_string()),
            answer2: prompt.answer2.clone().unwrap_or_else(|| NO_ANSWER.to_string()),
            player1_id: prompt.player1,
            player2_id: prompt.player2,
            player1_name: name_of(prompt.player1),
            player2_name: name_of(prompt.player2),
            matchup_index: room.current_matchup,
            total_matchups: room.prompts.len(),
            time_limit: self.rules().vote_time_secs,
        })
    }

    // ------------------------------------------------------------------
    // SCORING
    // ------------------------------------------------------------------

    pub(crate) fn begin_scoring_phase(self: &Arc<Self>, room: &mut Room) {
        room.state = crate::protocol::GameState::Scoring;
        self.messenger().emit_to_room(
            &room.code,
            ServerMessage::RoundScores {
                round: room.current_round,
                scoreboard: room.scoreboard(),
            },
        );
        self.arm_timer(
            room,
            TimerTask::RoundScoresHold,
            Duration::from_secs(self.tuning().round_scores_hold_secs),
        );
    }

    pub(crate) async fn after_round_scores(self: &Arc<Self>, room: &mut Room) {
        if room.current_round < self.rules().rounds_per_game {
            self.begin_prompt_round(room).await;
        } else {
            self.begin_last_lash(room).await;
        }
    }

    // ------------------------------------------------------------------
    // LAST LASH
    // ------------------------------------------------------------------

    /// Enter the finale: fetch the prompt, tease the mode, and wait for the
    /// host's `continue_last_wit` before releasing it.
    pub(crate) async fn begin_last_lash(self: &Arc<Self>, room: &mut Room) {
        room.state = crate::protocol::GameState::LastLash;

        let theme = room.theme.clone();
        let mut seen = std::mem::take(&mut room.used_prompt_texts);
        let lash = self
            .prompts()
            .generate_last_lash(&mut seen, theme.as_deref())
            .await;
        room.used_prompt_texts = seen;

        tracing::info!(room_code = %room.code, mode = ?lash.mode, "Finale started");
        room.last_lash = Some(LastLashRound {
            prompt: lash.prompt,
            mode: lash.mode,
            letters: lash.letters,
            instructions: lash.instructions.clone(),
            answers: Vec::new(),
            votes: std::collections::HashMap::new(),
            released: false,
            resolved: false,
        });

        self.messenger().emit_to_room(
            &room.code,
            ServerMessage::LastWitModeReveal {
                mode: lash.mode,
                instructions: lash.instructions,
            },
        );
    }

    /// Host confirmed the reveal: send the prompt out and open the window.
    pub(crate) fn release_last_lash(self: &Arc<Self>, room: &mut Room) {
        let time_limit = self.rules().last_lash_answer_time_secs;
        let Some(lash) = room.last_lash.as_mut() else {
            return;
        };
        lash.released = true;
        let details = LastLashDetails {
            prompt: lash.prompt.clone(),
            mode: lash.mode,
            letters: lash.letters.clone(),
            instructions: lash.instructions.clone(),
            time_limit,
        };

        self.messenger().emit_to_host(
            room.host_connection,
            ServerMessage::LastLashPhase(Box::new(details.clone())),
        );
        for player in &room.players {
            if let Some(connection) = player.connection {
                self.messenger().emit_to_connection(
                    connection,
                    ServerMessage::LastLashPrompt(Box::new(details.clone())),
                );
            }
        }

        self.arm_timer(
            room,
            TimerTask::FinaleAnswerWindow,
            Duration::from_secs(time_limit),
        );
    }

    /// Close finale answers and present the shuffled, anonymous ballot.
    pub(crate) fn begin_finale_voting(self: &Arc<Self>, room: &mut Room) {
        room.state = crate::protocol::GameState::LastLashVoting;

        let entries = match room.last_lash.as_mut() {
            Some(lash) => {
                lash.answers.shuffle(&mut rand::rng());
                lash.answers
                    .iter()
                    .map(|answer| FinaleEntry {
                        player_id: answer.player,
                        answer: answer.answer.clone(),
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        self.messenger().emit_to_room(
            &room.code,
            ServerMessage::LastLashVoting {
                entries,
                time_limit: self.rules().last_lash_vote_time_secs,
            },
        );
        self.arm_timer(
            room,
            TimerTask::FinaleVoteWindow,
            Duration::from_secs(self.rules().last_lash_vote_time_secs),
        );
    }

    /// Close finale votes, score, and show the sorted results.
    pub(crate) fn resolve_finale(self: &Arc<Self>, room: &mut Room) {
        let rules = self.rules().clone();
        let earnings = match room.last_lash.as_mut() {
            Some(lash) => {
                let earnings = scoring::score_finale(&mut lash.answers, &lash.votes, &rules);
                lash.resolved = true;
                earnings
            }
            None => {
                self.finish_game(room);
                return;
            }
        };

        for (&player, &points) in &earnings {
            room.add_score(player, points);
        }

        let mut results: Vec<FinaleResultEntry> = room
            .last_lash
            .as_ref()
            .map(|lash| {
                lash.answers
                    .iter()
                    .map(|answer| FinaleResultEntry {
                        player_id: answer.player,
                        player_name: room
                            .player(answer.player)
                            .map(|p| p.name.clone())
                            .unwrap_or_else(|| "???".to_string()),
                        answer: answer.answer.clone(),
                        votes: answer.votes,
                        points: answer.points,
                        is_winner: answer.is_winner,
                    })
                    .collect()
            })
            .unwrap_or_default();
        results.sort_by(|a, b| b.points.cmp(&a.points));

        self.messenger().emit_to_room(
            &room.code,
            ServerMessage::LastLashResults { answers: results },
        );
        self.arm_timer(
            room,
            TimerTask::FinaleResultsHold,
            Duration::from_secs(self.tuning().finale_results_hold_secs),
        );
    }

    // ------------------------------------------------------------------
    // GAME OVER
    // ------------------------------------------------------------------

    pub(crate) fn finish_game(self: &Arc<Self>, room: &mut Room) {
        room.cancel_timer();
        room.state = crate::protocol::GameState::GameOver;

        let winners = room.winners();
        tracing::info!(
            room_code = %room.code,
            winner_count = winners.len(),
            "Game over"
        );
        self.messenger().emit_to_room(
            &room.code,
            ServerMessage::GameOver {
                winners,
                scoreboard: room.scoreboard(),
            },
        );
    }
}
