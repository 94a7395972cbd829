use std::sync::Arc;
use std::time::Duration;

use crate::game::timer::TimerTask;
use crate::game::Role;
use crate::protocol::validation::validate_theme;
use crate::protocol::{ConnectionId, GameError, GameState, PlayerId, ServerMessage, SKIPPED};

use super::GameServer;

impl GameServer {
    /// Resolve which player a connection speaks for, scoped to one room.
    fn player_for(&self, connection: ConnectionId, room_code: &str) -> Result<PlayerId, GameError> {
        match self.registry().binding_of(connection) {
            Some(binding)
                if binding.room_code.eq_ignore_ascii_case(room_code.trim()) =>
            {
                match binding.role {
                    Role::Player(player_id) => Ok(player_id),
                    Role::Host => Err(GameError::NotInRoom),
                }
            }
            _ => Err(GameError::NotInRoom),
        }
    }

    /// `start_game`: host kicks off round one.
    pub(crate) async fn handle_start_game(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
        theme: Option<String>,
    ) -> Result<(), GameError> {
        let room_arc = self.room_or_err(room_code).await?;
        let mut room = room_arc.lock().await;
        room.require_host(connection)?;
        if room.state != GameState::Lobby {
            return Err(GameError::GameInProgress);
        }
        let min_players = self.rules().min_players;
        if room.players.len() < min_players {
            return Err(GameError::NotEnoughPlayers(min_players));
        }

        if let Some(theme) = theme {
            let theme = theme.trim().to_string();
            if !theme.is_empty() {
                validate_theme(&theme, self.rules())?;
                room.theme = Some(theme);
            }
        }

        tracing::info!(
            room_code = %room.code,
            players = room.players.len(),
            theme = room.theme.as_deref().unwrap_or(""),
            "Game started"
        );
        self.messenger().emit_to_room(
            &room.code,
            ServerMessage::GameStarted {
                room_code: room.code.clone(),
                theme: room.theme.clone(),
                total_rounds: self.rules().rounds_per_game,
            },
        );
        self.begin_prompt_round(&mut room).await;
        Ok(())
    }

    /// `submit_answer` (regular rounds).
    pub(crate) async fn handle_submit_answer(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
        prompt_id: Option<&str>,
        answer: &str,
    ) -> Result<(), GameError> {
        let prompt_id = prompt_id
            .ok_or_else(|| GameError::InvalidInput("promptId is required".to_string()))?;
        let room_arc = self.room_or_err(room_code).await?;
        let mut room = room_arc.lock().await;
        let player_id = self.player_for(connection, room_code)?;

        let (submitted, total) = room.submit_answer(player_id, prompt_id, answer, self.rules())?;

        let player_name = room
            .player(player_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        self.messenger().emit_to_room(
            &room.code,
            ServerMessage::PlayerSubmitted {
                player_id,
                player_name,
                answers_submitted: submitted,
                total_assigned: total,
            },
        );

        if !room.paused && room.all_answers_in() {
            room.cancel_timer();
            self.close_answer_phase(&mut room);
        }
        Ok(())
    }

    /// `submit_vote`: one ballot on the current matchup.
    pub(crate) async fn handle_submit_vote(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
        prompt_id: &str,
        vote: u8,
    ) -> Result<(), GameError> {
        let room_arc = self.room_or_err(room_code).await?;
        let mut room = room_arc.lock().await;
        let player_id = self.player_for(connection, room_code)?;

        room.submit_vote(player_id, prompt_id, vote)?;

        let player_name = room
            .player(player_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        self.messenger().emit_to_room(
            &room.code,
            ServerMessage::PlayerVoted {
                player_id,
                player_name,
            },
        );

        if !room.paused && room.matchup_votes_complete() {
            room.cancel_timer();
            self.resolve_current_matchup(&mut room);
        }
        Ok(())
    }

    /// `submit_answer` with the finale flag set.
    pub(crate) async fn handle_submit_finale_answer(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
        answer: &str,
    ) -> Result<(), GameError> {
        let room_arc = self.room_or_err(room_code).await?;
        let mut room = room_arc.lock().await;
        let player_id = self.player_for(connection, room_code)?;

        let warning = room.submit_finale_answer(player_id, answer, self.rules())?;
        if let Some(warning) = &warning {
            tracing::debug!(room_code = %room.code, %player_id, warning, "Finale answer with warning");
        }

        let player_name = room
            .player(player_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        self.messenger().emit_to_room(
            &room.code,
            ServerMessage::PlayerSubmitted {
                player_id,
                player_name,
                answers_submitted: 1,
                total_assigned: 1,
            },
        );

        if !room.paused && room.finale_answers_in() {
            room.cancel_timer();
            self.begin_finale_voting(&mut room);
        }
        Ok(())
    }

    /// `submit_last_lash_votes`: exactly one target in this build.
    pub(crate) async fn handle_submit_finale_votes(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
        votes: &[PlayerId],
    ) -> Result<(), GameError> {
        let [target] = votes else {
            return Err(GameError::InvalidVote);
        };
        let room_arc = self.room_or_err(room_code).await?;
        let mut room = room_arc.lock().await;
        let player_id = self.player_for(connection, room_code)?;

        room.submit_finale_vote(player_id, *target)?;

        let player_name = room
            .player(player_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        self.messenger().emit_to_room(
            &room.code,
            ServerMessage::PlayerVoted {
                player_id,
                player_name,
            },
        );

        if !room.paused && room.finale_votes_complete() {
            room.cancel_timer();
            self.resolve_finale(&mut room);
        }
        Ok(())
    }

    /// `skip_player`: host fills a slow player's outstanding answers.
    pub(crate) async fn handle_skip_player(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
        player_id: PlayerId,
    ) -> Result<(), GameError> {
        let room_arc = self.room_or_err(room_code).await?;
        let mut room = room_arc.lock().await;
        room.require_host(connection)?;
        if room.player(player_id).is_none() {
            return Err(GameError::NotInRoom);
        }

        match room.state {
            GameState::Prompt => {
                room.fill_player_answers(player_id, SKIPPED);
                tracing::info!(room_code = %room.code, %player_id, "Host skipped player answers");
                if !room.paused && room.all_answers_in() {
                    room.cancel_timer();
                    self.close_answer_phase(&mut room);
                }
                Ok(())
            }
            GameState::LastLash => {
                room.submit_finale_answer(player_id, SKIPPED, self.rules())?;
                tracing::info!(room_code = %room.code, %player_id, "Host skipped finale answer");
                if !room.paused && room.finale_answers_in() {
                    room.cancel_timer();
                    self.begin_finale_voting(&mut room);
                }
                Ok(())
            }
            _ => Err(GameError::InvalidState),
        }
    }

    /// `pause_game`: freeze the countdown where it stands.
    pub(crate) async fn handle_pause_game(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
    ) -> Result<(), GameError> {
        let room_arc = self.room_or_err(room_code).await?;
        let mut room = room_arc.lock().await;
        room.require_host(connection)?;
        if matches!(room.state, GameState::Lobby | GameState::GameOver) {
            return Err(GameError::InvalidState);
        }
        if room.paused {
            return Ok(());
        }

        room.paused = true;
        room.paused_in_state = Some(room.state);
        let remaining = room.timer.as_ref().map(|t| t.remaining_secs());
        room.cancel_timer();
        room.pause_remaining_secs = remaining;

        tracing::info!(room_code = %room.code, remaining = ?remaining, "Game paused");
        self.messenger()
            .emit_to_room(&room.code, ServerMessage::GamePaused { remaining });
        self.broadcast_room_update(&room);
        Ok(())
    }

    /// `resume_game`: re-arm the frozen countdown. The pending expiry action
    /// is reconstructed from the paused state, not from a captured closure.
    pub(crate) async fn handle_resume_game(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
    ) -> Result<(), GameError> {
        let room_arc = self.room_or_err(room_code).await?;
        let mut room = room_arc.lock().await;
        room.require_host(connection)?;
        if !room.paused {
            return Ok(());
        }

        room.paused = false;
        let paused_in = room.paused_in_state.take();
        let remaining = room.pause_remaining_secs.take();
        if paused_in.is_some_and(|state| state != room.state) {
            tracing::warn!(
                room_code = %room.code,
                ?paused_in,
                state = ?room.state,
                "Room state changed while paused"
            );
        }

        tracing::info!(room_code = %room.code, remaining = ?remaining, "Game resumed");
        self.messenger()
            .emit_to_room(&room.code, ServerMessage::GameResumed { remaining });
        self.broadcast_room_update(&room);

        if let Some(remaining) = remaining {
            if let Some(task) = TimerTask::resume_for(&room) {
                if remaining == 0 || Self::window_satisfied(&room, task) {
                    self.run_timer_task(&mut room, task).await;
                } else {
                    self.arm_timer(&mut room, task, Duration::from_secs(remaining));
                }
            }
        }
        Ok(())
    }

    /// `extend_time`: push the running countdown out.
    pub(crate) async fn handle_extend_time(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
        seconds: Option<u64>,
    ) -> Result<(), GameError> {
        let room_arc = self.room_or_err(room_code).await?;
        let mut room = room_arc.lock().await;
        room.require_host(connection)?;
        let extra = seconds.unwrap_or(self.tuning().default_extend_secs);

        if room.paused {
            if let Some(remaining) = room.pause_remaining_secs.as_mut() {
                *remaining += extra;
            }
            return Ok(());
        }

        let Some(timer) = room.timer.take() else {
            return Err(GameError::InvalidState);
        };
        let task = timer.task;
        let new_remaining = timer.remaining() + Duration::from_secs(extra);
        timer.cancel();

        tracing::info!(room_code = %room.code, extra, "Timer extended");
        self.arm_timer(&mut room, task, new_remaining);
        self.messenger().emit_to_room(
            &room.code,
            ServerMessage::TimerUpdate {
                remaining: new_remaining.as_secs(),
            },
        );
        Ok(())
    }

    /// `end_game`: host tears the game down from any non-terminal state.
    pub(crate) async fn handle_end_game(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
    ) -> Result<(), GameError> {
        let room_arc = self.room_or_err(room_code).await?;
        let code = {
            let mut room = room_arc.lock().await;
            room.require_host(connection)?;
            if room.state.is_terminal() {
                // already over; nothing left to end
                return Ok(());
            }
            tracing::info!(room_code = %room.code, state = ?room.state, "Host ended game");
            self.finish_game(&mut room);
            room.code.clone()
        };

        // Explicit end deletes the room; clients already hold the final view
        self.registry().remove(&code).await;
        self.messenger().drop_room(&code);
        Ok(())
    }

    /// `continue_last_wit`: host releases the finale prompt after the
    /// mode reveal.
    pub(crate) async fn handle_continue_last_wit(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
    ) -> Result<(), GameError> {
        let room_arc = self.room_or_err(room_code).await?;
        let mut room = room_arc.lock().await;
        room.require_host(connection)?;
        if room.state != GameState::LastLash {
            return Err(GameError::InvalidState);
        }
        let already_released = room
            .last_lash
            .as_ref()
            .map(|lash| lash.released)
            .unwrap_or(true);
        if already_released {
            return Ok(());
        }

        self.release_last_lash(&mut room);
        Ok(())
    }
}
