use std::sync::Arc;

use crate::game::room::Room;
use crate::game::{Binding, Role};
use crate::network;
use crate::protocol::{
    AssignedPrompt, ConnectionId, FinaleEntry, GameError, GameState, HostId, LastLashDetails,
    PlayerId, ResyncView, ServerMessage,
};

use super::GameServer;

impl GameServer {
    /// `create_room`: the caller becomes host of a fresh lobby.
    pub(crate) async fn handle_create_room(
        self: &Arc<Self>,
        connection: ConnectionId,
        host_id: Option<HostId>,
    ) -> Result<(), GameError> {
        let (code, host_id, _room) = self
            .registry()
            .create_room(connection, host_id, self.rules())
            .await;
        self.messenger().join_room(&code, connection);

        self.messenger().emit_to_connection(
            connection,
            ServerMessage::RoomCreated {
                room_code: code,
                host_id,
                join_url: network::join_url(self.config().port),
            },
        );
        Ok(())
    }

    /// `join_room`: lobby admission.
    pub(crate) async fn handle_join_room(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
        player_name: &str,
    ) -> Result<(), GameError> {
        let room_arc = self.room_or_err(room_code).await?;
        let mut room = room_arc.lock().await;

        let player_id = room.add_player(player_name, connection, self.rules())?;
        self.registry().bind(
            connection,
            Binding {
                room_code: room.code.clone(),
                role: Role::Player(player_id),
            },
        );
        self.messenger().join_room(&room.code, connection);

        tracing::info!(room_code = %room.code, %player_id, player_name, "Player joined");
        self.messenger().emit_to_connection(
            connection,
            ServerMessage::RoomJoined {
                room_code: room.code.clone(),
                player_id,
                player_name: player_name.trim().to_string(),
            },
        );
        self.broadcast_room_update(&room);
        Ok(())
    }

    /// `rejoin`: reattach a disconnected player by stable identity.
    pub(crate) async fn handle_rejoin(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
        player_id: PlayerId,
    ) -> Result<(), GameError> {
        let room_arc = self.room_or_err(room_code).await?;
        let mut room = room_arc.lock().await;

        room.rebind_player(player_id, connection)?;
        self.registry().bind(
            connection,
            Binding {
                room_code: room.code.clone(),
                role: Role::Player(player_id),
            },
        );
        self.messenger().join_room(&room.code, connection);

        tracing::info!(room_code = %room.code, %player_id, "Player reconnected");
        let resync = self.build_resync(&room, Some(player_id));
        self.messenger()
            .emit_to_connection(connection, ServerMessage::RejoinSuccess(Box::new(resync)));
        self.broadcast_room_update(&room);
        Ok(())
    }

    /// `rejoin_host`: reattach the host display. Host disconnect is not an
    /// error state; the room kept running and is resent wholesale here.
    pub(crate) async fn handle_rejoin_host(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
        host_id: HostId,
    ) -> Result<(), GameError> {
        let room_arc = self.room_or_err(room_code).await?;
        let mut room = room_arc.lock().await;

        room.rebind_host(host_id, connection)?;
        self.registry().bind(
            connection,
            Binding {
                room_code: room.code.clone(),
                role: Role::Host,
            },
        );
        self.messenger().join_room(&room.code, connection);

        tracing::info!(room_code = %room.code, "Host reconnected");
        let resync = self.build_resync(&room, None);
        self.messenger().emit_to_connection(
            connection,
            ServerMessage::RejoinHostSuccess(Box::new(resync)),
        );
        self.broadcast_room_update(&room);
        Ok(())
    }

    /// `kick_player`: host removes a player from the lobby.
    pub(crate) async fn handle_kick_player(
        self: &Arc<Self>,
        connection: ConnectionId,
        room_code: &str,
        player_id: PlayerId,
    ) -> Result<(), GameError> {
        let room_arc = self.room_or_err(room_code).await?;
        let mut room = room_arc.lock().await;
        room.require_host(connection)?;
        if room.state != GameState::Lobby {
            // removing an author mid-round would orphan their matchups
            return Err(GameError::GameInProgress);
        }

        let player = room.remove_player(player_id).ok_or(GameError::NotInRoom)?;
        tracing::info!(room_code = %room.code, %player_id, name = %player.name, "Player kicked");

        if let Some(player_connection) = player.connection {
            self.messenger().emit_to_connection(
                player_connection,
                ServerMessage::PlayerKicked {
                    room_code: room.code.clone(),
                },
            );
            self.registry().unbind(player_connection);
            self.messenger().leave_room(&room.code, player_connection);
        }
        self.broadcast_room_update(&room);
        Ok(())
    }

    /// Transport detach. Players and hosts keep their identity; only the
    /// connection binding is severed.
    pub async fn handle_disconnect(self: &Arc<Self>, connection: ConnectionId) {
        self.messenger().unregister(connection);
        let Some(binding) = self.registry().unbind(connection) else {
            return;
        };
        let Some(room_arc) = self.registry().get(&binding.room_code).await else {
            return;
        };
        let mut room = room_arc.lock().await;

        match binding.role {
            Role::Player(player_id) => {
                room.mark_player_disconnected(player_id);
                tracing::info!(room_code = %room.code, %player_id, "Player disconnected");
            }
            Role::Host => {
                if room.host_connection == Some(connection) {
                    room.host_connection = None;
                    tracing::info!(room_code = %room.code, "Host disconnected");
                }
            }
        }
        self.broadcast_room_update(&room);
    }

    /// Broadcast the room snapshot to everyone attached.
    pub(crate) fn broadcast_room_update(&self, room: &Room) {
        self.messenger().emit_to_room(
            &room.code,
            ServerMessage::RoomUpdate(Box::new(room.snapshot(self.rules()))),
        );
    }

    /// Assemble the phase context a reconnecting client needs to redraw.
    pub(crate) fn build_resync(&self, room: &Room, for_player: Option<PlayerId>) -> ResyncView {
        let rules = self.rules();

        let pending_prompts = match (room.state, for_player) {
            (GameState::Prompt, Some(player_id)) => room
                .prompts
                .iter()
                .filter(|prompt| {
                    prompt.side_of(player_id).is_some_and(|side| {
                        let answered = if side == 1 {
                            prompt.answer1.is_some()
                        } else {
                            prompt.answer2.is_some()
                        };
                        !answered
                    })
                })
                .map(|prompt| AssignedPrompt {
                    id: prompt.id.clone(),
                    text: prompt.text.clone(),
                })
                .collect(),
            _ => Vec::new(),
        };

        let current_matchup = if room.state == GameState::Voting {
            room.current_prompt()
                .filter(|p| p.presented && !p.resolved)
                .and_then(|_| self.matchup_view(room))
        } else {
            None
        };

        let last_lash = match room.state {
            GameState::LastLash | GameState::LastLashVoting => room
                .last_lash
                .as_ref()
                .filter(|lash| lash.released)
                .map(|lash| LastLashDetails {
                    prompt: lash.prompt.clone(),
                    mode: lash.mode,
                    letters: lash.letters.clone(),
                    instructions: lash.instructions.clone(),
                    time_limit: rules.last_lash_answer_time_secs,
                }),
            _ => None,
        };

        let finale_entries = if room.state == GameState::LastLashVoting {
            room.last_lash
                .as_ref()
                .map(|lash| {
                    lash.answers
                        .iter()
                        .map(|answer| FinaleEntry {
                            player_id: answer.player,
                            answer: answer.answer.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        ResyncView {
            room: room.snapshot(rules),
            pending_prompts,
            current_matchup,
            last_lash,
            finale_entries,
            timer_remaining: room.timer_remaining_secs(),
        }
    }
}
