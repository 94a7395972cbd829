use std::sync::Arc;

use crate::protocol::{ClientMessage, ConnectionId, GameError};

use super::GameServer;

impl GameServer {
    /// Route one inbound client message to its handler. Events on a single
    /// connection arrive here in order; ordering within a room is settled by
    /// the room mutex the handlers take.
    pub async fn handle_client_message(
        self: &Arc<Self>,
        connection: ConnectionId,
        message: ClientMessage,
    ) {
        let result = match message {
            ClientMessage::CreateRoom { host_id } => {
                self.handle_create_room(connection, host_id).await
            }
            ClientMessage::JoinRoom {
                room_code,
                player_name,
            } => self.handle_join_room(connection, &room_code, &player_name).await,
            ClientMessage::Rejoin {
                player_id,
                room_code,
            } => self.handle_rejoin(connection, &room_code, player_id).await,
            ClientMessage::RejoinHost { room_code, host_id } => {
                self.handle_rejoin_host(connection, &room_code, host_id).await
            }
            ClientMessage::StartGame { room_code, theme } => {
                self.handle_start_game(connection, &room_code, theme).await
            }
            ClientMessage::SubmitAnswer {
                room_code,
                prompt_id,
                answer,
                is_last_lash,
            } => {
                // One wire event, two meanings: the flag picks the handler
                if is_last_lash {
                    self.handle_submit_finale_answer(connection, &room_code, &answer)
                        .await
                } else {
                    self.handle_submit_answer(connection, &room_code, prompt_id.as_deref(), &answer)
                        .await
                }
            }
            ClientMessage::SubmitVote {
                room_code,
                prompt_id,
                vote,
            } => {
                self.handle_submit_vote(connection, &room_code, &prompt_id, vote)
                    .await
            }
            ClientMessage::SubmitLastLashVotes { room_code, votes } => {
                self.handle_submit_finale_votes(connection, &room_code, &votes)
                    .await
            }
            ClientMessage::SkipPlayer {
                room_code,
                player_id,
            } => self.handle_skip_player(connection, &room_code, player_id).await,
            ClientMessage::KickPlayer {
                room_code,
                player_id,
            } => self.handle_kick_player(connection, &room_code, player_id).await,
            ClientMessage::PauseGame { room_code } => {
                self.handle_pause_game(connection, &room_code).await
            }
            ClientMessage::ResumeGame { room_code } => {
                self.handle_resume_game(connection, &room_code).await
            }
            ClientMessage::ExtendTime { room_code, seconds } => {
                self.handle_extend_time(connection, &room_code, seconds).await
            }
            ClientMessage::EndGame { room_code } => {
                self.handle_end_game(connection, &room_code).await
            }
            ClientMessage::ContinueLastWit { room_code } => {
                self.handle_continue_last_wit(connection, &room_code).await
            }
        };

        if let Err(err) = result {
            self.report_error(connection, &err);
        }
    }

    /// Look up a room or fail the handler with `RoomNotFound`.
    pub(crate) async fn room_or_err(
        &self,
        code: &str,
    ) -> Result<std::sync::Arc<tokio::sync::Mutex<crate::game::Room>>, GameError> {
        self.registry().get_or_err(code).await
    }
}
