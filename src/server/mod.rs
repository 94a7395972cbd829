//! Game server orchestration.
//!
//! [`GameServer`] owns the room registry, the connection fan-out, and the
//! prompt source. Inbound events and timer expiries both funnel through a
//! room's mutex, so each room has exactly one logical writer.

use std::sync::Arc;

use crate::config::{Config, CredentialStore, GameRules, ServerTuning};
use crate::game::prompts::FallbackPromptSource;
use crate::game::RoomRegistry;
use crate::protocol::{ConnectionId, GameError};

mod game_flow;
mod game_service;
mod maintenance;
mod message_router;
mod messaging;
mod room_service;

pub use messaging::{Messenger, OUTBOUND_QUEUE_DEPTH};

pub struct GameServer {
    registry: RoomRegistry,
    messenger: Messenger,
    prompts: FallbackPromptSource,
    credentials: Arc<CredentialStore>,
    config: Arc<Config>,
}

impl GameServer {
    pub fn new(config: Arc<Config>, credentials: Arc<CredentialStore>) -> Arc<Self> {
        let prompts = FallbackPromptSource::new(credentials.get_api_key());
        Arc::new(Self {
            registry: RoomRegistry::new(),
            messenger: Messenger::new(),
            prompts,
            credentials,
            config,
        })
    }

    /// A server with the local prompt bank only, no credentials and no
    /// disk access. Used for offline play and by the test suite.
    pub fn new_offline(config: Arc<Config>) -> Arc<Self> {
        Arc::new(Self {
            registry: RoomRegistry::new(),
            messenger: Messenger::new(),
            prompts: FallbackPromptSource::new(None),
            credentials: Arc::new(CredentialStore::ephemeral()),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &GameRules {
        &self.config.game
    }

    pub fn tuning(&self) -> &ServerTuning {
        &self.config.server
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn messenger(&self) -> &Messenger {
        &self.messenger
    }

    pub fn prompts(&self) -> &FallbackPromptSource {
        &self.prompts
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Report a handler failure to the offending connection only. Room state
    /// is unchanged by definition when this fires.
    pub(crate) fn report_error(&self, connection: ConnectionId, err: &GameError) {
        tracing::debug!(%connection, code = ?err.code(), "Rejected client action: {err}");
        self.messenger
            .emit_error(connection, err.to_string(), Some(err.code()));
    }
}
