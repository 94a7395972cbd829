//! Process-wide room registry.
//!
//! Maps room codes to rooms and transport connections to their `(room,
//! role)` binding. The code map sits behind a reader-writer lock (readers
//! dominate: every game event is a lookup); each room carries its own mutex
//! as the single-writer lane for all mutation.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::GameRules;
use crate::protocol::validation::normalize_room_code;
use crate::protocol::{room_codes, ConnectionId, GameError, HostId, PlayerId};

use super::room::Room;

/// What a connection is to its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Player(PlayerId),
}

/// A connection's place in the world.
#[derive(Debug, Clone)]
pub struct Binding {
    pub room_code: String,
    pub role: Role,
}

#[derive(Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, Arc<Mutex<Room>>>>,
    bindings: DashMap<ConnectionId, Binding>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room with a fresh unique code. The caller becomes its host;
    /// a relaunched host shell may bring its previous `host_id` along.
    pub async fn create_room(
        &self,
        host_connection: ConnectionId,
        host_id: Option<HostId>,
        rules: &GameRules,
    ) -> (String, HostId, Arc<Mutex<Room>>) {
        let host_id = host_id.unwrap_or_else(Uuid::new_v4);
        let mut rooms = self.rooms.write().await;

        // Rejection sampling: 26^4 codes, collisions are rare
        let code = loop {
            let candidate = room_codes::generate_room_code(rules.room_code_length);
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let room = Arc::new(Mutex::new(Room::new(code.clone(), host_id, host_connection)));
        rooms.insert(code.clone(), Arc::clone(&room));
        drop(rooms);

        self.bind(
            host_connection,
            Binding {
                room_code: code.clone(),
                role: Role::Host,
            },
        );

        tracing::info!(room_code = %code, %host_id, "Room created");
        (code, host_id, room)
    }

    /// Case-insensitive lookup.
    pub async fn get(&self, code: &str) -> Option<Arc<Mutex<Room>>> {
        let code = normalize_room_code(code);
        self.rooms.read().await.get(&code).cloned()
    }

    pub async fn get_or_err(&self, code: &str) -> Result<Arc<Mutex<Room>>, GameError> {
        self.get(code).await.ok_or(GameError::RoomNotFound)
    }

    /// Remove a room. Returns it for final teardown (timer cancellation).
    pub async fn remove(&self, code: &str) -> Option<Arc<Mutex<Room>>> {
        let code = normalize_room_code(code);
        let removed = self.rooms.write().await.remove(&code);
        if removed.is_some() {
            self.bindings.retain(|_, binding| binding.room_code != code);
            tracing::info!(room_code = %code, "Room removed");
        }
        removed
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub fn bind(&self, connection: ConnectionId, binding: Binding) {
        self.bindings.insert(connection, binding);
    }

    pub fn unbind(&self, connection: ConnectionId) -> Option<Binding> {
        self.bindings.remove(&connection).map(|(_, binding)| binding)
    }

    pub fn binding_of(&self, connection: ConnectionId) -> Option<Binding> {
        self.bindings.get(&connection).map(|entry| entry.clone())
    }

    /// Resolve a connection to its room and role.
    pub async fn find_by_connection(
        &self,
        connection: ConnectionId,
    ) -> Option<(Binding, Arc<Mutex<Room>>)> {
        let binding = self.bindings.get(&connection)?.clone();
        let room = self.get(&binding.room_code).await?;
        Some((binding, room))
    }

    /// Connections currently bound to a room.
    pub fn connections_in_room(&self, code: &str) -> Vec<ConnectionId> {
        self.bindings
            .iter()
            .filter(|entry| entry.value().room_code == code)
            .map(|entry| *entry.key())
            .collect()
    }

    /// Collect and remove rooms older than `max_age`. Returns the removed
    /// rooms so the caller can cancel timers and drop fan-out state.
    pub async fn cleanup_older_than(
        &self,
        max_age: chrono::Duration,
    ) -> Vec<(String, Arc<Mutex<Room>>)> {
        let now = chrono::Utc::now();
        let candidates: Vec<(String, Arc<Mutex<Room>>)> = {
            let rooms = self.rooms.read().await;
            rooms
                .iter()
                .map(|(code, room)| (code.clone(), Arc::clone(room)))
                .collect()
        };

        let mut expired = Vec::new();
        for (code, room) in candidates {
            let created_at = room.lock().await.created_at;
            if now.signed_duration_since(created_at) > max_age {
                expired.push((code, room));
            }
        }

        if !expired.is_empty() {
            let mut rooms = self.rooms.write().await;
            for (code, _) in &expired {
                rooms.remove(code);
                self.bindings.retain(|_, binding| &binding.room_code != code);
            }
        }

        expired
    }
}
