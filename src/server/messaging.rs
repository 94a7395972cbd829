//! Connection fan-out.
//!
//! One bounded mpsc queue per connection, drained by that connection's send
//! task. Room-scoped broadcast shares a single `Arc<ServerMessage>` across
//! recipients. Sends never block a room's writer lane: a connection whose
//! queue is full has its message dropped with a warning and will resync on
//! reconnect.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::protocol::{ConnectionId, ErrorCode, ServerMessage};

/// Outbound queue depth per connection.
pub const OUTBOUND_QUEUE_DEPTH: usize = 64;

#[derive(Default)]
pub struct Messenger {
    senders: DashMap<ConnectionId, mpsc::Sender<Arc<ServerMessage>>>,
    rooms: DashMap<String, HashSet<ConnectionId>>,
}

impl Messenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a connection's outbound queue.
    pub fn register(&self, connection: ConnectionId, sender: mpsc::Sender<Arc<ServerMessage>>) {
        self.senders.insert(connection, sender);
    }

    /// Detach a connection; it silently leaves every room.
    pub fn unregister(&self, connection: ConnectionId) {
        self.senders.remove(&connection);
        for mut entry in self.rooms.iter_mut() {
            entry.value_mut().remove(&connection);
        }
    }

    pub fn join_room(&self, room_code: &str, connection: ConnectionId) {
        self.rooms
            .entry(room_code.to_string())
            .or_default()
            .insert(connection);
    }

    pub fn leave_room(&self, room_code: &str, connection: ConnectionId) {
        if let Some(mut members) = self.rooms.get_mut(room_code) {
            members.remove(&connection);
        }
    }

    /// Drop a room's membership set (the connections themselves survive).
    pub fn drop_room(&self, room_code: &str) {
        self.rooms.remove(room_code);
    }

    pub fn emit_to_connection(&self, connection: ConnectionId, message: ServerMessage) {
        self.send(connection, Arc::new(message));
    }

    /// Broadcast to every connection in a room.
    pub fn emit_to_room(&self, room_code: &str, message: ServerMessage) {
        let Some(members) = self.rooms.get(room_code) else {
            return;
        };
        let shared = Arc::new(message);
        for &connection in members.iter() {
            self.send(connection, Arc::clone(&shared));
        }
    }

    /// Shortcut for emitting to the room's current host connection.
    pub fn emit_to_host(&self, host_connection: Option<ConnectionId>, message: ServerMessage) {
        if let Some(connection) = host_connection {
            self.emit_to_connection(connection, message);
        }
    }

    pub fn emit_error(
        &self,
        connection: ConnectionId,
        message: impl Into<String>,
        code: Option<ErrorCode>,
    ) {
        self.emit_to_connection(
            connection,
            ServerMessage::Error {
                message: message.into(),
                code,
            },
        );
    }

    fn send(&self, connection: ConnectionId, message: Arc<ServerMessage>) {
        let Some(sender) = self.senders.get(&connection) else {
            return;
        };
        if let Err(err) = sender.try_send(message) {
            tracing::warn!(%connection, error = %err, "Dropping outbound message (queue full or closed)");
        }
    }
}
