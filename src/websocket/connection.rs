use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::protocol::{ClientMessage, ConnectionId, ServerMessage};
use crate::server::{GameServer, OUTBOUND_QUEUE_DEPTH};

/// Drive one WebSocket connection: a send task draining the connection's
/// outbound queue and a receive task dispatching parsed client messages.
/// Either side closing tears both down and fires the disconnect hook.
pub(super) async fn handle_socket(socket: WebSocket, server: Arc<GameServer>, addr: SocketAddr) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Arc<ServerMessage>>(OUTBOUND_QUEUE_DEPTH);

    let connection: ConnectionId = Uuid::new_v4();
    server.messenger().register(connection, tx);
    tracing::info!(%connection, client_addr = %addr, "WebSocket connection established");

    let mut send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let json = match serde_json::to_string(message.as_ref()) {
                Ok(json) => json,
                Err(err) => {
                    tracing::error!(%connection, error = %err, "Failed to serialize outbound message");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let receive_server = Arc::clone(&server);
    let mut receive_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            let message = match result {
                Ok(message) => message,
                Err(err) => {
                    tracing::debug!(%connection, error = %err, "WebSocket receive error");
                    break;
                }
            };

            match message {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(parsed) => {
                        receive_server
                            .handle_client_message(connection, parsed)
                            .await;
                    }
                    Err(err) => {
                        tracing::debug!(%connection, error = %err, "Unparseable client message");
                        receive_server.messenger().emit_error(
                            connection,
                            "Unrecognized message",
                            None,
                        );
                    }
                },
                Message::Close(_) => break,
                // axum answers pings at the protocol level
                Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => receive_task.abort(),
        _ = &mut receive_task => {}
    }

    // Soft detach: identity survives, only the connection binding is severed
    server.handle_disconnect(connection).await;
    tracing::info!(%connection, "WebSocket connection closed");
}
