//! Notification WebSocket handler.
//!
//! Clients connect with their access token in the `token` query parameter
//! and receive a stream of JSON events for files they can see.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// GET /api/events/ws?token={access_token} - Notification stream.
pub async fn events_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Response {
    let user_id = claims.sub;
    tracing::info!(user_id, "WebSocket connection from {}", claims.email);

    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

/// Pump registry events to the socket until either side closes.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: i64) {
    let (session_id, mut events) = state.sessions.register(user_id).await;

    tracing::debug!(user_id, session_id, "notification session started");

    let (mut ws_sender, mut ws_receiver) = socket.split();

    loop {
        tokio::select! {
            // Deliver queued events
            event = events.recv() => {
                match event {
                    Some(event) => {
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                if ws_sender.send(Message::Text(json)).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::error!("Failed to serialize event: {}", e);
                            }
                        }
                    }
                    // Registry dropped the sender
                    None => break,
                }
            }

            // The client only sends pings and close frames
            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws_sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("WebSocket error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    state.sessions.unregister(user_id, session_id).await;
    tracing::debug!(user_id, session_id, "notification session ended");
}
