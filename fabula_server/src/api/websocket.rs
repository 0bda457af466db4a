//! WebSocket handler for live room updates.
//!
//! A socket is one player session. The server issues a fresh session id,
//! joins the room under the requested name and then pushes the player's view
//! of the room after every change, whoever caused it. Commands come in as
//! tagged JSON and are answered on the same socket.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws/{room_id}?name=<name>`
//! 2. Server joins the room (creating it if needed) and sends `welcome`
//!    followed by a first `view`
//! 3. Server spawns a send task that forwards room notifications and command
//!    responses
//! 4. On disconnect the player leaves the room
//!
//! Joining under a name already playing in a running game takes that seat
//! over; the old socket is left watching as an onlooker.
//!
//! # Client Messages
//!
//! ```json
//! {"type": "start_game"}
//! {"type": "give_hint", "card_id": 12, "hint": "a quiet harbour"}
//! {"type": "choose_card", "card_id": 40}
//! {"type": "vote", "card_id": 12}
//! {"type": "next_round"}
//! {"type": "restart"}
//! {"type": "leave"}
//! ```
//!
//! # Server Messages
//!
//! ```json
//! {"type": "welcome", "session_id": "…", "outcome": "seated"}
//! {"type": "view", "view": { … }}
//! {"type": "success", "message": "vote accepted"}
//! {"type": "error", "code": "validation.own_card", "message": "…"}
//! {"type": "closed"}
//! ```

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use fabula::{CardId, RegistryError, RoomId, RoomNotification, RoomSnapshot, RoomView, SessionId};
use futures_util::{SinkExt, StreamExt};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{
    AppState,
    error::error_code,
    rate_limiter::SocketThrottle,
    rooms::{join_and_track, leave_and_track, outcome_label, track, track_vote},
};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    name: String,
}

/// Commands a client can send
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    StartGame,
    GiveHint { card_id: CardId, hint: String },
    ChooseCard { card_id: CardId },
    Vote { card_id: CardId },
    NextRound,
    Restart,
    /// Leave the room and close the socket
    Leave,
}

/// Messages sent to the client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    Welcome {
        session_id: SessionId,
        outcome: &'static str,
    },
    View {
        view: Box<RoomView>,
    },
    Success {
        message: String,
    },
    Error {
        code: String,
        message: String,
    },
    /// The room was destroyed
    Closed,
}

impl ServerMessage {
    fn view(snapshot: &RoomSnapshot, session: &SessionId) -> Self {
        ServerMessage::View {
            view: Box::new(snapshot.view_for(Some(session))),
        }
    }

    fn error(err: &RegistryError) -> Self {
        ServerMessage::Error {
            code: error_code(err),
            message: err.to_string(),
        }
    }

    fn to_text(&self) -> Option<Message> {
        match serde_json::to_string(self) {
            Ok(json) => Some(Message::Text(json.into())),
            Err(e) => {
                error!("Failed to serialize server message: {}", e);
                None
            }
        }
    }
}

/// Upgrade an HTTP connection to a room session.
///
/// # Path Parameters
///
/// - `room_id`: Room to join
///
/// # Query Parameters
///
/// - `name`: Display name to sit down under
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<RoomId>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, room_id, query.name, state))
}

async fn handle_socket(socket: WebSocket, room_id: RoomId, name: String, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let session = SessionId::generate();

    metrics::websocket_connections_total();
    metrics::websocket_connections_active(1.0);

    let reply = match join_and_track(&state, &room_id, &name, session.clone()).await {
        Ok(reply) => reply,
        Err(err) => {
            info!("WebSocket join refused: room={}, name={}: {}", room_id, name, err);
            if let Some(msg) = ServerMessage::error(&err).to_text() {
                let _ = sender.send(msg).await;
            }
            let _ = sender.send(Message::Close(None)).await;
            metrics::websocket_connections_active(-1.0);
            return;
        }
    };

    info!(
        "WebSocket connected: room={}, name={}, session={}",
        room_id, name, session
    );

    let (notification_tx, mut notification_rx) = mpsc::channel::<RoomNotification>(32);
    if let Err(e) = state
        .registry
        .subscribe(&room_id, session.clone(), notification_tx)
        .await
    {
        error!("Failed to subscribe to room {} notifications: {}", room_id, e);
    }

    // Channel for command responses from the receive loop
    let (response_tx, mut response_rx) = mpsc::channel::<ServerMessage>(32);
    let _ = response_tx
        .send(ServerMessage::Welcome {
            session_id: session.clone(),
            outcome: outcome_label(&reply.outcome),
        })
        .await;
    let _ = response_tx
        .send(ServerMessage::view(&reply.snapshot, &session))
        .await;

    let send_session = session.clone();
    let send_task = tokio::spawn(async move {
        loop {
            let outgoing = tokio::select! {
                Some(notification) = notification_rx.recv() => match notification {
                    RoomNotification::StateChanged { snapshot, .. } => {
                        ServerMessage::view(&snapshot, &send_session)
                    }
                    RoomNotification::Closed => ServerMessage::Closed,
                },
                Some(response) = response_rx.recv() => response,
                else => break,
            };

            let closing = matches!(outgoing, ServerMessage::Closed);
            if let Some(msg) = outgoing.to_text() {
                if sender.send(msg).await.is_err() {
                    break;
                }
                metrics::websocket_messages_sent();
            }
            if closing {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    });

    let mut throttle = SocketThrottle::default();
    let mut left = false;

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                metrics::websocket_messages_received();

                if let Err(limit) = throttle.check() {
                    warn!(
                        "{:?} rate limit exceeded for session {} (room {}). Dropping message.",
                        limit, session, room_id
                    );
                    let _ = response_tx
                        .send(ServerMessage::Error {
                            code: "rate_limited".to_string(),
                            message: limit.message().to_string(),
                        })
                        .await;
                    continue;
                }

                let response = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(command) => {
                        left = matches!(command, ClientMessage::Leave);
                        handle_command(command, &room_id, &session, &state).await
                    }
                    Err(e) => {
                        warn!("Failed to parse client message: {}", e);
                        ServerMessage::Error {
                            code: "invalid_message".to_string(),
                            message: "Invalid message format".to_string(),
                        }
                    }
                };

                if response_tx.send(response).await.is_err() || left {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: room={}, session={}", room_id, session);
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    // Let the send task flush what's queued, then stop it.
    drop(response_tx);
    if left {
        let _ = send_task.await;
    } else {
        send_task.abort();
        state.registry.unsubscribe(&room_id, session.clone()).await;
        match leave_and_track(&state, &session).await {
            Ok(_) => info!(
                "Session {} automatically left room {} on disconnect",
                session, room_id
            ),
            // Seat already taken over by a newer session, or the room is gone.
            Err(e) => info!("Nothing to leave for session {}: {}", session, e),
        }
    }

    metrics::websocket_connections_active(-1.0);
    info!("WebSocket disconnected: room={}, session={}", room_id, session);
}

/// Run one command against the room and turn the outcome into a reply.
///
/// On success the acting player gets a short acknowledgement; the new view
/// arrives separately through the room notification. Leaving also closes
/// the socket, which the receive loop takes care of.
async fn handle_command(
    command: ClientMessage,
    room_id: &RoomId,
    session: &SessionId,
    state: &AppState,
) -> ServerMessage {
    let registry = &state.registry;
    let (kind, result) = match command {
        ClientMessage::StartGame => ("start_game", registry.start_game(room_id).await),
        ClientMessage::GiveHint { card_id, hint } => (
            "give_hint",
            registry.give_hint(room_id, session, card_id, &hint).await,
        ),
        ClientMessage::ChooseCard { card_id } => (
            "choose_card",
            registry.choose_card(room_id, session, card_id).await,
        ),
        ClientMessage::Vote { card_id } => {
            let result = registry.vote(room_id, session, card_id).await;
            if let Ok(snapshot) = &result {
                track_vote(snapshot);
            }
            ("vote", result)
        }
        ClientMessage::NextRound => ("next_round", registry.next_round(room_id).await),
        ClientMessage::Restart => ("restart", registry.restart(room_id).await),
        ClientMessage::Leave => {
            return match leave_and_track(state, session).await {
                Ok(_) => ServerMessage::Success {
                    message: "left the room".to_string(),
                },
                Err(err) => ServerMessage::error(&err),
            };
        }
    };

    track(room_id, kind, &result);
    match result {
        Ok(_) => ServerMessage::Success {
            message: format!("{} accepted", kind.replace('_', " ")),
        },
        Err(err) => ServerMessage::error(&err),
    }
}
