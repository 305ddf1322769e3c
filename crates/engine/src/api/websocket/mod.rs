//! WebSocket handling for client connections.
//!
//! Each inbound message is validated, mapped to an initiating event,
//! published into the first phase, and settled with one full sweep while the
//! session's lock is held. The resulting snapshot is broadcast to the whole
//! session; errors go back to the originating client only - a bad request
//! never takes the process down.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use boardwalk_domain::{GameEvent, ParticipantId, Phase, SessionId};
use boardwalk_shared::{ClientMessage, ErrorCode, ServerMessage};

use super::connections::ConnectionManager;
use crate::app::App;
use crate::bus::SweepError;
use crate::store::StoreError;

mod ws_play;
mod ws_session;

/// Buffer size for per-connection message channel.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

/// Combined state for WebSocket handlers.
pub struct WsState {
    pub app: Arc<App>,
    pub connections: Arc<ConnectionManager>,
}

/// WebSocket upgrade handler - entry point for new connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let connection_id = Uuid::new_v4();

    // Bounded channel for messages headed to this client.
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(CONNECTION_CHANNEL_BUFFER);
    state.connections.register(connection_id, tx.clone()).await;

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    // Forward messages from the channel to the socket.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(msg) => {
                    if let Some(response) = handle_message(msg, &state, connection_id).await {
                        if tx.try_send(response).is_err() {
                            tracing::warn!(
                                connection_id = %connection_id,
                                "Failed to send response, channel full or closed"
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        error = %e,
                        "Failed to parse message"
                    );
                    let error = ServerMessage::Error {
                        code: ErrorCode::BadRequest,
                        message: format!("Invalid message format: {}", e),
                    };
                    let _ = tx.try_send(error);
                }
            },
            Ok(Message::Ping(_)) => {
                let _ = tx.try_send(ServerMessage::Pong);
            }
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Clean up: drop the connection and, if this was the participant's last
    // one, remove them from the session (the store announces the departure
    // of their state; the remaining clients get a fresh snapshot).
    if let Some(info) = state.connections.unregister(connection_id).await {
        if let (Some(session_id), Some(participant_id)) = (info.session_id, info.participant_id) {
            let remaining = state
                .connections
                .participant_connection_count(&session_id, &participant_id)
                .await;
            if remaining == 0 {
                let lock = state.app.locks.for_session(&session_id);
                let _guard = lock.lock().await;
                match state.app.store.remove_participant(&session_id, &participant_id) {
                    Ok(()) => {
                        broadcast_snapshot(&state, &session_id).await;
                        state
                            .connections
                            .broadcast_to_session(
                                &session_id,
                                ServerMessage::Notice {
                                    message: format!("{} left the session.", participant_id),
                                },
                            )
                            .await;
                    }
                    Err(e) => {
                        tracing::warn!(
                            session_id = %session_id,
                            participant_id = %participant_id,
                            error = %e,
                            "Failed to remove participant on disconnect"
                        );
                    }
                }
            }
        }
    }
    send_task.abort();
    tracing::info!(connection_id = %connection_id, "WebSocket connection closed");
}

/// Dispatch one parsed client message.
async fn handle_message(
    msg: ClientMessage,
    state: &WsState,
    connection_id: Uuid,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::JoinSession {
            session_id,
            user_id,
        } => ws_session::handle_join_session(state, connection_id, session_id, user_id).await,
        ClientMessage::SaveSession => {
            ws_session::handle_save_session(state, connection_id).await
        }
        ClientMessage::RollDice => ws_play::handle_roll_dice(state, connection_id).await,
        ClientMessage::BuyProperty { space_id } => {
            ws_play::handle_buy_property(state, connection_id, space_id).await
        }
        ClientMessage::PayRent { space_id } => {
            ws_play::handle_pay_rent(state, connection_id, space_id).await
        }
        ClientMessage::EndTurn => ws_play::handle_end_turn(state, connection_id).await,
        ClientMessage::Heartbeat => Some(ServerMessage::Pong),
    }
}

/// Session and participant this connection acts as, or the error to return.
pub(super) async fn joined_context(
    state: &WsState,
    connection_id: Uuid,
) -> Result<(SessionId, ParticipantId), ServerMessage> {
    let Some(info) = state.connections.get(connection_id).await else {
        return Err(ServerMessage::Error {
            code: ErrorCode::Internal,
            message: "Unknown connection".to_string(),
        });
    };
    match (info.session_id, info.participant_id) {
        (Some(session_id), Some(participant_id)) => Ok((session_id, participant_id)),
        _ => Err(ServerMessage::Error {
            code: ErrorCode::BadRequest,
            message: "Join a session before playing".to_string(),
        }),
    }
}

/// Publish one initiating event, settle it with a full sweep, persist and
/// broadcast the resulting snapshot. This is the only place the bus, the
/// store and the transport meet.
pub(super) async fn run_action_sweep(
    state: &WsState,
    session_id: &SessionId,
    event: GameEvent,
) -> Result<(), ServerMessage> {
    let lock = state.app.locks.for_session(session_id);
    let _guard = lock.lock().await;

    state.app.bus.publish(Phase::Input, event);
    state
        .app
        .bus
        .process_all_phases(session_id)
        .await
        .map_err(sweep_error_to_message)?;

    let Some(snapshot) = state.app.store.get_session(session_id) else {
        return Err(ServerMessage::Error {
            code: ErrorCode::NotFound,
            message: format!("Session not found: {}", session_id),
        });
    };
    if let Err(e) = state.app.sessions.save_state(session_id, &snapshot).await {
        // Persistence is best-effort after a sweep; the live state stands.
        tracing::warn!(session_id = %session_id, error = %e, "Failed to persist snapshot");
    }

    broadcast_state(state, session_id, &snapshot).await;
    Ok(())
}

pub(super) async fn broadcast_snapshot(state: &WsState, session_id: &SessionId) {
    if let Some(snapshot) = state.app.store.get_session(session_id) {
        broadcast_state(state, session_id, &snapshot).await;
    }
}

async fn broadcast_state(
    state: &WsState,
    session_id: &SessionId,
    snapshot: &boardwalk_domain::SessionState,
) {
    match serde_json::to_value(snapshot) {
        Ok(json) => {
            state
                .connections
                .broadcast_to_session(
                    session_id,
                    ServerMessage::StateUpdate {
                        session_id: session_id.to_string(),
                        state: json,
                    },
                )
                .await;
        }
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "Failed to serialize snapshot");
        }
    }
}

/// Translate a sweep failure into the structured error for the originating
/// client.
fn sweep_error_to_message(err: SweepError) -> ServerMessage {
    let code = match &err {
        SweepError::SessionNotFound(_) => ErrorCode::NotFound,
        SweepError::Listener { .. } => ErrorCode::ListenerFailure,
        SweepError::Apply { source, .. } => match source {
            StoreError::NotFound { .. } => ErrorCode::NotFound,
            StoreError::AlreadyExists { .. } => ErrorCode::AlreadyExists,
            StoreError::InvalidCommand(_) => ErrorCode::InvalidCommand,
        },
        SweepError::Timeout(_) => ErrorCode::Timeout,
    };
    ServerMessage::Error {
        code,
        message: err.to_string(),
    }
}
