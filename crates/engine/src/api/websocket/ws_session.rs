//! Session lifecycle handlers: join (create/restore) and explicit save.

use uuid::Uuid;

use boardwalk_domain::{ParticipantId, SessionId};
use boardwalk_shared::{ErrorCode, ServerMessage, SessionStatus};

use super::{joined_context, WsState};

pub(super) async fn handle_join_session(
    state: &WsState,
    connection_id: Uuid,
    session_id: String,
    user_id: String,
) -> Option<ServerMessage> {
    let session_id = match SessionId::new(session_id) {
        Ok(id) => id,
        Err(e) => {
            return Some(ServerMessage::Error {
                code: ErrorCode::BadRequest,
                message: e.to_string(),
            })
        }
    };
    let participant_id = match ParticipantId::new(user_id) {
        Ok(id) => id,
        Err(e) => {
            return Some(ServerMessage::Error {
                code: ErrorCode::BadRequest,
                message: e.to_string(),
            })
        }
    };

    // The session lock also serializes join against in-flight sweeps.
    let lock = state.app.locks.for_session(&session_id);
    let _guard = lock.lock().await;

    let status = if state.app.store.has_session(&session_id) {
        SessionStatus::ExistingSession
    } else {
        match state.app.sessions.load_latest_state(&session_id).await {
            Ok(Some(snapshot)) => match state.app.store.insert_restored(snapshot) {
                Ok(()) => SessionStatus::ExistingSession,
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "Restore raced a live session");
                    SessionStatus::ExistingSession
                }
            },
            Ok(None) => match state.app.store.create_session(&session_id) {
                Ok(_) => SessionStatus::NewSession,
                Err(e) => {
                    return Some(ServerMessage::Error {
                        code: ErrorCode::AlreadyExists,
                        message: e.to_string(),
                    })
                }
            },
            Err(e) => {
                // A broken snapshot store must not block play; start fresh.
                tracing::error!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to load snapshot; creating a fresh session"
                );
                match state.app.store.create_session(&session_id) {
                    Ok(_) => SessionStatus::NewSession,
                    Err(e) => {
                        return Some(ServerMessage::Error {
                            code: ErrorCode::AlreadyExists,
                            message: e.to_string(),
                        })
                    }
                }
            }
        }
    };

    if let Err(e) = state
        .app
        .store
        .add_participant(&session_id, &participant_id)
    {
        return Some(ServerMessage::Error {
            code: ErrorCode::Internal,
            message: e.to_string(),
        });
    }
    if state
        .connections
        .join_session(connection_id, session_id.clone(), participant_id.clone())
        .await
        .is_err()
    {
        return Some(ServerMessage::Error {
            code: ErrorCode::Internal,
            message: "Connection vanished during join".to_string(),
        });
    }

    let Some(snapshot) = state.app.store.get_session(&session_id) else {
        return Some(ServerMessage::Error {
            code: ErrorCode::NotFound,
            message: format!("Session not found: {}", session_id),
        });
    };
    let state_json = match serde_json::to_value(&snapshot) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "Failed to serialize snapshot");
            return Some(ServerMessage::Error {
                code: ErrorCode::Internal,
                message: "Failed to serialize session state".to_string(),
            });
        }
    };

    // Everyone already in the session sees the new participant.
    state
        .connections
        .broadcast_to_session_except(
            &session_id,
            connection_id,
            ServerMessage::StateUpdate {
                session_id: session_id.to_string(),
                state: state_json.clone(),
            },
        )
        .await;

    Some(ServerMessage::SessionJoined {
        session_id: session_id.to_string(),
        status,
        state: state_json,
    })
}

pub(super) async fn handle_save_session(
    state: &WsState,
    connection_id: Uuid,
) -> Option<ServerMessage> {
    let (session_id, _participant_id) = match joined_context(state, connection_id).await {
        Ok(context) => context,
        Err(error) => return Some(error),
    };

    let lock = state.app.locks.for_session(&session_id);
    let _guard = lock.lock().await;

    let Some(snapshot) = state.app.store.get_session(&session_id) else {
        return Some(ServerMessage::Error {
            code: ErrorCode::NotFound,
            message: format!("Session not found: {}", session_id),
        });
    };
    match state.app.sessions.save_state(&session_id, &snapshot).await {
        Ok(()) => Some(ServerMessage::SessionSaved {
            session_id: session_id.to_string(),
        }),
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "Failed to save session");
            Some(ServerMessage::Error {
                code: ErrorCode::Internal,
                message: "Failed to save session".to_string(),
            })
        }
    }
}
