//! Connection management for WebSocket clients.
//!
//! Tracks connected clients, their session membership, and the channel each
//! one is reachable on. Implements the `Notifier` port the rule listeners
//! use for out-of-band dialogs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use boardwalk_domain::{ParticipantId, SessionId};
use boardwalk_shared::ServerMessage;

use crate::rules::Notifier;

/// Information about a connected client.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Unique ID for this connection
    pub connection_id: Uuid,
    /// The session this connection has joined (if any)
    pub session_id: Option<SessionId>,
    /// The participant this connection acts as (if joined)
    pub participant_id: Option<ParticipantId>,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection not found")]
    NotFound,
}

/// Manages all active WebSocket connections.
pub struct ConnectionManager {
    /// Map of connection_id -> (ConnectionInfo, sender channel)
    connections: RwLock<HashMap<Uuid, (ConnectionInfo, mpsc::Sender<ServerMessage>)>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    pub async fn register(&self, connection_id: Uuid, sender: mpsc::Sender<ServerMessage>) {
        let info = ConnectionInfo {
            connection_id,
            session_id: None,
            participant_id: None,
            connected_at: Utc::now(),
        };
        let mut connections = self.connections.write().await;
        connections.insert(connection_id, (info, sender));
        tracing::debug!(connection_id = %connection_id, "Connection registered");
    }

    /// Unregister a connection, returning its last known info so the caller
    /// can clean up session membership.
    pub async fn unregister(&self, connection_id: Uuid) -> Option<ConnectionInfo> {
        let mut connections = self.connections.write().await;
        let removed = connections.remove(&connection_id).map(|(info, _)| info);
        if removed.is_some() {
            tracing::debug!(connection_id = %connection_id, "Connection unregistered");
        }
        removed
    }

    /// Get connection info by ID.
    pub async fn get(&self, connection_id: Uuid) -> Option<ConnectionInfo> {
        let connections = self.connections.read().await;
        connections
            .get(&connection_id)
            .map(|(info, _)| info.clone())
    }

    /// Mark a connection as acting for a participant in a session.
    pub async fn join_session(
        &self,
        connection_id: Uuid,
        session_id: SessionId,
        participant_id: ParticipantId,
    ) -> Result<(), ConnectionError> {
        let mut connections = self.connections.write().await;
        let Some((info, _)) = connections.get_mut(&connection_id) else {
            return Err(ConnectionError::NotFound);
        };
        info.session_id = Some(session_id.clone());
        info.participant_id = Some(participant_id.clone());
        tracing::info!(
            connection_id = %connection_id,
            session_id = %session_id,
            participant_id = %participant_id,
            "Connection joined session"
        );
        Ok(())
    }

    /// How many live connections act for this participant in this session.
    /// Used on disconnect to tell a closed tab from a departed player.
    pub async fn participant_connection_count(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
    ) -> usize {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|(info, _)| {
                info.session_id.as_ref() == Some(session_id)
                    && info.participant_id.as_ref() == Some(participant_id)
            })
            .count()
    }

    /// Broadcast a message to all connections in a session.
    pub async fn broadcast_to_session(&self, session_id: &SessionId, message: ServerMessage) {
        let connections = self.connections.read().await;
        for (info, sender) in connections.values() {
            if info.session_id.as_ref() == Some(session_id) {
                if let Err(e) = sender.try_send(message.clone()) {
                    tracing::warn!(
                        connection_id = %info.connection_id,
                        error = %e,
                        "Failed to broadcast message"
                    );
                }
            }
        }
    }

    /// Broadcast a message to all connections in a session except one.
    pub async fn broadcast_to_session_except(
        &self,
        session_id: &SessionId,
        exclude: Uuid,
        message: ServerMessage,
    ) {
        let connections = self.connections.read().await;
        for (info, sender) in connections.values() {
            if info.session_id.as_ref() == Some(session_id) && info.connection_id != exclude {
                if let Err(e) = sender.try_send(message.clone()) {
                    tracing::warn!(
                        connection_id = %info.connection_id,
                        error = %e,
                        "Failed to broadcast message"
                    );
                }
            }
        }
    }

    /// Send a message to every connection acting for one participant.
    pub async fn send_to_participant(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
        message: ServerMessage,
    ) {
        let connections = self.connections.read().await;
        for (info, sender) in connections.values() {
            if info.session_id.as_ref() == Some(session_id)
                && info.participant_id.as_ref() == Some(participant_id)
            {
                if let Err(e) = sender.try_send(message.clone()) {
                    tracing::warn!(
                        connection_id = %info.connection_id,
                        error = %e,
                        "Failed to send message to participant"
                    );
                }
            }
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for ConnectionManager {
    async fn notify(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
        message: ServerMessage,
    ) {
        self.send_to_participant(session_id, participant_id, message)
            .await;
    }

    async fn announce(&self, session_id: &SessionId, message: ServerMessage) {
        self.broadcast_to_session(session_id, message).await;
    }
}
