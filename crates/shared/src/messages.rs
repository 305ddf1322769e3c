//! WebSocket message types for engine-client communication.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Removing or renaming variants is a breaking change

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Client Messages (Client -> Engine)
// =============================================================================

/// Messages from a client to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Join (or create) a game session.
    #[serde(rename_all = "camelCase")]
    JoinSession { session_id: String, user_id: String },
    /// Roll the dice and move.
    RollDice,
    /// Buy the property the player stands on.
    #[serde(rename_all = "camelCase")]
    BuyProperty { space_id: String },
    /// Settle rent owed for the given property.
    #[serde(rename_all = "camelCase")]
    PayRent { space_id: String },
    /// End the current turn.
    EndTurn,
    /// Persist the session snapshot now.
    SaveSession,
    /// Heartbeat ping.
    Heartbeat,
}

// =============================================================================
// Server Messages (Engine -> Client)
// =============================================================================

/// Messages from the engine to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Reply to `JoinSession` with the full session snapshot.
    #[serde(rename_all = "camelCase")]
    SessionJoined {
        session_id: String,
        status: SessionStatus,
        state: serde_json::Value,
    },
    /// The session state changed; `state` is the full snapshot.
    #[serde(rename_all = "camelCase")]
    StateUpdate {
        session_id: String,
        state: serde_json::Value,
    },
    /// A dialog the client should show to this participant.
    #[serde(rename_all = "camelCase")]
    Prompt {
        prompt_type: PromptType,
        space_id: Option<String>,
        message: String,
    },
    /// A session-wide informational message.
    Notice { message: String },
    /// Reply to `SaveSession`.
    #[serde(rename_all = "camelCase")]
    SessionSaved { session_id: String },
    /// Structured error for the originating client.
    Error { code: ErrorCode, message: String },
    /// Heartbeat reply.
    Pong,
}

/// Whether a joined session was freshly created or already live/restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    NewSession,
    ExistingSession,
}

/// What kind of dialog a `Prompt` asks the client to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromptType {
    AskPurchase,
    Alert,
    PayRent,
    ActionSpace,
}

/// Machine-readable error category carried by `ServerMessage::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    AlreadyExists,
    InvalidCommand,
    ListenerFailure,
    Timeout,
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::InvalidCommand => "INVALID_COMMAND",
            ErrorCode::ListenerFailure => "LISTENER_FAILURE",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Internal => "INTERNAL",
        };
        write!(f, "{}", name)
    }
}
