//! Error types for listeners and sweeps.

use std::time::Duration;

use thiserror::Error;

use boardwalk_domain::{CommandKind, EventKind, SessionId};

use crate::store::StoreError;

/// Failure signalled by a single listener while handling one event.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The event requires an acting participant but carried none.
    #[error("event is missing an acting participant")]
    MissingParticipant,

    /// Something the listener needs is absent from the session view.
    #[error("{entity} not found in session view: {id}")]
    MissingEntity { entity: &'static str, id: String },

    /// The listener understood the event but refuses to act on it.
    #[error("{0}")]
    Rejected(String),
}

impl ListenerError {
    pub fn missing_entity(entity: &'static str, id: impl Into<String>) -> Self {
        Self::MissingEntity {
            entity,
            id: id.into(),
        }
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// Failure of one sweep, carrying enough context to diagnose which event,
/// listener or command broke it. State applied earlier in the sweep stays
/// applied - there is no cross-event rollback.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("listener '{listener}' failed handling {event}: {source}")]
    Listener {
        event: EventKind,
        listener: &'static str,
        source: ListenerError,
    },

    #[error("failed to apply {command}: {source}")]
    Apply {
        command: CommandKind,
        source: StoreError,
    },

    #[error("sweep timed out after {0:?}")]
    Timeout(Duration),
}
