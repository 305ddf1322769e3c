//! Command vocabulary.
//!
//! A command is an immutable intent to mutate session state. The store owns
//! exactly one mutation rule per command kind; listeners only ever return
//! commands, they never touch state themselves. Every command can derive the
//! event announcing it happened - a pure function of the command's payload,
//! so the derivation can never observe (or require) store state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::event::{EventPayload, GameEvent};
use crate::ids::{ParticipantId, SessionId, SpaceId};

/// An immutable intent to mutate one participant's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub session_id: SessionId,
    pub participant_id: ParticipantId,
    pub payload: CommandPayload,
}

impl Command {
    pub fn new(
        session_id: SessionId,
        participant_id: ParticipantId,
        payload: CommandPayload,
    ) -> Self {
        Self {
            session_id,
            participant_id,
            payload,
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.payload.kind()
    }

    /// Derive the follow-up event describing this command once applied.
    ///
    /// Pure and side-effect free. Returns `None` for commands with no
    /// externally observable consequence; all current commands announce one.
    pub fn derived_event(&self) -> Option<GameEvent> {
        let payload = match &self.payload {
            CommandPayload::MovePlayer {
                old_position,
                new_position,
            } => EventPayload::PlayerMoved {
                old_position: *old_position,
                new_position: *new_position,
            },
            CommandPayload::AdjustFunds { delta } => EventPayload::FundsAdjusted { delta: *delta },
            CommandPayload::TransferOwnership { space_id } => EventPayload::PropertyPurchased {
                space_id: space_id.clone(),
            },
            CommandPayload::EndTurn => EventPayload::TurnEnded,
        };
        Some(GameEvent::for_participant(
            self.session_id.clone(),
            self.participant_id.clone(),
            payload,
        ))
    }
}

/// Type-specific payload of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandPayload {
    /// Overwrite the participant's position, keeping board occupancy in step.
    MovePlayer {
        old_position: usize,
        new_position: usize,
    },
    /// Add `delta` (possibly negative) to the participant's balance.
    AdjustFunds { delta: i64 },
    /// Hand an unowned property to the participant.
    TransferOwnership { space_id: SpaceId },
    /// Advance the turn past the participant.
    EndTurn,
}

impl CommandPayload {
    pub fn kind(&self) -> CommandKind {
        match self {
            CommandPayload::MovePlayer { .. } => CommandKind::MovePlayer,
            CommandPayload::AdjustFunds { .. } => CommandKind::AdjustFunds,
            CommandPayload::TransferOwnership { .. } => CommandKind::TransferOwnership,
            CommandPayload::EndTurn => CommandKind::EndTurn,
        }
    }
}

/// Closed tag over command types, used in diagnostics and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    MovePlayer,
    AdjustFunds,
    TransferOwnership,
    EndTurn,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::MovePlayer => "move_player",
            CommandKind::AdjustFunds => "adjust_funds",
            CommandKind::TransferOwnership => "transfer_ownership",
            CommandKind::EndTurn => "end_turn",
        };
        write!(f, "{}", name)
    }
}
