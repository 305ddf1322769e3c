//! Event vocabulary.
//!
//! An event is an immutable fact: something that already happened (or, for
//! the `*Requested` variants, an inbound intent the boundary has accepted as
//! a fact about what the participant asked for). Listeners consume events
//! read-only and answer with commands; events never mutate anything.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{ParticipantId, SessionId, SpaceId};

/// An immutable fact flowing through the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub session_id: SessionId,
    /// The acting participant. Session-wide events carry `None`.
    pub participant_id: Option<ParticipantId>,
    pub payload: EventPayload,
}

impl GameEvent {
    pub fn for_participant(
        session_id: SessionId,
        participant_id: ParticipantId,
        payload: EventPayload,
    ) -> Self {
        Self {
            session_id,
            participant_id: Some(participant_id),
            payload,
        }
    }

    pub fn session_wide(session_id: SessionId, payload: EventPayload) -> Self {
        Self {
            session_id,
            participant_id: None,
            payload,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

/// Type-specific payload of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventPayload {
    /// The participant rolled the dice (sum of both).
    DiceRolled { roll: u8 },
    /// The participant asked to buy the property they stand on.
    PurchaseRequested { space_id: SpaceId },
    /// The participant asked to settle rent for the given property.
    RentPaymentRequested { space_id: SpaceId },
    /// The participant asked to end their turn.
    TurnEndRequested,
    /// The participant's position changed (derived from `MovePlayer`).
    PlayerMoved {
        old_position: usize,
        new_position: usize,
    },
    /// The participant's balance changed (derived from `AdjustFunds`).
    FundsAdjusted { delta: i64 },
    /// Ownership of a property was transferred to the participant
    /// (derived from `TransferOwnership`).
    PropertyPurchased { space_id: SpaceId },
    /// The participant's turn ended (derived from `EndTurn`).
    TurnEnded,
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::DiceRolled { .. } => EventKind::DiceRolled,
            EventPayload::PurchaseRequested { .. } => EventKind::PurchaseRequested,
            EventPayload::RentPaymentRequested { .. } => EventKind::RentPaymentRequested,
            EventPayload::TurnEndRequested => EventKind::TurnEndRequested,
            EventPayload::PlayerMoved { .. } => EventKind::PlayerMoved,
            EventPayload::FundsAdjusted { .. } => EventKind::FundsAdjusted,
            EventPayload::PropertyPurchased { .. } => EventKind::PropertyPurchased,
            EventPayload::TurnEnded => EventKind::TurnEnded,
        }
    }
}

/// Closed tag used to key listener registration. Dispatch is by this tag,
/// never by name strings, so a registry over it is exhaustiveness-checkable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    DiceRolled,
    PurchaseRequested,
    RentPaymentRequested,
    TurnEndRequested,
    PlayerMoved,
    FundsAdjusted,
    PropertyPurchased,
    TurnEnded,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::DiceRolled => "dice_rolled",
            EventKind::PurchaseRequested => "purchase_requested",
            EventKind::RentPaymentRequested => "rent_payment_requested",
            EventKind::TurnEndRequested => "turn_end_requested",
            EventKind::PlayerMoved => "player_moved",
            EventKind::FundsAdjusted => "funds_adjusted",
            EventKind::PropertyPurchased => "property_purchased",
            EventKind::TurnEnded => "turn_ended",
        };
        write!(f, "{}", name)
    }
}
