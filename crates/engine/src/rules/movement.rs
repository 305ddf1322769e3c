//! Movement rules: dice rolls into moves, the pass-start bonus, and the
//! dialog a player sees when they land.

use std::sync::Arc;

use boardwalk_domain::{
    Command, CommandPayload, EventKind, EventPayload, ParticipantId, SpaceKind,
};
use boardwalk_shared::{PromptType, ServerMessage};

use crate::bus::{EventBus, ListenerError};

use super::Notifier;

/// Credit for completing a lap of the board.
pub const PASS_START_BONUS: i64 = 200;

pub(super) async fn register(bus: &EventBus, notifier: Arc<dyn Notifier>) {
    bus.subscribe(EventKind::DiceRolled, "roll-to-move", |event, view| {
        Box::pin(async move {
            let Some(participant_id) = event.participant_id.clone() else {
                return Err(ListenerError::MissingParticipant);
            };
            let EventPayload::DiceRolled { roll } = event.payload else {
                return Ok(Vec::new());
            };
            let participant = view.participant(&participant_id).ok_or_else(|| {
                ListenerError::missing_entity("participant", participant_id.as_str())
            })?;
            let board_len = view.board_len();
            if board_len == 0 {
                return Err(ListenerError::rejected("session board is empty"));
            }
            let old_position = participant.position;
            let new_position = (old_position + roll as usize) % board_len;
            Ok(vec![Command::new(
                event.session_id,
                participant_id,
                CommandPayload::MovePlayer {
                    old_position,
                    new_position,
                },
            )])
        })
    })
    .await;

    bus.subscribe(
        EventKind::PlayerMoved,
        "passed-start-bonus",
        |event, _view| {
            Box::pin(async move {
                let Some(participant_id) = event.participant_id.clone() else {
                    return Err(ListenerError::MissingParticipant);
                };
                let EventPayload::PlayerMoved {
                    old_position,
                    new_position,
                } = event.payload
                else {
                    return Ok(Vec::new());
                };
                // Wrapping past the last index means a completed lap.
                if old_position >= new_position {
                    Ok(vec![Command::new(
                        event.session_id,
                        participant_id,
                        CommandPayload::AdjustFunds {
                            delta: PASS_START_BONUS,
                        },
                    )])
                } else {
                    Ok(Vec::new())
                }
            })
        },
    )
    .await;

    bus.subscribe(EventKind::PlayerMoved, "landing-prompts", move |event, view| {
        let notifier = Arc::clone(&notifier);
        Box::pin(async move {
            let Some(participant_id) = event.participant_id.clone() else {
                return Err(ListenerError::MissingParticipant);
            };
            let EventPayload::PlayerMoved { new_position, .. } = event.payload else {
                return Ok(Vec::new());
            };
            let participant = view.participant(&participant_id).ok_or_else(|| {
                ListenerError::missing_entity("participant", participant_id.as_str())
            })?;
            let Some(space) = view.space_at(new_position) else {
                return Err(ListenerError::missing_entity(
                    "space",
                    new_position.to_string(),
                ));
            };

            let prompt = match &space.kind {
                SpaceKind::Property {
                    purchase_price,
                    rent,
                    owned_by,
                } => landed_on_property_prompt(
                    &participant_id,
                    participant.balance,
                    &space.name,
                    &space.space_id,
                    *purchase_price,
                    *rent,
                    owned_by.as_ref(),
                ),
                SpaceKind::Action { action } => ServerMessage::Prompt {
                    prompt_type: PromptType::ActionSpace,
                    space_id: Some(space.space_id.to_string()),
                    message: format!("You landed on {} and must {}.", space.name, action),
                },
            };

            tracing::info!(
                session_id = %event.session_id,
                participant_id = %participant_id,
                space = %space.name,
                "Participant landed"
            );
            notifier
                .notify(&event.session_id, &participant_id, prompt)
                .await;
            Ok(Vec::new())
        })
    })
    .await;
}

fn landed_on_property_prompt(
    participant_id: &ParticipantId,
    balance: i64,
    name: &str,
    space_id: &boardwalk_domain::SpaceId,
    purchase_price: i64,
    rent: i64,
    owned_by: Option<&ParticipantId>,
) -> ServerMessage {
    let space_id = Some(space_id.to_string());
    match owned_by {
        None if balance >= purchase_price => ServerMessage::Prompt {
            prompt_type: PromptType::AskPurchase,
            space_id,
            message: format!(
                "Would you like to purchase {} for ${}?",
                name, purchase_price
            ),
        },
        None => ServerMessage::Prompt {
            prompt_type: PromptType::Alert,
            space_id,
            message: format!("You do not have enough money to purchase {}.", name),
        },
        Some(owner) if owner == participant_id => ServerMessage::Prompt {
            prompt_type: PromptType::Alert,
            space_id,
            message: format!("You already own {}.", name),
        },
        Some(owner) => ServerMessage::Prompt {
            prompt_type: PromptType::PayRent,
            space_id,
            message: format!("{} owns {}. You owe ${} in rent.", owner, name, rent),
        },
    }
}
