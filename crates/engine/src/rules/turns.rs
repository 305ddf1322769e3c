//! Turn rules: advancing the turn marker and announcing whose turn it is.

use std::sync::Arc;

use boardwalk_domain::{Command, CommandPayload, EventKind, EventPayload};
use boardwalk_shared::ServerMessage;

use crate::bus::{EventBus, ListenerError};

use super::Notifier;

pub(super) async fn register(bus: &EventBus, notifier: Arc<dyn Notifier>) {
    bus.subscribe(
        EventKind::TurnEndRequested,
        "turn-advance",
        |event, _view| {
            Box::pin(async move {
                let Some(participant_id) = event.participant_id.clone() else {
                    return Err(ListenerError::MissingParticipant);
                };
                // The store validates that the requester holds the turn.
                Ok(vec![Command::new(
                    event.session_id,
                    participant_id,
                    CommandPayload::EndTurn,
                )])
            })
        },
    )
    .await;

    bus.subscribe(
        EventKind::TurnEnded,
        "turn-announcements",
        move |event, view| {
            let notifier = Arc::clone(&notifier);
            Box::pin(async move {
                let EventPayload::TurnEnded = event.payload else {
                    return Ok(Vec::new());
                };
                // The view is post-apply, so this is the incoming turn.
                let message = match view.active_participant() {
                    Some(next) => format!("It is now {}'s turn.", next),
                    None => "The turn ended.".to_string(),
                };
                notifier
                    .announce(&event.session_id, ServerMessage::Notice { message })
                    .await;
                Ok(Vec::new())
            })
        },
    )
    .await;
}
