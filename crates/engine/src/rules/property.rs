//! Property rules: purchase and rent settlement, plus the notices that
//! follow a balance or ownership change.

use std::sync::Arc;

use boardwalk_domain::{Command, CommandPayload, EventKind, EventPayload, SpaceKind};
use boardwalk_shared::ServerMessage;

use crate::bus::{EventBus, ListenerError};

use super::Notifier;

pub(super) async fn register(bus: &EventBus, notifier: Arc<dyn Notifier>) {
    bus.subscribe(
        EventKind::PurchaseRequested,
        "purchase-settlement",
        |event, view| {
            Box::pin(async move {
                let Some(participant_id) = event.participant_id.clone() else {
                    return Err(ListenerError::MissingParticipant);
                };
                let EventPayload::PurchaseRequested { space_id } = &event.payload else {
                    return Ok(Vec::new());
                };
                let participant = view.participant(&participant_id).ok_or_else(|| {
                    ListenerError::missing_entity("participant", participant_id.as_str())
                })?;
                let space = view
                    .space_by_id(space_id)
                    .ok_or_else(|| ListenerError::missing_entity("space", space_id.as_str()))?;
                let SpaceKind::Property {
                    purchase_price,
                    owned_by,
                    ..
                } = &space.kind
                else {
                    return Err(ListenerError::rejected(format!(
                        "{} is not a purchasable property",
                        space.name
                    )));
                };
                if let Some(owner) = owned_by {
                    return Err(ListenerError::rejected(format!(
                        "{} is already owned by {}",
                        space.name, owner
                    )));
                }
                if participant.balance < *purchase_price {
                    return Err(ListenerError::rejected(format!(
                        "insufficient funds to purchase {} for ${}",
                        space.name, purchase_price
                    )));
                }

                // The debit and the transfer settle in this order; the store
                // re-checks both preconditions when applying.
                Ok(vec![
                    Command::new(
                        event.session_id.clone(),
                        participant_id.clone(),
                        CommandPayload::AdjustFunds {
                            delta: -purchase_price,
                        },
                    ),
                    Command::new(
                        event.session_id.clone(),
                        participant_id,
                        CommandPayload::TransferOwnership {
                            space_id: space_id.clone(),
                        },
                    ),
                ])
            })
        },
    )
    .await;

    bus.subscribe(
        EventKind::RentPaymentRequested,
        "rent-settlement",
        |event, view| {
            Box::pin(async move {
                let Some(payer_id) = event.participant_id.clone() else {
                    return Err(ListenerError::MissingParticipant);
                };
                let EventPayload::RentPaymentRequested { space_id } = &event.payload else {
                    return Ok(Vec::new());
                };
                let payer = view.participant(&payer_id).ok_or_else(|| {
                    ListenerError::missing_entity("participant", payer_id.as_str())
                })?;
                let space = view
                    .space_by_id(space_id)
                    .ok_or_else(|| ListenerError::missing_entity("space", space_id.as_str()))?;
                let SpaceKind::Property { rent, owned_by, .. } = &space.kind else {
                    return Err(ListenerError::rejected(format!(
                        "{} is not a rentable property",
                        space.name
                    )));
                };
                let Some(owner_id) = owned_by else {
                    return Err(ListenerError::rejected(format!(
                        "{} is unowned; no rent is due",
                        space.name
                    )));
                };
                if owner_id == &payer_id {
                    return Err(ListenerError::rejected(format!(
                        "you own {}; no rent is due",
                        space.name
                    )));
                }
                if payer.balance < *rent {
                    return Err(ListenerError::rejected(format!(
                        "insufficient funds to pay ${} rent for {}",
                        rent, space.name
                    )));
                }

                // Debit and credit are additive commands, never merged; the
                // apply order keeps the payer's balance from going negative.
                Ok(vec![
                    Command::new(
                        event.session_id.clone(),
                        payer_id,
                        CommandPayload::AdjustFunds { delta: -rent },
                    ),
                    Command::new(
                        event.session_id.clone(),
                        owner_id.clone(),
                        CommandPayload::AdjustFunds { delta: *rent },
                    ),
                ])
            })
        },
    )
    .await;

    {
        let notifier = Arc::clone(&notifier);
        bus.subscribe(EventKind::FundsAdjusted, "funds-notices", move |event, view| {
            let notifier = Arc::clone(&notifier);
            Box::pin(async move {
                let Some(participant_id) = event.participant_id.clone() else {
                    return Err(ListenerError::MissingParticipant);
                };
                let EventPayload::FundsAdjusted { delta } = event.payload else {
                    return Ok(Vec::new());
                };
                let balance = view
                    .participant(&participant_id)
                    .map(|p| p.balance)
                    .ok_or_else(|| {
                        ListenerError::missing_entity("participant", participant_id.as_str())
                    })?;
                notifier
                    .notify(
                        &event.session_id,
                        &participant_id,
                        ServerMessage::Notice {
                            message: format!(
                                "Your balance changed by ${:+}; it is now ${}.",
                                delta, balance
                            ),
                        },
                    )
                    .await;
                Ok(Vec::new())
            })
        })
        .await;
    }

    bus.subscribe(
        EventKind::PropertyPurchased,
        "purchase-announcements",
        move |event, view| {
            let notifier = Arc::clone(&notifier);
            Box::pin(async move {
                let Some(participant_id) = event.participant_id.clone() else {
                    return Err(ListenerError::MissingParticipant);
                };
                let EventPayload::PropertyPurchased { space_id } = &event.payload else {
                    return Ok(Vec::new());
                };
                let name = view
                    .space_by_id(space_id)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| space_id.to_string());
                notifier
                    .announce(
                        &event.session_id,
                        ServerMessage::Notice {
                            message: format!("{} purchased {}.", participant_id, name),
                        },
                    )
                    .await;
                Ok(Vec::new())
            })
        },
    )
    .await;
}
