//! Gameplay handlers: each maps the request to an initiating event and runs
//! one sweep.

use rand::Rng;
use uuid::Uuid;

use boardwalk_domain::{EventPayload, GameEvent, SpaceId};
use boardwalk_shared::{ErrorCode, ServerMessage};

use super::{joined_context, run_action_sweep, WsState};

pub(super) async fn handle_roll_dice(
    state: &WsState,
    connection_id: Uuid,
) -> Option<ServerMessage> {
    let (session_id, participant_id) = match joined_context(state, connection_id).await {
        Ok(context) => context,
        Err(error) => return Some(error),
    };

    let roll = {
        let mut rng = rand::thread_rng();
        rng.gen_range(1..=6) + rng.gen_range(1..=6)
    };
    tracing::info!(
        session_id = %session_id,
        participant_id = %participant_id,
        roll,
        "Dice rolled"
    );

    let event = GameEvent::for_participant(
        session_id.clone(),
        participant_id.clone(),
        EventPayload::DiceRolled { roll },
    );
    if let Err(error) = run_action_sweep(state, &session_id, event).await {
        return Some(error);
    }

    state
        .connections
        .broadcast_to_session(
            &session_id,
            ServerMessage::Notice {
                message: format!("{} rolled a {}.", participant_id, roll),
            },
        )
        .await;
    None
}

pub(super) async fn handle_buy_property(
    state: &WsState,
    connection_id: Uuid,
    space_id: String,
) -> Option<ServerMessage> {
    let (session_id, participant_id) = match joined_context(state, connection_id).await {
        Ok(context) => context,
        Err(error) => return Some(error),
    };
    let space_id = match SpaceId::new(space_id) {
        Ok(id) => id,
        Err(e) => {
            return Some(ServerMessage::Error {
                code: ErrorCode::BadRequest,
                message: e.to_string(),
            })
        }
    };

    let event = GameEvent::for_participant(
        session_id.clone(),
        participant_id,
        EventPayload::PurchaseRequested { space_id },
    );
    run_action_sweep(state, &session_id, event).await.err()
}

pub(super) async fn handle_pay_rent(
    state: &WsState,
    connection_id: Uuid,
    space_id: String,
) -> Option<ServerMessage> {
    let (session_id, participant_id) = match joined_context(state, connection_id).await {
        Ok(context) => context,
        Err(error) => return Some(error),
    };
    let space_id = match SpaceId::new(space_id) {
        Ok(id) => id,
        Err(e) => {
            return Some(ServerMessage::Error {
                code: ErrorCode::BadRequest,
                message: e.to_string(),
            })
        }
    };

    let event = GameEvent::for_participant(
        session_id.clone(),
        participant_id,
        EventPayload::RentPaymentRequested { space_id },
    );
    run_action_sweep(state, &session_id, event).await.err()
}

pub(super) async fn handle_end_turn(
    state: &WsState,
    connection_id: Uuid,
) -> Option<ServerMessage> {
    let (session_id, participant_id) = match joined_context(state, connection_id).await {
        Ok(context) => context,
        Err(error) => return Some(error),
    };

    let event = GameEvent::for_participant(
        session_id.clone(),
        participant_id,
        EventPayload::TurnEndRequested,
    );
    run_action_sweep(state, &session_id, event).await.err()
}

#[cfg(test)]
mod tests {
    use super::super::tests::{register_and_join, test_state};
    use super::*;
    use boardwalk_domain::{ParticipantId, SessionId};

    #[tokio::test]
    async fn test_buy_property_end_to_end() {
        let (state, _dir) = test_state().await;
        let (c1, _rx) = register_and_join(&state, "s1", "p1").await;

        let response = handle_buy_property(&state, c1, "willow-lane".to_string()).await;
        assert!(response.is_none(), "unexpected response: {:?}", response);

        let snapshot = state
            .app
            .store
            .get_session(&SessionId::from_trusted("s1"))
            .expect("session");
        let p1 = ParticipantId::from_trusted("p1");
        assert_eq!(snapshot.participant(&p1).expect("p1").balance, 1440);
        assert_eq!(
            snapshot
                .space_by_id(&SpaceId::from_trusted("willow-lane"))
                .and_then(|s| s.owner()),
            Some(&p1)
        );
    }

    #[tokio::test]
    async fn test_buying_twice_returns_listener_failure() {
        let (state, _dir) = test_state().await;
        let (c1, _rx) = register_and_join(&state, "s1", "p1").await;

        assert!(handle_buy_property(&state, c1, "willow-lane".to_string())
            .await
            .is_none());
        let response = handle_buy_property(&state, c1, "willow-lane".to_string()).await;
        match response {
            Some(ServerMessage::Error { code, .. }) => {
                assert_eq!(code, ErrorCode::ListenerFailure);
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_end_turn_out_of_turn_returns_invalid_command() {
        let (state, _dir) = test_state().await;
        let (_c1, _rx1) = register_and_join(&state, "s1", "p1").await;
        let (c2, _rx2) = register_and_join(&state, "s1", "p2").await;

        let response = handle_end_turn(&state, c2).await;
        match response {
            Some(ServerMessage::Error { code, .. }) => {
                assert_eq!(code, ErrorCode::InvalidCommand);
            }
            other => panic!("expected error, got {:?}", other),
        }
    }
}
