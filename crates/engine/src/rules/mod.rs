//! Game-rule listeners.
//!
//! Each listener reacts to one event kind, reads only the cloned session
//! view it is handed, and expresses every state change as returned commands.
//! Out-of-band player dialogs go through the [`Notifier`] port so the rules
//! never touch the transport directly.

use std::sync::Arc;

use async_trait::async_trait;

use boardwalk_domain::{ParticipantId, SessionId};
use boardwalk_shared::ServerMessage;

use crate::bus::EventBus;

mod movement;
mod property;
mod turns;

pub use movement::PASS_START_BONUS;

/// Outbound notification port consumed by listeners. Implemented by the
/// connection manager; test doubles record instead of sending.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message to one participant's connections.
    async fn notify(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
        message: ServerMessage,
    );

    /// Deliver a message to every connection in the session.
    async fn announce(&self, session_id: &SessionId, message: ServerMessage);
}

/// Register the full rule set on the bus. Registration order is load-bearing
/// for listeners sharing an event kind and must stay stable.
pub async fn register_rules(bus: &EventBus, notifier: Arc<dyn Notifier>) {
    movement::register(bus, Arc::clone(&notifier)).await;
    property::register(bus, Arc::clone(&notifier)).await;
    turns::register(bus, notifier).await;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tokio::sync::Mutex;

    /// Records every notification instead of delivering it.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(ParticipantId, ServerMessage)>>,
        pub announced: Mutex<Vec<ServerMessage>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(
            &self,
            _session_id: &SessionId,
            participant_id: &ParticipantId,
            message: ServerMessage,
        ) {
            self.sent.lock().await.push((participant_id.clone(), message));
        }

        async fn announce(&self, _session_id: &SessionId, message: ServerMessage) {
            self.announced.lock().await.push(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecordingNotifier;
    use super::*;
    use std::time::Duration;

    use boardwalk_domain::{
        BoardSpace, EventPayload, GameEvent, Phase, SessionState, SpaceAction, SpaceId, SpaceKind,
    };
    use boardwalk_shared::PromptType;

    use crate::store::SessionStore;

    pub(super) fn test_board() -> Vec<BoardSpace> {
        (0..40)
            .map(|index| match index {
                0 => BoardSpace {
                    space_id: SpaceId::from_trusted("go"),
                    name: "Go".to_string(),
                    index,
                    occupants: Vec::new(),
                    kind: SpaceKind::Action {
                        action: SpaceAction::NoEffect,
                    },
                },
                4 => BoardSpace {
                    space_id: SpaceId::from_trusted("income-tax"),
                    name: "Income Tax".to_string(),
                    index,
                    occupants: Vec::new(),
                    kind: SpaceKind::Action {
                        action: SpaceAction::Tax,
                    },
                },
                _ => BoardSpace {
                    space_id: SpaceId::from_trusted(format!("street-{}", index)),
                    name: format!("Street {}", index),
                    index,
                    occupants: Vec::new(),
                    kind: SpaceKind::Property {
                        purchase_price: 100,
                        rent: 12,
                        owned_by: None,
                    },
                },
            })
            .collect()
    }

    pub(super) struct Fixture {
        pub bus: Arc<EventBus>,
        pub store: Arc<SessionStore>,
        pub notifier: Arc<RecordingNotifier>,
        pub session_id: SessionId,
        pub p1: ParticipantId,
        pub p2: ParticipantId,
    }

    pub(super) async fn fixture() -> Fixture {
        let store = Arc::new(SessionStore::new(test_board(), 1500));
        let session_id = SessionId::from_trusted("s1");
        let p1 = ParticipantId::from_trusted("p1");
        let p2 = ParticipantId::from_trusted("p2");
        store.create_session(&session_id).expect("create session");
        store.add_participant(&session_id, &p1).expect("add p1");
        store.add_participant(&session_id, &p2).expect("add p2");

        let bus = Arc::new(EventBus::new(
            Arc::clone(&store),
            Duration::from_secs(5),
        ));
        let notifier = Arc::new(RecordingNotifier::default());
        register_rules(&bus, Arc::clone(&notifier) as Arc<dyn Notifier>).await;

        Fixture {
            bus,
            store,
            notifier,
            session_id,
            p1,
            p2,
        }
    }

    pub(super) fn participant_position(
        state: &SessionState,
        participant_id: &ParticipantId,
    ) -> usize {
        state
            .participant(participant_id)
            .map(|p| p.position)
            .unwrap_or(usize::MAX)
    }

    #[tokio::test]
    async fn test_dice_roll_moves_player_end_to_end() {
        let f = fixture().await;
        f.bus.publish(
            Phase::Input,
            GameEvent::for_participant(
                f.session_id.clone(),
                f.p1.clone(),
                EventPayload::DiceRolled { roll: 8 },
            ),
        );
        f.bus
            .process_all_phases(&f.session_id)
            .await
            .expect("sweep");

        let state = f.store.get_session(&f.session_id).expect("session");
        assert_eq!(participant_position(&state, &f.p1), 8);
        // Landing on an unowned, affordable property prompts a purchase offer.
        let sent = f.notifier.sent.lock().await;
        assert!(sent.iter().any(|(to, msg)| {
            to == &f.p1
                && matches!(
                    msg,
                    ServerMessage::Prompt {
                        prompt_type: PromptType::AskPurchase,
                        ..
                    }
                )
        }));
    }

    #[tokio::test]
    async fn test_wrap_past_start_credits_bonus_exactly_once() {
        let f = fixture().await;
        // Park p1 on index 35 first.
        f.bus.publish(
            Phase::Input,
            GameEvent::for_participant(
                f.session_id.clone(),
                f.p1.clone(),
                EventPayload::DiceRolled { roll: 35 },
            ),
        );
        f.bus
            .process_all_phases(&f.session_id)
            .await
            .expect("park sweep");
        let balance_before = f
            .store
            .get_session(&f.session_id)
            .expect("session")
            .participant(&f.p1)
            .expect("p1")
            .balance;

        // Roll 8 from 35: wraps to 3, passing Go.
        f.bus.publish(
            Phase::Input,
            GameEvent::for_participant(
                f.session_id.clone(),
                f.p1.clone(),
                EventPayload::DiceRolled { roll: 8 },
            ),
        );
        f.bus
            .process_all_phases(&f.session_id)
            .await
            .expect("wrap sweep");

        let state = f.store.get_session(&f.session_id).expect("session");
        assert_eq!(participant_position(&state, &f.p1), 3);
        // Multiple listeners react to PlayerMoved; the bonus still lands
        // exactly once.
        assert_eq!(
            state.participant(&f.p1).expect("p1").balance,
            balance_before + PASS_START_BONUS
        );
    }
}
