//! The session store: sole authority for mutating session state.
//!
//! Everything that changes a `SessionState` goes through [`SessionStore::apply`]
//! (for command-driven mutations) or the participant lifecycle methods (driven
//! by the connection collaborator). Each mutation runs under the map's entry
//! guard, so a reader can never observe a half-applied command: either all of
//! a rule's field updates are visible, or none are.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

use boardwalk_domain::{
    BoardSpace, Command, CommandPayload, ParticipantId, ParticipantState, SessionId, SessionState,
    SpaceKind,
};

/// Store-level failures. Precondition failures leave the session untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("session already exists: {id}")]
    AlreadyExists { id: SessionId },

    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidCommand(msg.into())
    }
}

/// Owns the canonical in-memory state of every live session.
pub struct SessionStore {
    sessions: DashMap<SessionId, SessionState>,
    /// Template cloned into each new session.
    board_template: Vec<BoardSpace>,
    starting_balance: i64,
}

impl SessionStore {
    pub fn new(board_template: Vec<BoardSpace>, starting_balance: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            board_template,
            starting_balance,
        }
    }

    /// Create a fresh session. Calling this for a live id is a caller error.
    pub fn create_session(&self, id: &SessionId) -> Result<SessionState, StoreError> {
        match self.sessions.entry(id.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists { id: id.clone() }),
            Entry::Vacant(entry) => {
                let state = SessionState::new(id.clone(), self.board_template.clone());
                entry.insert(state.clone());
                tracing::info!(session_id = %id, "Created new session");
                Ok(state)
            }
        }
    }

    /// Seed the store from a persisted snapshot (session-init restore path).
    pub fn insert_restored(&self, state: SessionState) -> Result<(), StoreError> {
        match self.sessions.entry(state.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists {
                id: state.id.clone(),
            }),
            Entry::Vacant(entry) => {
                tracing::info!(session_id = %state.id, "Restored session from snapshot");
                entry.insert(state);
                Ok(())
            }
        }
    }

    /// Cloned snapshot of a session - the read-only view handed to listeners
    /// and to the broadcast path.
    pub fn get_session(&self, id: &SessionId) -> Option<SessionState> {
        self.sessions.get(id).map(|s| s.clone())
    }

    pub fn has_session(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Apply one command. The single mutation entrypoint: exactly one rule
    /// per command kind, atomic no-op on any precondition failure.
    pub fn apply(&self, command: &Command) -> Result<(), StoreError> {
        let mut session = self
            .sessions
            .get_mut(&command.session_id)
            .ok_or_else(|| StoreError::not_found("session", command.session_id.as_str()))?;

        match &command.payload {
            CommandPayload::MovePlayer {
                old_position,
                new_position,
            } => apply_move(
                &mut session,
                &command.participant_id,
                *old_position,
                *new_position,
            ),
            CommandPayload::AdjustFunds { delta } => {
                apply_adjust_funds(&mut session, &command.participant_id, *delta)
            }
            CommandPayload::TransferOwnership { space_id } => {
                apply_transfer_ownership(&mut session, &command.participant_id, space_id)
            }
            CommandPayload::EndTurn => apply_end_turn(&mut session, &command.participant_id),
        }
    }

    /// Add a participant to a session, placing them on the start space.
    /// Re-joining with a live participant id keeps the existing state.
    pub fn add_participant(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
    ) -> Result<(), StoreError> {
        let mut session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| StoreError::not_found("session", session_id.as_str()))?;

        if session.participants.contains_key(participant_id) {
            return Ok(());
        }

        let start_space_id = session
            .space_at(0)
            .map(|s| s.space_id.clone())
            .ok_or_else(|| StoreError::invalid("session board is empty"))?;

        session.participants.insert(
            participant_id.clone(),
            ParticipantState::new(
                participant_id.clone(),
                start_space_id,
                self.starting_balance,
            ),
        );
        session.turn_order.push(participant_id.clone());
        session.board[0].add_occupant(participant_id.clone());

        tracing::info!(
            session_id = %session_id,
            participant_id = %participant_id,
            "Participant joined session"
        );
        Ok(())
    }

    /// Remove a participant (announced by the connection collaborator on
    /// disconnect). Releases their board occupancy, property ownership and
    /// turn slot.
    pub fn remove_participant(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
    ) -> Result<(), StoreError> {
        let mut session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| StoreError::not_found("session", session_id.as_str()))?;

        let participant = session
            .participants
            .remove(participant_id)
            .ok_or_else(|| StoreError::not_found("participant", participant_id.as_str()))?;

        if let Some(space) = session.board.get_mut(participant.position) {
            space.remove_occupant(participant_id);
        }
        for space in &mut session.board {
            if let SpaceKind::Property { owned_by, .. } = &mut space.kind {
                if owned_by.as_ref() == Some(participant_id) {
                    *owned_by = None;
                }
            }
        }

        if let Some(index) = session.turn_order.iter().position(|p| p == participant_id) {
            session.turn_order.remove(index);
            if session.turn_order.is_empty() {
                session.active_turn = 0;
            } else {
                if index < session.active_turn {
                    session.active_turn -= 1;
                }
                session.active_turn %= session.turn_order.len();
            }
        }

        tracing::info!(
            session_id = %session_id,
            participant_id = %participant_id,
            "Participant left session"
        );
        Ok(())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Overwrite the participant's position and current space, keeping the two
/// board cells' occupancy in step. All fields change together or not at all.
fn apply_move(
    session: &mut SessionState,
    participant_id: &ParticipantId,
    old_position: usize,
    new_position: usize,
) -> Result<(), StoreError> {
    let board_len = session.board_len();
    if old_position >= board_len || new_position >= board_len {
        return Err(StoreError::invalid(format!(
            "move positions {} -> {} exceed board of {} spaces",
            old_position, new_position, board_len
        )));
    }

    let new_space_id = session.board[new_position].space_id.clone();

    let Some(participant) = session.participants.get_mut(participant_id) else {
        return Err(StoreError::not_found(
            "participant",
            participant_id.as_str(),
        ));
    };
    if participant.position != old_position {
        return Err(StoreError::invalid(format!(
            "stale move: participant {} is at {}, not {}",
            participant_id, participant.position, old_position
        )));
    }

    participant.position = new_position;
    participant.current_space_id = new_space_id;
    session.board[old_position].remove_occupant(participant_id);
    session.board[new_position].add_occupant(participant_id.clone());
    Ok(())
}

fn apply_adjust_funds(
    session: &mut SessionState,
    participant_id: &ParticipantId,
    delta: i64,
) -> Result<(), StoreError> {
    let Some(participant) = session.participants.get_mut(participant_id) else {
        return Err(StoreError::not_found(
            "participant",
            participant_id.as_str(),
        ));
    };
    let new_balance = participant.balance + delta;
    if new_balance < 0 {
        return Err(StoreError::invalid(format!(
            "insufficient funds: balance {} cannot absorb {}",
            participant.balance, delta
        )));
    }
    participant.balance = new_balance;
    Ok(())
}

fn apply_transfer_ownership(
    session: &mut SessionState,
    participant_id: &ParticipantId,
    space_id: &boardwalk_domain::SpaceId,
) -> Result<(), StoreError> {
    if !session.participants.contains_key(participant_id) {
        return Err(StoreError::not_found(
            "participant",
            participant_id.as_str(),
        ));
    }

    let Some(space) = session.board.iter_mut().find(|s| &s.space_id == space_id) else {
        return Err(StoreError::not_found("space", space_id.as_str()));
    };
    let SpaceKind::Property { owned_by, .. } = &mut space.kind else {
        return Err(StoreError::invalid(format!(
            "space {} is not a property",
            space_id
        )));
    };
    match owned_by {
        Some(owner) => Err(StoreError::invalid(format!(
            "property {} is already owned by {}",
            space_id, owner
        ))),
        None => {
            *owned_by = Some(participant_id.clone());
            // Participant existence was checked above.
            if let Some(participant) = session.participants.get_mut(participant_id) {
                participant.owned_spaces.insert(space_id.clone());
            }
            Ok(())
        }
    }
}

fn apply_end_turn(
    session: &mut SessionState,
    participant_id: &ParticipantId,
) -> Result<(), StoreError> {
    if !session.participants.contains_key(participant_id) {
        return Err(StoreError::not_found(
            "participant",
            participant_id.as_str(),
        ));
    }
    match session.active_participant() {
        Some(active) if active == participant_id => {
            session.active_turn = (session.active_turn + 1) % session.turn_order.len();
            Ok(())
        }
        Some(active) => Err(StoreError::invalid(format!(
            "it is {}'s turn, not {}'s",
            active, participant_id
        ))),
        None => Err(StoreError::invalid("session has no participants")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardwalk_domain::{SpaceAction, SpaceId};

    fn test_board(len: usize) -> Vec<BoardSpace> {
        (0..len)
            .map(|index| {
                if index == 0 {
                    BoardSpace {
                        space_id: SpaceId::from_trusted("go"),
                        name: "Go".to_string(),
                        index,
                        occupants: Vec::new(),
                        kind: SpaceKind::Action {
                            action: SpaceAction::NoEffect,
                        },
                    }
                } else {
                    BoardSpace {
                        space_id: SpaceId::from_trusted(format!("space-{}", index)),
                        name: format!("Space {}", index),
                        index,
                        occupants: Vec::new(),
                        kind: SpaceKind::Property {
                            purchase_price: 100,
                            rent: 10,
                            owned_by: None,
                        },
                    }
                }
            })
            .collect()
    }

    fn store_with_session() -> (SessionStore, SessionId, ParticipantId) {
        let store = SessionStore::new(test_board(40), 1500);
        let session_id = SessionId::from_trusted("s1");
        let participant_id = ParticipantId::from_trusted("p1");
        store.create_session(&session_id).expect("create session");
        store
            .add_participant(&session_id, &participant_id)
            .expect("add participant");
        (store, session_id, participant_id)
    }

    fn move_command(
        session_id: &SessionId,
        participant_id: &ParticipantId,
        old: usize,
        new: usize,
    ) -> Command {
        Command::new(
            session_id.clone(),
            participant_id.clone(),
            CommandPayload::MovePlayer {
                old_position: old,
                new_position: new,
            },
        )
    }

    #[test]
    fn test_create_session_twice_is_already_exists() {
        let store = SessionStore::new(test_board(4), 1500);
        let session_id = SessionId::from_trusted("s1");
        store.create_session(&session_id).expect("first create");
        assert!(matches!(
            store.create_session(&session_id),
            Err(StoreError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn test_apply_on_unknown_session_is_not_found_without_trace() {
        let store = SessionStore::new(test_board(4), 1500);
        let session_id = SessionId::from_trusted("ghost");
        let cmd = move_command(&session_id, &ParticipantId::from_trusted("p1"), 0, 1);
        assert!(matches!(
            store.apply(&cmd),
            Err(StoreError::NotFound { entity: "session", .. })
        ));
        // No implicit session creation as a side effect of apply.
        assert!(!store.has_session(&session_id));
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn test_move_updates_position_and_both_cells_together() {
        let (store, session_id, participant_id) = store_with_session();
        store
            .apply(&move_command(&session_id, &participant_id, 0, 12))
            .expect("move applies");

        let state = store.get_session(&session_id).expect("session exists");
        let participant = state.participant(&participant_id).expect("participant");
        assert_eq!(participant.position, 12);
        assert_eq!(
            participant.current_space_id,
            state.board[12].space_id
        );
        assert!(state.board[12].occupants.contains(&participant_id));
        assert!(!state.board[0].occupants.contains(&participant_id));
    }

    #[test]
    fn test_stale_move_is_rejected_without_mutation() {
        let (store, session_id, participant_id) = store_with_session();
        let before = store.get_session(&session_id).expect("session");
        let result = store.apply(&move_command(&session_id, &participant_id, 5, 12));
        assert!(matches!(result, Err(StoreError::InvalidCommand(_))));
        assert_eq!(store.get_session(&session_id).expect("session"), before);
    }

    #[test]
    fn test_adjust_funds_rejects_overdraft() {
        let (store, session_id, participant_id) = store_with_session();
        let cmd = Command::new(
            session_id.clone(),
            participant_id.clone(),
            CommandPayload::AdjustFunds { delta: -2000 },
        );
        assert!(matches!(
            store.apply(&cmd),
            Err(StoreError::InvalidCommand(_))
        ));
        let state = store.get_session(&session_id).expect("session");
        assert_eq!(
            state.participant(&participant_id).expect("participant").balance,
            1500
        );
    }

    #[test]
    fn test_transfer_ownership_records_both_sides() {
        let (store, session_id, participant_id) = store_with_session();
        let space_id = SpaceId::from_trusted("space-3");
        let cmd = Command::new(
            session_id.clone(),
            participant_id.clone(),
            CommandPayload::TransferOwnership {
                space_id: space_id.clone(),
            },
        );
        store.apply(&cmd).expect("transfer applies");

        let state = store.get_session(&session_id).expect("session");
        assert_eq!(
            state.space_by_id(&space_id).and_then(|s| s.owner()),
            Some(&participant_id)
        );
        assert!(state
            .participant(&participant_id)
            .expect("participant")
            .owned_spaces
            .contains(&space_id));

        // A second transfer of the same property must fail.
        let p2 = ParticipantId::from_trusted("p2");
        store
            .add_participant(&session_id, &p2)
            .expect("add second participant");
        let steal = Command::new(
            session_id.clone(),
            p2,
            CommandPayload::TransferOwnership { space_id },
        );
        assert!(matches!(
            store.apply(&steal),
            Err(StoreError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_end_turn_rotates_and_rejects_out_of_turn() {
        let (store, session_id, p1) = store_with_session();
        let p2 = ParticipantId::from_trusted("p2");
        store.add_participant(&session_id, &p2).expect("add p2");

        let out_of_turn = Command::new(session_id.clone(), p2.clone(), CommandPayload::EndTurn);
        assert!(matches!(
            store.apply(&out_of_turn),
            Err(StoreError::InvalidCommand(_))
        ));

        let end = Command::new(session_id.clone(), p1, CommandPayload::EndTurn);
        store.apply(&end).expect("active participant ends turn");
        let state = store.get_session(&session_id).expect("session");
        assert_eq!(state.active_participant(), Some(&p2));
    }

    #[test]
    fn test_rejoin_keeps_existing_participant_state() {
        let (store, session_id, participant_id) = store_with_session();
        store
            .apply(&move_command(&session_id, &participant_id, 0, 3))
            .expect("move");
        store
            .add_participant(&session_id, &participant_id)
            .expect("re-join is a no-op");
        let state = store.get_session(&session_id).expect("session");
        assert_eq!(
            state.participant(&participant_id).expect("participant").position,
            3
        );
        assert_eq!(state.turn_order.len(), 1);
    }

    #[test]
    fn test_remove_participant_releases_board_state() {
        let (store, session_id, p1) = store_with_session();
        let p2 = ParticipantId::from_trusted("p2");
        store.add_participant(&session_id, &p2).expect("add p2");

        let space_id = SpaceId::from_trusted("space-3");
        store
            .apply(&Command::new(
                session_id.clone(),
                p1.clone(),
                CommandPayload::TransferOwnership {
                    space_id: space_id.clone(),
                },
            ))
            .expect("transfer");

        store
            .remove_participant(&session_id, &p1)
            .expect("remove participant");

        let state = store.get_session(&session_id).expect("session");
        assert!(state.participant(&p1).is_none());
        assert!(state.space_by_id(&space_id).and_then(|s| s.owner()).is_none());
        assert!(!state.board[0].occupants.contains(&p1));
        assert_eq!(state.active_participant(), Some(&p2));
    }
}
