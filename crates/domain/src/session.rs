//! Session and participant state.
//!
//! `SessionState` is the authoritative snapshot for one game. There is
//! exactly one live instance per session id (the store enforces this), and
//! every mutation goes through the store's apply entrypoint - listeners only
//! ever see cloned snapshots of these types.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::BoardSpace;
use crate::ids::{ParticipantId, SessionId, SpaceId};

/// Per-player mutable data inside a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantState {
    pub id: ParticipantId,
    pub balance: i64,
    pub position: usize,
    /// Always agrees with the board cell recorded as occupied by this
    /// participant; the store updates the two together.
    pub current_space_id: SpaceId,
    pub owned_spaces: HashSet<SpaceId>,
}

impl ParticipantState {
    pub fn new(id: ParticipantId, start_space_id: SpaceId, starting_balance: i64) -> Self {
        Self {
            id,
            balance: starting_balance,
            position: 0,
            current_space_id: start_space_id,
            owned_spaces: HashSet::new(),
        }
    }
}

/// The authoritative snapshot for one game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: SessionId,
    pub participants: HashMap<ParticipantId, ParticipantState>,
    pub board: Vec<BoardSpace>,
    /// Join order; the active participant is `turn_order[active_turn]`.
    pub turn_order: Vec<ParticipantId>,
    pub active_turn: usize,
    pub created_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(id: SessionId, board: Vec<BoardSpace>) -> Self {
        Self {
            id,
            participants: HashMap::new(),
            board,
            turn_order: Vec::new(),
            active_turn: 0,
            created_at: Utc::now(),
        }
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&ParticipantState> {
        self.participants.get(id)
    }

    pub fn space_at(&self, index: usize) -> Option<&BoardSpace> {
        self.board.get(index)
    }

    pub fn space_by_id(&self, space_id: &SpaceId) -> Option<&BoardSpace> {
        self.board.iter().find(|s| &s.space_id == space_id)
    }

    /// Whose turn it is, if anyone has joined.
    pub fn active_participant(&self) -> Option<&ParticipantId> {
        self.turn_order.get(self.active_turn)
    }

    pub fn board_len(&self) -> usize {
        self.board.len()
    }
}
