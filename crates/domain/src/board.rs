//! Board space types.

use serde::{Deserialize, Serialize};

use crate::ids::{ParticipantId, SpaceId};

/// One cell of the shared board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSpace {
    pub space_id: SpaceId,
    pub name: String,
    pub index: usize,
    /// Participants currently standing on this space. Kept in step with each
    /// participant's `position` by the store's move rule.
    #[serde(default)]
    pub occupants: Vec<ParticipantId>,
    #[serde(flatten)]
    pub kind: SpaceKind,
}

impl BoardSpace {
    pub fn add_occupant(&mut self, participant_id: ParticipantId) {
        if !self.occupants.contains(&participant_id) {
            self.occupants.push(participant_id);
        }
    }

    pub fn remove_occupant(&mut self, participant_id: &ParticipantId) {
        self.occupants.retain(|p| p != participant_id);
    }

    pub fn is_property(&self) -> bool {
        matches!(self.kind, SpaceKind::Property { .. })
    }

    /// Owner of this space, if it is an owned property.
    pub fn owner(&self) -> Option<&ParticipantId> {
        match &self.kind {
            SpaceKind::Property { owned_by, .. } => owned_by.as_ref(),
            SpaceKind::Action { .. } => None,
        }
    }
}

/// What kind of space a cell is, with the per-kind data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "space_type", rename_all = "snake_case")]
pub enum SpaceKind {
    Property {
        purchase_price: i64,
        rent: i64,
        /// Owning participant, `None` while unowned.
        owned_by: Option<ParticipantId>,
    },
    Action { action: SpaceAction },
}

/// Effect attached to a non-property space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceAction {
    Tax,
    DrawChest,
    DrawChance,
    GoToJail,
    NoEffect,
}

impl std::fmt::Display for SpaceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SpaceAction::Tax => "pay tax",
            SpaceAction::DrawChest => "draw a chest card",
            SpaceAction::DrawChance => "draw a chance card",
            SpaceAction::GoToJail => "go to jail",
            SpaceAction::NoEffect => "rest",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(index: usize) -> BoardSpace {
        BoardSpace {
            space_id: SpaceId::from_trusted("elm-street"),
            name: "Elm Street".to_string(),
            index,
            occupants: Vec::new(),
            kind: SpaceKind::Property {
                purchase_price: 100,
                rent: 12,
                owned_by: None,
            },
        }
    }

    #[test]
    fn test_add_occupant_deduplicates() {
        let mut space = property(3);
        let p1 = ParticipantId::from_trusted("p1");
        space.add_occupant(p1.clone());
        space.add_occupant(p1.clone());
        assert_eq!(space.occupants, vec![p1]);
    }

    #[test]
    fn test_remove_occupant() {
        let mut space = property(3);
        let p1 = ParticipantId::from_trusted("p1");
        let p2 = ParticipantId::from_trusted("p2");
        space.add_occupant(p1.clone());
        space.add_occupant(p2.clone());
        space.remove_occupant(&p1);
        assert_eq!(space.occupants, vec![p2]);
    }

    #[test]
    fn test_owner_is_none_for_action_space() {
        let space = BoardSpace {
            space_id: SpaceId::from_trusted("income-tax"),
            name: "Income Tax".to_string(),
            index: 4,
            occupants: Vec::new(),
            kind: SpaceKind::Action {
                action: SpaceAction::Tax,
            },
        };
        assert!(!space.is_property());
        assert!(space.owner().is_none());
    }

    #[test]
    fn test_space_type_tag_round_trips() {
        let space = property(3);
        let json = serde_json::to_value(&space).expect("serialize");
        assert_eq!(json["space_type"], "property");
        let back: BoardSpace = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, space);
    }
}
