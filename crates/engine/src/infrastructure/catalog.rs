//! The board/property catalog.
//!
//! Supplies the board template each new session is seeded with: the built-in
//! forty-space board, or an operator-supplied JSON file (`BOARD_PATH`).

use std::path::Path;

use thiserror::Error;

use boardwalk_domain::{BoardSpace, SpaceAction, SpaceId, SpaceKind};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read board file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse board file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid board: {0}")]
    Invalid(String),
}

/// A validated board template.
pub struct BoardCatalog {
    spaces: Vec<BoardSpace>,
}

enum Seed {
    Property { price: i64, rent: i64 },
    Action(SpaceAction),
}

use Seed::{Action, Property};

/// The built-in board: (space_id, display name, seed), one entry per index.
const DEFAULT_BOARD: &[(&str, &str, Seed)] = &[
    ("go", "Go", Action(SpaceAction::NoEffect)),
    ("willow-lane", "Willow Lane", Property { price: 60, rent: 2 }),
    ("chest-1", "Community Chest", Action(SpaceAction::DrawChest)),
    ("juniper-lane", "Juniper Lane", Property { price: 60, rent: 4 }),
    ("income-tax", "Income Tax", Action(SpaceAction::Tax)),
    ("north-station", "North Station", Property { price: 200, rent: 25 }),
    ("oak-avenue", "Oak Avenue", Property { price: 100, rent: 6 }),
    ("chance-1", "Chance", Action(SpaceAction::DrawChance)),
    ("maple-avenue", "Maple Avenue", Property { price: 100, rent: 6 }),
    ("cedar-avenue", "Cedar Avenue", Property { price: 120, rent: 8 }),
    ("jail", "Jail (Just Visiting)", Action(SpaceAction::NoEffect)),
    ("rose-street", "Rose Street", Property { price: 140, rent: 10 }),
    ("power-works", "Power Works", Property { price: 150, rent: 10 }),
    ("tulip-street", "Tulip Street", Property { price: 140, rent: 10 }),
    ("orchid-street", "Orchid Street", Property { price: 160, rent: 12 }),
    ("west-station", "West Station", Property { price: 200, rent: 25 }),
    ("amber-court", "Amber Court", Property { price: 180, rent: 14 }),
    ("chest-2", "Community Chest", Action(SpaceAction::DrawChest)),
    ("topaz-court", "Topaz Court", Property { price: 180, rent: 14 }),
    ("ruby-court", "Ruby Court", Property { price: 200, rent: 16 }),
    ("free-parking", "Free Parking", Action(SpaceAction::NoEffect)),
    ("scarlet-road", "Scarlet Road", Property { price: 220, rent: 18 }),
    ("chance-2", "Chance", Action(SpaceAction::DrawChance)),
    ("crimson-road", "Crimson Road", Property { price: 220, rent: 18 }),
    ("garnet-road", "Garnet Road", Property { price: 240, rent: 20 }),
    ("east-station", "East Station", Property { price: 200, rent: 25 }),
    ("harbor-view", "Harbor View", Property { price: 260, rent: 22 }),
    ("bayside-walk", "Bayside Walk", Property { price: 260, rent: 22 }),
    ("water-works", "Water Works", Property { price: 150, rent: 10 }),
    ("marina-row", "Marina Row", Property { price: 280, rent: 24 }),
    ("go-to-jail", "Go To Jail", Action(SpaceAction::GoToJail)),
    ("emerald-gardens", "Emerald Gardens", Property { price: 300, rent: 26 }),
    ("jade-gardens", "Jade Gardens", Property { price: 300, rent: 26 }),
    ("chest-3", "Community Chest", Action(SpaceAction::DrawChest)),
    ("opal-gardens", "Opal Gardens", Property { price: 320, rent: 28 }),
    ("south-station", "South Station", Property { price: 200, rent: 25 }),
    ("chance-3", "Chance", Action(SpaceAction::DrawChance)),
    ("regent-place", "Regent Place", Property { price: 350, rent: 35 }),
    ("luxury-tax", "Luxury Tax", Action(SpaceAction::Tax)),
    ("crown-place", "Crown Place", Property { price: 400, rent: 50 }),
];

impl BoardCatalog {
    /// The built-in forty-space board.
    pub fn default_board() -> Self {
        let spaces = DEFAULT_BOARD
            .iter()
            .enumerate()
            .map(|(index, (space_id, name, seed))| BoardSpace {
                space_id: SpaceId::from_trusted(*space_id),
                name: (*name).to_string(),
                index,
                occupants: Vec::new(),
                kind: match seed {
                    Property { price, rent } => SpaceKind::Property {
                        purchase_price: *price,
                        rent: *rent,
                        owned_by: None,
                    },
                    Action(action) => SpaceKind::Action { action: *action },
                },
            })
            .collect();
        Self { spaces }
    }

    /// Load a board from a JSON array of spaces. Spaces are sorted by index
    /// and must form a consecutive run from zero.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let mut spaces: Vec<BoardSpace> = serde_json::from_str(&raw)?;
        spaces.sort_by_key(|s| s.index);
        Self::validate(&mut spaces)?;
        Ok(Self { spaces })
    }

    fn validate(spaces: &mut [BoardSpace]) -> Result<(), CatalogError> {
        if spaces.is_empty() {
            return Err(CatalogError::Invalid("board has no spaces".to_string()));
        }
        for (expected, space) in spaces.iter_mut().enumerate() {
            if space.index != expected {
                return Err(CatalogError::Invalid(format!(
                    "space indexes must be consecutive from 0; found {} at position {}",
                    space.index, expected
                )));
            }
            // Templates carry no live state.
            space.occupants.clear();
        }
        Ok(())
    }

    pub fn spaces(&self) -> &[BoardSpace] {
        &self.spaces
    }

    pub fn into_spaces(self) -> Vec<BoardSpace> {
        self.spaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_board_is_consecutive_and_starts_at_go() {
        let catalog = BoardCatalog::default_board();
        let spaces = catalog.spaces();
        assert_eq!(spaces.len(), 40);
        assert_eq!(spaces[0].space_id, SpaceId::from_trusted("go"));
        for (index, space) in spaces.iter().enumerate() {
            assert_eq!(space.index, index);
            assert!(space.occupants.is_empty());
            assert!(space.owner().is_none());
        }
    }

    #[test]
    fn test_board_loads_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        let spaces = BoardCatalog::default_board().into_spaces();
        let json = serde_json::to_string(&spaces).expect("serialize");
        file.write_all(json.as_bytes()).expect("write");

        let catalog = BoardCatalog::from_json_file(file.path()).expect("load");
        assert_eq!(catalog.spaces().len(), 40);
        assert_eq!(catalog.spaces()[4].name, "Income Tax");
    }

    #[test]
    fn test_rejects_gapped_indexes() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        let mut spaces = BoardCatalog::default_board().into_spaces();
        spaces.remove(5);
        let json = serde_json::to_string(&spaces).expect("serialize");
        file.write_all(json.as_bytes()).expect("write");

        assert!(matches!(
            BoardCatalog::from_json_file(file.path()),
            Err(CatalogError::Invalid(_))
        ));
    }
}
