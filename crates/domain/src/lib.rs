//! Boardwalk domain layer.
//!
//! Pure vocabulary for the game session core: identifiers, causality phases,
//! the event/command vocabulary, and the board/session/participant state
//! types. Nothing here touches the bus, the store, or any I/O - these are
//! data types plus pure derivations, which is what lets one phase's applied
//! commands seed the next phase's events without coupling the vocabulary to
//! dispatch machinery.

pub mod board;
pub mod command;
pub mod error;
pub mod event;
pub mod ids;
pub mod phase;
pub mod session;

pub use board::{BoardSpace, SpaceAction, SpaceKind};
pub use command::{Command, CommandKind, CommandPayload};
pub use error::DomainError;
pub use event::{EventKind, EventPayload, GameEvent};
pub use ids::{ParticipantId, SessionId, SpaceId};
pub use phase::Phase;
pub use session::{ParticipantState, SessionState};
