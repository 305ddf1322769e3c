//! Boardwalk Protocol - types shared between the engine and its clients.
//!
//! Pure data types and serialization for the WebSocket wire format. Ids are
//! raw strings here; the engine parses them into domain ids at the boundary.

pub mod messages;

pub use messages::{
    ClientMessage, ErrorCode, PromptType, ServerMessage, SessionStatus,
};
