//! WebSocket API: connection tracking and message handling.

pub mod connections;
pub mod websocket;

pub use connections::ConnectionManager;
