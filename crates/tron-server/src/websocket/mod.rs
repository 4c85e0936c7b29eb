//! WebSocket connection management, heartbeat, message dispatch, and broadcasting.

pub mod broadcast;
pub mod connection;
pub mod event_bridge;
pub mod handler;
pub mod heartbeat;
pub mod session;
