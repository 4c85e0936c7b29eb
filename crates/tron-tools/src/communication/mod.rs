//! Inter-agent messaging tools.

pub mod receive_messages;
pub mod send_message;
