//! Payloads for operations performed on existing messages (deletion).

use serde::{Deserialize, Serialize};

/// Payload for `message.deleted` events.
///
/// The target event is never mutated; this event is a second, additive
/// record that the state reconstructor applies as a filtering pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDeletedPayload {
    /// Event ID of the message being deleted.
    pub target_event_id: String,
    /// Event type of the target, captured for audit/debugging.
    pub target_type: String,
    /// Why the message was deleted.
    pub reason: String,
}
