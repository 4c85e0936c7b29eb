//! Subagent lifecycle payloads.
//!
//! Subagent sessions are ordinary sessions with `spawningSessionId` set; the
//! events here let the parent session's reconstructed state show spawn
//! progress without joining across session boundaries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload for `subagent.spawned` events, recorded on the parent session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubagentSpawnedPayload {
    /// Session ID of the spawned subagent.
    pub subagent_session_id: String,
    /// Subagent type/role (e.g. `"general-purpose"`, `"code-reviewer"`).
    pub subagent_type: String,
    /// Task description handed to the subagent.
    pub task: String,
}

/// Payload for `subagent.status_update` events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubagentStatusUpdatePayload {
    /// Session ID of the subagent this update is about.
    pub subagent_session_id: String,
    /// Freeform status line surfaced to the parent's UI.
    pub status: String,
}

/// Payload for `subagent.completed` events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubagentCompletedPayload {
    /// Session ID of the subagent that completed.
    pub subagent_session_id: String,
    /// Final result handed back to the parent.
    pub result: Value,
    /// Total tokens spent by the subagent, for rollup accounting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<i64>,
}

/// Payload for `subagent.failed` events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubagentFailedPayload {
    /// Session ID of the subagent that failed.
    pub subagent_session_id: String,
    /// Error message.
    pub error: String,
}
