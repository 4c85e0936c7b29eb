//! Session lifecycle payloads: start, end, fork.

use serde::{Deserialize, Serialize};

/// Payload for `session.start` events — always the root event of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartPayload {
    /// Model the session was created with.
    pub model: String,
    /// Absolute working directory for the session.
    pub working_directory: String,
    /// Session title, if supplied at creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// System prompt in effect at session start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Payload for `session.end` events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEndPayload {
    /// Why the session ended (`"user_request"`, `"error"`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Payload for `session.fork` events.
///
/// Recorded in the new session's event tree, with `parentId` pointing at
/// the source event — which may belong to a different session entirely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionForkPayload {
    /// Session the fork point was taken from.
    pub source_session_id: String,
    /// Event the new session's history branches off of.
    pub source_event_id: String,
}
