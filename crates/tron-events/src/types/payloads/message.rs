//! Message event payloads: user, assistant, system.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::token_usage::TokenUsage;

/// Payload for `message.user` events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessagePayload {
    /// Message content — a plain string or a list of typed content blocks.
    pub content: Value,
    /// Attachment blob descriptors, if any were inlined out-of-band.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Value>>,
}

/// Payload for `message.assistant` events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessagePayload {
    /// Ordered content blocks (`text`, `tool_use`, `tool_result`, `thinking`).
    pub content: Value,
    /// Model that produced this message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Turn number this message belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<i64>,
    /// Why the provider stream stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    /// Token usage for this turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
    /// Wall-clock latency of the provider call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<i64>,
    /// Estimated cost in USD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

/// Payload for `message.system` events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMessagePayload {
    /// System message content.
    pub content: String,
    /// Why the system message was injected (e.g. `"compaction"`, `"hook"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
