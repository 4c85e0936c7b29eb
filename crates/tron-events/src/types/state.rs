//! Reconstructed, in-memory view types.
//!
//! Everything here is derived from the persisted event tree — none of it is
//! stored directly. [`SessionState`] is the shape the turn runner and
//! RPC gateway consume; [`SessionSummary`]/[`SessionMetadata`] are the
//! lighter-weight shapes returned by listing/inspection calls so callers
//! aren't forced to replay full history just to show a session picker.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::payloads::todo::TodoItem;

/// A single reconstructed message in a session's conversation.
///
/// Mirrors the provider-facing message shape (`role` + `content` blocks)
/// rather than the event-sourced representation — this is what gets handed
/// to [`tron-llm`] adapters and to clients rendering the transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// `"user"`, `"assistant"`, or `"toolResult"`.
    pub role: String,
    /// Message content — a plain string or a list of typed content blocks.
    pub content: Value,
    /// Tool call ID this message answers, set only on `toolResult` messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Whether a `toolResult` message represents a tool error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// A reconstructed message paired with the event ID(s) it was built from.
///
/// A single logical message can be the merge of several consecutive
/// same-role events (see the context assembler's consecutive-role merge
/// pass), so `event_ids` is a list — one entry per contributing event, in
/// the order they were merged. An entry is `None` when the message was
/// synthesized rather than sourced from a single event (e.g. the injected
/// compaction acknowledgement).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageWithEventId {
    /// The reconstructed message.
    pub message: Message,
    /// Contributing event IDs, in merge order.
    pub event_ids: Vec<Option<String>>,
}

/// Token usage accumulated across a session's reconstructed history.
///
/// Distinct from [`crate::types::payloads::TokenUsage`] (the per-event wire
/// shape): this is a running total with the two cache-creation tiers
/// (5-minute and 1-hour) broken out for cost accounting, matching what
/// providers bill separately.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokenUsage {
    /// Total input tokens across all turns.
    pub input_tokens: i64,
    /// Total output tokens across all turns.
    pub output_tokens: i64,
    /// Total cache-read tokens, if any turn used a cached prefix.
    pub cache_read_tokens: Option<i64>,
    /// Total cache-creation tokens, if any turn wrote a cached prefix.
    pub cache_creation_tokens: Option<i64>,
    /// Cache-creation tokens billed at the 5-minute TTL tier.
    pub cache_creation_5m_tokens: Option<i64>,
    /// Cache-creation tokens billed at the 1-hour TTL tier.
    pub cache_creation_1h_tokens: Option<i64>,
}

/// The full reconstructed state of a session at some point in its history
/// (the head, by default, or an arbitrary ancestor event when reconstructing
/// for a fork or a historical view).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Model currently in effect.
    pub model: String,
    /// Working directory currently in effect.
    pub working_directory: String,
    /// System prompt currently in effect, if one has been set.
    pub system_prompt: Option<String>,
    /// Reasoning level currently in effect, if one has been set.
    pub reasoning_level: Option<String>,
    /// Reconstructed conversation, in order.
    pub messages_with_event_ids: Vec<MessageWithEventId>,
    /// Accumulated token usage.
    pub token_usage: SessionTokenUsage,
    /// Number of completed turns.
    pub turn_count: i64,
    /// Whether the session has been ended.
    pub is_ended: Option<bool>,
    /// Current todo list snapshot from the latest `todo.write` event, if any.
    pub active_todos: Vec<TodoItem>,
}

/// A lightweight session listing row, as returned by `session.list`.
///
/// Built directly from denormalized `SessionRow` fields — no event replay
/// required, so listing scales with the number of sessions, not events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Session ID.
    pub id: String,
    /// Session title, if set.
    pub title: Option<String>,
    /// Most recently used model.
    pub latest_model: String,
    /// Working directory.
    pub working_directory: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last activity timestamp.
    pub last_activity_at: String,
    /// End timestamp, if the session has ended.
    pub ended_at: Option<String>,
    /// Total events recorded.
    pub event_count: i64,
    /// Total messages recorded.
    pub message_count: i64,
    /// Total completed turns.
    pub turn_count: i64,
}

/// Full metadata for a single session, as returned by `session.get`.
///
/// A superset of [`SessionSummary`] with the accounting fields a detail
/// view needs (cost, cache usage, fork/spawn lineage) that a list view
/// would rather not pay to compute for every row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    /// Session ID.
    pub id: String,
    /// Workspace the session belongs to.
    pub workspace_id: String,
    /// Session title, if set.
    pub title: Option<String>,
    /// Most recently used model.
    pub latest_model: String,
    /// Working directory.
    pub working_directory: String,
    /// Parent session ID, if this session was forked from another.
    pub parent_session_id: Option<String>,
    /// Event the fork branched off of, if forked.
    pub fork_from_event_id: Option<String>,
    /// Session that spawned this one as a subagent, if any.
    pub spawning_session_id: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last activity timestamp.
    pub last_activity_at: String,
    /// End timestamp, if the session has ended.
    pub ended_at: Option<String>,
    /// Total events recorded.
    pub event_count: i64,
    /// Total messages recorded.
    pub message_count: i64,
    /// Total completed turns.
    pub turn_count: i64,
    /// Total input tokens recorded.
    pub total_input_tokens: i64,
    /// Total output tokens recorded.
    pub total_output_tokens: i64,
    /// Total estimated cost in USD.
    pub total_cost: f64,
    /// Tags attached to the session.
    pub tags: Vec<String>,
}

/// A workspace: the filesystem root a set of sessions operate within.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Workspace ID.
    pub id: String,
    /// Absolute filesystem path.
    pub path: String,
    /// Display name, if set.
    pub name: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last activity timestamp.
    pub last_activity_at: String,
    /// Number of sessions in this workspace, if the caller asked for counts.
    pub session_count: Option<i64>,
}

/// A named branch: a pointer into a session's event tree.
///
/// Schema-reservation only — see the module-level note on why no operation
/// in this crate currently mutates branch rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    /// Branch ID.
    pub id: String,
    /// Session this branch belongs to.
    pub session_id: String,
    /// Branch name, unique within the session.
    pub name: String,
    /// Description, if set.
    pub description: Option<String>,
    /// Event the branch starts at.
    pub root_event_id: String,
    /// Event the branch currently points at.
    pub head_event_id: String,
    /// Whether this is the session's default branch.
    pub is_default: bool,
    /// Creation timestamp.
    pub created_at: String,
    /// Last activity timestamp.
    pub last_activity_at: String,
}

/// A minimal reference to a branch, for embedding in other responses
/// without pulling in the full [`Branch`] row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRef {
    /// Branch ID.
    pub id: String,
    /// Branch name.
    pub name: String,
    /// Event the branch currently points at.
    pub head_event_id: String,
}

/// A reference to the point a session was forked from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkRef {
    /// Session the fork was taken from.
    pub source_session_id: String,
    /// Event the fork branched off of.
    pub source_event_id: String,
}

/// A single full-text search hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Session the matching event belongs to.
    pub session_id: String,
    /// The matching event's ID.
    pub event_id: String,
    /// Event type string (e.g. `"message.user"`).
    pub event_type: String,
    /// Snippet of matching content, with match markers.
    pub snippet: String,
    /// Relevance rank (lower is more relevant; SQLite FTS5 `bm25()` score).
    pub rank: f64,
    /// Timestamp of the matching event.
    pub timestamp: String,
}
