//! Hook lifecycle payloads.
//!
//! Blocking hooks (`PreToolUse`, `UserPromptSubmit`, `PreCompact`) and
//! background hooks (`PostToolUse`, `SessionStart`, ...) share the same
//! triggered/completed event pair; the background variants additionally
//! get their own started/completed events since they race the turn runner.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload for `hook.triggered` events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookTriggeredPayload {
    /// Hook type (`"PreToolUse"`, `"PostToolUse"`, ...).
    pub hook_type: String,
    /// Matcher pattern that selected this hook, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    /// Input handed to the hook command.
    pub input: Value,
}

/// Payload for `hook.completed` events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookCompletedPayload {
    /// Hook type this completion corresponds to.
    pub hook_type: String,
    /// Decision reached (`"continue"`, `"block"`, `"modify"`).
    pub decision: String,
    /// Reason surfaced to the model/user when blocking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Whether the hook timed out and fell back to `"continue"`.
    #[serde(default)]
    pub timed_out: bool,
    /// Wall-clock duration of the hook command, in milliseconds.
    pub duration_ms: i64,
}

/// Payload for `hook.background_started` events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookBackgroundStartedPayload {
    /// Hook type (`"PostToolUse"`, `"SessionStart"`, `"SessionEnd"`, `"Stop"`,
    /// `"SubagentStop"`, `"Notification"`).
    pub hook_type: String,
    /// Command that was dispatched.
    pub command: String,
}

/// Payload for `hook.background_completed` events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookBackgroundCompletedPayload {
    /// Hook type this completion corresponds to.
    pub hook_type: String,
    /// Process exit code.
    pub exit_code: i32,
    /// Wall-clock duration, in milliseconds.
    pub duration_ms: i64,
}
