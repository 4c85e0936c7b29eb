//! ADAPTER(ios-compat): Temporary compatibility adapters for iOS client.
//!
//! This entire module exists to transform Rust server responses into the format
//! the iOS app currently expects. Every public function is tagged for future removal.
//!
//! To find all adapter usage:  `grep -rn "ADAPTER(ios-compat)" packages/agent-rs/`
//! To remove: delete this module, remove `pub mod adapters` from lib.rs,
//!            and revert each tagged call site (instructions inline at each site).

use std::collections::HashMap;

use serde_json::{json, Value};
use tron_core::tools::Tool;

/// ADAPTER(ios-compat): iOS splits tools on ":" to show name + description in context sheet.
///
/// Converts bare tool names like `["bash", "read"]` into formatted strings
/// like `["bash: Execute shell commands", "read: Read file contents"]`.
///
/// REMOVE: delete this function and revert call sites to use bare names.
pub fn adapt_tools_content(bare_names: &[String], tool_defs: &[Tool]) -> Vec<String> {
    let lookup: HashMap<&str, &str> = tool_defs
        .iter()
        .map(|t| (t.name.as_str(), t.description.as_str()))
        .collect();

    bare_names
        .iter()
        .map(|name| {
            if let Some(desc) = lookup.get(name.as_str()) {
                let first_line = desc.lines().next().unwrap_or(desc);
                let truncated = if first_line.len() > 120 {
                    format!("{}...", &first_line[..117])
                } else {
                    first_line.to_string()
                };
                format!("{name}: {truncated}")
            } else {
                name.clone()
            }
        })
        .collect()
}

/// ADAPTER(ios-compat): iOS reads `tokenRecord.source.rawXxxTokens` for the stats line.
///
/// Builds the nested token record structure that iOS `ConsolidatedAnalytics.extractTokenUsage()`
/// expects from both WebSocket `turn_end` events and persisted assistant message payloads.
///
/// REMOVE: delete this function; iOS should read `tokenUsage` directly.
pub fn build_token_record(
    input: u64,
    output: u64,
    cache_read: Option<u64>,
    cache_create: Option<u64>,
    provider: &str,
    session_id: &str,
    turn: u32,
) -> Value {
    let now = chrono::Utc::now().to_rfc3339();
    let cr = cache_read.unwrap_or(0);
    let cc = cache_create.unwrap_or(0);
    // Anthropic API: input/cacheRead/cacheCreation are MUTUALLY EXCLUSIVE.
    // input = non-cached new input only, cacheRead = reused from prior context,
    // cacheCreation = new tokens written to cache. Total context = sum of all three.
    let context_window = input + cr + cc;
    let new_input = input + cc;

    json!({
        "source": {
            "rawInputTokens": input,
            "rawOutputTokens": output,
            "rawCacheReadTokens": cr,
            "rawCacheCreationTokens": cc,
            "rawCacheCreation5mTokens": 0,
            "rawCacheCreation1hTokens": 0,
            "provider": provider,
            "timestamp": now,
        },
        "computed": {
            "contextWindowTokens": context_window,
            "newInputTokens": new_input,
            "previousContextBaseline": cr,
            "calculationMethod": "default",
        },
        "meta": {
            "turn": turn,
            "sessionId": session_id,
            "extractedAt": now,
            "normalizedAt": now,
        }
    })
}

/// ADAPTER(ios-compat): iOS expects `input` not `arguments` on `tool_use` content blocks.
///
/// Persistence stores assistant content with `"input"` (Anthropic API wire format)
/// because iOS reads it directly. The Rust typed `AssistantContent::ToolUse` uses
/// `arguments` internally. Currently handled by:
///
/// 1. **Write path**: `tron_runtime::pipeline::persistence::build_content_json()` renames
///    `arguments` → `input` when persisting `message.assistant` events.
/// 2. **Read path**: `#[serde(alias = "input")]` on `AssistantContent::ToolUse.arguments`
///    allows deserialization from either field name during reconstruction.
///
/// REMOVE: When iOS is updated to read `arguments` natively, remove the alias from
/// `AssistantContent`, remove the rename in `build_content_json`, and delete this comment.
/// The Rust server should use `arguments` consistently; iOS adapts to the server's format.
pub fn adapt_assistant_content_for_ios(content: &mut [Value]) {
    for block in content.iter_mut() {
        if block.get("type").and_then(Value::as_str) == Some("tool_use") {
            if let Some(args) = block.get("arguments").cloned() {
                if let Some(obj) = block.as_object_mut() {
                    obj.remove("arguments");
                    let _ = obj.insert("input".into(), args);
                }
            }
        }
    }
}

/// ADAPTER(ios-compat): iOS expects `totalCount` in `skill.list` response.
///
/// Mutates the response JSON to add `totalCount` field alongside `skills` array.
///
/// REMOVE: delete this function; revert call site to `Ok(json!({ "skills": skills }))`.
pub fn adapt_skill_list(response: &mut Value) {
    if let Some(arr) = response.get("skills").and_then(Value::as_array) {
        response["totalCount"] = json!(arr.len());
    }
}

/// ADAPTER(ios-compat): iOS reads `tokenRecord` from `turn_end` events for stats display.
///
/// If `data` contains `tokenUsage`, extracts the fields and injects a `tokenRecord`
/// in the nested format iOS expects.
///
/// REMOVE: delete this function and its call site; iOS should read `tokenUsage` directly.
pub fn adapt_turn_end_data(data: &mut Value, session_id: &str, turn: u32) {
    let usage = &data["tokenUsage"];
    if usage.is_null() {
        return;
    }

    let input = usage["inputTokens"].as_u64().unwrap_or(0);
    let output = usage["outputTokens"].as_u64().unwrap_or(0);
    let cache_read = usage["cacheReadTokens"].as_u64();
    let cache_create = usage["cacheCreationTokens"].as_u64();

    data["tokenRecord"] = build_token_record(
        input,
        output,
        cache_read,
        cache_create,
        "anthropic",
        session_id,
        turn,
    );
}
