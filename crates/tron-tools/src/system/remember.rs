//! `Remember` tool — event store query with multiple action types.
//!
//! Routes memory actions to the [`EventStoreQuery`] trait, formatting results
//! for the LLM.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tron_core::tools::{
    Tool, ToolCategory, ToolParameterSchema, ToolResultBody, TronToolResult, error_result,
};

use crate::errors::ToolError;
use crate::traits::{EventStoreQuery, ToolContext, TronTool};
use crate::utils::validation::{get_optional_string, get_optional_u64, validate_required_string};

const VALID_ACTIONS: &[&str] = &[
    "recall",
    "search",
    "memory",
    "schema",
    "sessions",
    "session",
    "events",
    "messages",
    "tools",
    "logs",
    "stats",
    "read_blob",
];
const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 500;

/// The `Remember` tool queries the event store for memory and session data.
pub struct RememberTool {
    store: Arc<dyn EventStoreQuery>,
}

impl RememberTool {
    /// Create a new `Remember` tool with the given event store.
    pub fn new(store: Arc<dyn EventStoreQuery>) -> Self {
        Self { store }
    }
}

fn clamp_limit(limit: Option<u64>) -> u32 {
    #[allow(clippy::cast_possible_truncation)]
    limit.map_or(DEFAULT_LIMIT, |l| (l as u32).min(MAX_LIMIT))
}

fn format_entries(entries: &[crate::traits::MemoryEntry]) -> String {
    if entries.is_empty() {
        return "No results found.".into();
    }
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let score_str = e
                .score
                .map_or(String::new(), |s| format!(" (relevance: {s}%)"));
            format!("{}. {}{score_str}", i + 1, e.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_sessions(sessions: &[crate::traits::SessionInfo]) -> String {
    if sessions.is_empty() {
        return "No sessions found.".into();
    }
    sessions
        .iter()
        .map(|s| {
            let title = s.title.as_deref().unwrap_or("(untitled)");
            let created = s.created_at.as_deref().unwrap_or("unknown");
            format!("- {} | {} | {created}", s.session_id, title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_json_entries(entries: &[Value]) -> String {
    if entries.is_empty() {
        return "No results found.".into();
    }
    entries
        .iter()
        .map(|v| serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()))
        .collect::<Vec<_>>()
        .join("\n---\n")
}

#[async_trait]
impl TronTool for RememberTool {
    fn name(&self) -> &str {
        "Remember"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Custom
    }

    fn definition(&self) -> Tool {
        Tool {
            name: "Remember".into(),
            description: "Your memory and self-analysis tool. Query your internal database to recall past work, \
review session history, and retrieve stored content.\n\n\
Available actions:\n\
- recall (default): Semantic memory search. Uses vector similarity to find the most relevant past \
work even when exact keywords don't match. Always provide a query.\n\
- search: Keyword search via exact term matching in memory ledger entries.\n\
- sessions: List recent sessions.\n\
- session: Get details for a specific session.\n\
- events: Get raw events (filter by session_id, type, turn).\n\
- messages: Get conversation messages for a session.\n\
- tools: Get tool calls and results for a session.\n\
- logs: Get application logs.\n\
- stats: Get database statistics.\n\
- schema: List database tables and columns.\n\
- read_blob: Read stored content from blob storage.".into(),
            parameters: ToolParameterSchema {
                schema_type: "object".into(),
                properties: Some({
                    let mut m = serde_json::Map::new();
                    let _ = m.insert("action".into(), json!({
                        "type": "string",
                        "enum": VALID_ACTIONS,
                        "description": "The query action to perform"
                    }));
                    let _ = m.insert("query".into(), json!({"type": "string", "description": "Search query"}));
                    let _ = m.insert("session_id".into(), json!({"type": "string", "description": "Session ID to query"}));
                    let _ = m.insert("blob_id".into(), json!({"type": "string", "description": "Blob ID to read"}));
                    let _ = m.insert("type".into(), json!({"type": "string", "description": "Event type filter"}));
                    let _ = m.insert("turn".into(), json!({"type": "number", "description": "Turn number filter"}));
                    let _ = m.insert("level".into(), json!({"type": "string", "description": "Log level filter"}));
                    let _ = m.insert("limit".into(), json!({"type": "number", "description": "Max results (default 20, max 500)"}));
                    let _ = m.insert("offset".into(), json!({"type": "number", "description": "Pagination offset"}));
                    m
                }),
                required: Some(vec!["action".into()]),
                description: None,
                extra: serde_json::Map::new(),
            },
        }
    }

    async fn execute(
        &self,
        params: Value,
        _ctx: &ToolContext,
    ) -> Result<TronToolResult, ToolError> {
        let action = match validate_required_string(&params, "action", "query action") {
            Ok(a) => a,
            Err(e) => return Ok(e),
        };

        if !VALID_ACTIONS.contains(&action.as_str()) {
            return Ok(error_result(format!(
                "Invalid action: \"{action}\". Valid actions: {}",
                VALID_ACTIONS.join(", ")
            )));
        }

        let limit = clamp_limit(get_optional_u64(&params, "limit"));
        #[allow(clippy::cast_possible_truncation)]
        let offset = get_optional_u64(&params, "offset").unwrap_or(0) as u32;
        let query = get_optional_string(&params, "query");
        let session_id = get_optional_string(&params, "session_id");

        let content = match action.as_str() {
            "recall" => {
                let q = query.unwrap_or_default();
                let entries = self.store.recall_memory(&q, limit).await?;
                format_entries(&entries)
            }
            "search" | "memory" => {
                let q = query.unwrap_or_default();
                let entries = self
                    .store
                    .search_memory(session_id.as_deref(), &q, limit, offset)
                    .await?;
                format_entries(&entries)
            }
            "sessions" => {
                let sessions = self.store.list_sessions(limit, offset).await?;
                format_sessions(&sessions)
            }
            "session" => {
                let Some(sid) = &session_id else {
                    return Ok(error_result("session action requires session_id parameter"));
                };
                match self.store.get_session(sid).await? {
                    Some(s) => {
                        serde_json::to_string_pretty(&s).unwrap_or_else(|_| format!("{s:?}"))
                    }
                    None => format!("Session not found: {sid}"),
                }
            }
            "events" => {
                let sid = session_id.as_deref().unwrap_or("");
                let event_type = get_optional_string(&params, "type");
                #[allow(clippy::cast_possible_truncation)]
                let turn = get_optional_u64(&params, "turn").map(|v| v as u32);
                let entries = self
                    .store
                    .get_events(sid, event_type.as_deref(), turn, limit, offset)
                    .await?;
                format_json_entries(&entries)
            }
            "messages" => {
                let Some(sid) = &session_id else {
                    return Ok(error_result(
                        "messages action requires session_id parameter",
                    ));
                };
                let entries = self.store.get_messages(sid, limit).await?;
                format_json_entries(&entries)
            }
            "tools" => {
                let Some(sid) = &session_id else {
                    return Ok(error_result("tools action requires session_id parameter"));
                };
                let entries = self.store.get_tool_calls(sid, limit).await?;
                format_json_entries(&entries)
            }
            "logs" => {
                let sid = session_id.as_deref().unwrap_or("");
                let level = get_optional_string(&params, "level");
                let entries = self
                    .store
                    .get_logs(sid, level.as_deref(), limit, offset)
                    .await?;
                format_json_entries(&entries)
            }
            "stats" => {
                let stats = self.store.get_stats().await?;
                serde_json::to_string_pretty(&stats).unwrap_or_else(|_| stats.to_string())
            }
            "schema" => self.store.get_schema().await?,
            "read_blob" => {
                let Some(blob_id) = get_optional_string(&params, "blob_id") else {
                    return Ok(error_result("read_blob action requires blob_id parameter"));
                };
                self.store.read_blob(&blob_id).await?
            }
            _ => unreachable!(),
        };

        Ok(TronToolResult {
            content: ToolResultBody::Blocks(vec![tron_core::content::ToolResultContent::text(
                content,
            )]),
            details: Some(json!({"action": action})),
            is_error: None,
            stop_turn: None,
        })
    }
}
