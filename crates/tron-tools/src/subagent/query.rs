//! `QueryAgent` tool — queries a running subagent.
//!
//! Queries the status, events, logs, or output of a subagent session.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tron_core::tools::{
    Tool, ToolCategory, ToolParameterSchema, ToolResultBody, TronToolResult, error_result,
};

use crate::errors::ToolError;
use crate::traits::{SubagentSpawner, ToolContext, TronTool};
use crate::utils::validation::{get_optional_u64, validate_required_string};

const VALID_QUERY_TYPES: &[&str] = &["status", "events", "logs", "output"];
const DEFAULT_LIMIT: u32 = 20;

/// The `QueryAgent` tool queries a running or completed subagent.
pub struct QueryAgentTool {
    spawner: Arc<dyn SubagentSpawner>,
}

impl QueryAgentTool {
    /// Create a new `QueryAgent` tool with the given spawner.
    pub fn new(spawner: Arc<dyn SubagentSpawner>) -> Self {
        Self { spawner }
    }
}

#[async_trait]
impl TronTool for QueryAgentTool {
    fn name(&self) -> &str {
        "QueryAgent"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Custom
    }

    fn definition(&self) -> Tool {
        Tool {
            name: "QueryAgent".into(),
            description: "Query the status, events, logs, or output of a spawned sub-agent.\n\n\
                Query types:\n\
                - **status**: Get current status (running/completed/failed), turn count, token usage, and task\n\
                - **events**: Get recent events from the sub-agent session\n\
                - **logs**: Get log entries from the sub-agent session\n\
                - **output**: Get the final assistant response (only available when completed)\n\n\
                Use this to monitor sub-agents you've spawned with SpawnSubagent.".into(),
            parameters: ToolParameterSchema {
                schema_type: "object".into(),
                properties: Some({
                    let mut m = serde_json::Map::new();
                    let _ = m.insert("sessionId".into(), json!({"type": "string", "description": "Session ID of the subagent"}));
                    let _ = m.insert("queryType".into(), json!({"type": "string", "enum": VALID_QUERY_TYPES, "description": "Type of query"}));
                    let _ = m.insert("limit".into(), json!({"type": "number", "description": "Limit number of results (default: 20)"}));
                    m
                }),
                required: Some(vec!["sessionId".into(), "queryType".into()]),
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
        let session_id = match validate_required_string(&params, "sessionId", "session ID") {
            Ok(s) => s,
            Err(e) => return Ok(e),
        };

        let query_type = match validate_required_string(&params, "queryType", "query type") {
            Ok(q) => q,
            Err(e) => return Ok(e),
        };

        if !VALID_QUERY_TYPES.contains(&query_type.as_str()) {
            return Ok(error_result(format!(
                "Invalid queryType: \"{query_type}\". Valid types: {}",
                VALID_QUERY_TYPES.join(", ")
            )));
        }

        #[allow(clippy::cast_possible_truncation)]
        let limit = get_optional_u64(&params, "limit").map_or(DEFAULT_LIMIT, |v| v as u32);

        match self
            .spawner
            .query_agent(&session_id, &query_type, Some(limit))
            .await
        {
            Ok(result) => {
                let output = serde_json::to_string_pretty(&result)
                    .unwrap_or_else(|_| result.to_string());
                Ok(TronToolResult {
                    content: ToolResultBody::Blocks(vec![
                        tron_core::content::ToolResultContent::text(output),
                    ]),
                    details: Some(json!({
                        "sessionId": session_id,
                        "queryType": query_type,
                    })),
                    is_error: None,
                    stop_turn: None,
                })
            }
            Err(e) => Ok(error_result(format!("Query failed: {e}"))),
        }
    }
}
