//! `TaskManager` tool — task/project/area management.
//!
//! Routes management actions to the [`TaskManagerDelegate`] trait. Supports
//! 18 actions across tasks, projects, and areas.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tron_core::tools::{
    Tool, ToolCategory, ToolParameterSchema, ToolResultBody, TronToolResult, error_result,
};

use crate::errors::ToolError;
use crate::traits::{TaskManagerDelegate, ToolContext, TronTool};
use crate::utils::validation::validate_required_string;

const VALID_ACTIONS: &[&str] = &[
    "create", "update", "get", "list", "search", "log_time", "delete",
    "create_project", "update_project", "get_project", "list_projects", "delete_project",
    "create_area", "update_area", "get_area", "delete_area", "list_areas",
];

/// The `TaskManager` tool manages tasks, projects, and areas.
pub struct TaskManagerTool {
    delegate: Arc<dyn TaskManagerDelegate>,
}

impl TaskManagerTool {
    /// Create a new `TaskManager` tool with the given delegate.
    pub fn new(delegate: Arc<dyn TaskManagerDelegate>) -> Self {
        Self { delegate }
    }
}

#[async_trait]
impl TronTool for TaskManagerTool {
    fn name(&self) -> &str {
        "TaskManager"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Custom
    }

    fn definition(&self) -> Tool {
        Tool {
            name: "TaskManager".into(),
            description: "Manage tasks, projects, and areas.".into(),
            parameters: ToolParameterSchema {
                schema_type: "object".into(),
                properties: Some({
                    let mut m = serde_json::Map::new();
                    let _ = m.insert("action".into(), json!({
                        "type": "string",
                        "enum": VALID_ACTIONS,
                        "description": "The management action to perform"
                    }));
                    let _ = m.insert("taskId".into(), json!({"type": "string"}));
                    let _ = m.insert("title".into(), json!({"type": "string"}));
                    let _ = m.insert("description".into(), json!({"type": "string"}));
                    let _ = m.insert("status".into(), json!({"type": "string"}));
                    let _ = m.insert("priority".into(), json!({"type": "string"}));
                    let _ = m.insert("projectId".into(), json!({"type": "string"}));
                    let _ = m.insert("areaId".into(), json!({"type": "string"}));
                    let _ = m.insert("projectTitle".into(), json!({"type": "string"}));
                    let _ = m.insert("areaTitle".into(), json!({"type": "string"}));
                    let _ = m.insert("query".into(), json!({"type": "string"}));
                    let _ = m.insert("limit".into(), json!({"type": "number"}));
                    let _ = m.insert("offset".into(), json!({"type": "number"}));
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
        let action = match validate_required_string(&params, "action", "management action") {
            Ok(a) => a,
            Err(e) => return Ok(e),
        };

        if !VALID_ACTIONS.contains(&action.as_str()) {
            return Ok(error_result(format!(
                "Invalid action: \"{action}\". Valid actions: {}",
                VALID_ACTIONS.join(", ")
            )));
        }

        match self.delegate.execute_action(&action, params.clone()).await {
            Ok(result) => {
                let output = serde_json::to_string_pretty(&result)
                    .unwrap_or_else(|_| result.to_string());
                Ok(TronToolResult {
                    content: ToolResultBody::Blocks(vec![
                        tron_core::content::ToolResultContent::text(output),
                    ]),
                    details: Some(json!({"action": action})),
                    is_error: None,
                    stop_turn: None,
                })
            }
            Err(e) => Ok(error_result(format!("TaskManager error: {e}"))),
        }
    }
}
