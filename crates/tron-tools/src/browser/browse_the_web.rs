//! `BrowseTheWeb` tool — drives a CDP browser session.
//!
//! Validates the `sessionId`/`action` envelope and delegates actual execution
//! to the [`BrowserDelegate`] trait — the real implementation (Chrome via CDP)
//! lives in the `tron-browser` crate so this tool stays backend-agnostic.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tron_core::tools::{
    Tool, ToolCategory, ToolParameterSchema, ToolResultBody, TronToolResult, error_result,
};

use crate::errors::ToolError;
use crate::traits::{BrowserAction, BrowserDelegate, ToolContext, TronTool};
use crate::utils::validation::validate_required_string;

/// All actions the CDP backend supports.
pub const ACTIONS: &[&str] = &[
    "navigate",
    "back",
    "forward",
    "reload",
    "click",
    "fill",
    "type",
    "select",
    "hover",
    "press",
    "screenshot",
    "snapshot",
    "get_text",
    "get_attribute",
    "wait_for",
    "scroll",
    "pdf",
    "close",
];

/// The `BrowseTheWeb` tool drives a single browser session through CDP.
pub struct BrowseTheWebTool {
    delegate: Arc<dyn BrowserDelegate>,
}

impl BrowseTheWebTool {
    /// Create a new `BrowseTheWeb` tool backed by the given browser delegate.
    pub fn new(delegate: Arc<dyn BrowserDelegate>) -> Self {
        Self { delegate }
    }
}

#[async_trait]
impl TronTool for BrowseTheWebTool {
    fn name(&self) -> &str {
        "BrowseTheWeb"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Custom
    }

    fn definition(&self) -> Tool {
        Tool {
            name: "BrowseTheWeb".into(),
            description: "Control a headless browser session: navigate, click, type, screenshot, and more.".into(),
            parameters: ToolParameterSchema {
                schema_type: "object".into(),
                properties: Some({
                    let mut m = serde_json::Map::new();
                    let _ = m.insert(
                        "sessionId".into(),
                        json!({"type": "string", "description": "Browser session identifier — reused across calls to keep the same tab/state"}),
                    );
                    let _ = m.insert(
                        "action".into(),
                        json!({"type": "string", "enum": ACTIONS, "description": "The browser action to perform"}),
                    );
                    let _ = m.insert(
                        "url".into(),
                        json!({"type": "string", "description": "Target URL (navigate)"}),
                    );
                    let _ = m.insert(
                        "selector".into(),
                        json!({"type": "string", "description": "CSS selector (click, fill, type, select, hover, get_text, get_attribute, wait_for)"}),
                    );
                    let _ = m.insert(
                        "value".into(),
                        json!({"type": "string", "description": "Value to fill/select (fill, select)"}),
                    );
                    let _ = m.insert(
                        "text".into(),
                        json!({"type": "string", "description": "Text to type (type)"}),
                    );
                    let _ = m.insert(
                        "key".into(),
                        json!({"type": "string", "description": "Key to press (press)"}),
                    );
                    let _ = m.insert(
                        "attribute".into(),
                        json!({"type": "string", "description": "Attribute name (get_attribute)"}),
                    );
                    let _ = m.insert(
                        "direction".into(),
                        json!({"type": "string", "enum": ["up", "down"], "description": "Scroll direction (scroll)"}),
                    );
                    let _ = m.insert(
                        "amount".into(),
                        json!({"type": "number", "description": "Scroll amount in pixels (scroll)"}),
                    );
                    let _ = m.insert(
                        "timeoutMs".into(),
                        json!({"type": "number", "description": "Wait timeout in milliseconds (wait_for)"}),
                    );
                    let _ = m.insert(
                        "path".into(),
                        json!({"type": "string", "description": "Output file path (pdf)"}),
                    );
                    m
                }),
                required: Some(vec!["sessionId".into(), "action".into()]),
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
        let session_id = match validate_required_string(&params, "sessionId", "browser session id")
        {
            Ok(s) => s,
            Err(e) => return Ok(e),
        };
        let action = match validate_required_string(&params, "action", "browser action") {
            Ok(a) => a,
            Err(e) => return Ok(e),
        };

        if !ACTIONS.contains(&action.as_str()) {
            return Ok(error_result(format!("unknown browser action: {action}")));
        }

        if action == "close" {
            return match self.delegate.close_session(&session_id).await {
                Ok(()) => Ok(TronToolResult {
                    content: ToolResultBody::Text("Browser session closed".into()),
                    details: None,
                    is_error: None,
                    stop_turn: None,
                }),
                Err(e) => Ok(error_result(format!("failed to close browser session: {e}"))),
            };
        }

        let browser_action = BrowserAction {
            action: action.clone(),
            params: params.clone(),
        };

        match self.delegate.execute_action(&session_id, &browser_action).await {
            Ok(result) => Ok(TronToolResult {
                content: ToolResultBody::Text(result.content),
                details: result.details,
                is_error: None,
                stop_turn: None,
            }),
            Err(e) => Ok(error_result(format!("browser action '{action}' failed: {e}"))),
        }
    }
}
