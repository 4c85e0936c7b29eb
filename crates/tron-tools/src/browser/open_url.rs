//! `OpenURL` tool — opens a URL in the host app's browser (e.g. Safari on iOS).
//!
//! Fire-and-forget: the tool validates the URL and hands it to the
//! [`NotifyDelegate`], which emits a tool-execution event the client listens
//! for rather than performing a network request itself.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tron_core::tools::{
    Tool, ToolCategory, ToolParameterSchema, ToolResultBody, TronToolResult, error_result,
};

use crate::errors::ToolError;
use crate::traits::{NotifyDelegate, ToolContext, TronTool};
use crate::utils::validation::validate_required_string;

/// The `OpenURL` tool opens a URL in the client app.
pub struct OpenURLTool {
    delegate: Arc<dyn NotifyDelegate>,
}

impl OpenURLTool {
    /// Create a new `OpenURL` tool with the given notify delegate.
    pub fn new(delegate: Arc<dyn NotifyDelegate>) -> Self {
        Self { delegate }
    }
}

#[async_trait]
impl TronTool for OpenURLTool {
    fn name(&self) -> &str {
        "OpenURL"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Custom
    }

    fn definition(&self) -> Tool {
        Tool {
            name: "OpenURL".into(),
            description: "Open a URL in the user's browser.".into(),
            parameters: ToolParameterSchema {
                schema_type: "object".into(),
                properties: Some({
                    let mut m = serde_json::Map::new();
                    let _ = m.insert(
                        "url".into(),
                        json!({"type": "string", "description": "The URL to open"}),
                    );
                    m
                }),
                required: Some(vec!["url".into()]),
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
        let url = match validate_required_string(&params, "url", "URL to open") {
            Ok(u) => u,
            Err(e) => return Ok(e),
        };

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Ok(error_result(format!("unsupported URL scheme: {url}")));
        }

        match self.delegate.open_url_in_app(&url).await {
            Ok(()) => Ok(TronToolResult {
                content: ToolResultBody::Text(format!("Opened {url}")),
                details: Some(json!({"url": url})),
                is_error: None,
                stop_turn: None,
            }),
            Err(e) => Ok(error_result(format!("failed to open URL: {e}"))),
        }
    }
}
