//! `Edit` tool — exact string replacement with diff output.
//!
//! Finds an exact substring in a file and replaces it. Returns a unified diff
//! showing the change. Supports `replace_all` for multiple occurrences.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tron_core::tools::{
    Tool, ToolCategory, ToolParameterSchema, ToolResultBody, TronToolResult, error_result,
};

use crate::errors::ToolError;
use crate::traits::{FileSystemOps, ToolContext, TronTool};
use crate::utils::diff::generate_unified_diff;
use crate::utils::fs_errors::format_fs_error;
use crate::utils::path::resolve_path;
use crate::utils::validation::validate_required_string;

/// The `Edit` tool performs exact string replacement in files.
pub struct EditTool {
    fs: Arc<dyn FileSystemOps>,
}

impl EditTool {
    /// Create a new `Edit` tool with the given filesystem.
    pub fn new(fs: Arc<dyn FileSystemOps>) -> Self {
        Self { fs }
    }
}

fn truncate_preview(s: &str, max_len: usize) -> String {
    // max_len is the body limit; total output may be up to max_len + suffix.
    let total = max_len.saturating_add(3);
    tron_core::text::truncate_with_suffix(s, total, "...")
}

#[async_trait]
impl TronTool for EditTool {
    fn name(&self) -> &str {
        "Edit"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn definition(&self) -> Tool {
        Tool {
            name: "Edit".into(),
            description: "Edit a file by replacing old_string with new_string. Requires exact match.".into(),
            parameters: ToolParameterSchema {
                schema_type: "object".into(),
                properties: Some({
                    let mut m = serde_json::Map::new();
                    let _ = m.insert(
                        "file_path".into(),
                        json!({"type": "string", "description": "The path to the file to edit"}),
                    );
                    let _ = m.insert(
                        "old_string".into(),
                        json!({"type": "string", "description": "The exact string to find and replace"}),
                    );
                    let _ = m.insert(
                        "new_string".into(),
                        json!({"type": "string", "description": "The replacement string"}),
                    );
                    let _ = m.insert(
                        "replace_all".into(),
                        json!({"type": "boolean", "description": "Replace all occurrences (default: false)"}),
                    );
                    m
                }),
                required: Some(vec![
                    "file_path".into(),
                    "old_string".into(),
                    "new_string".into(),
                ]),
                description: None,
                extra: serde_json::Map::new(),
            },
        }
    }

    async fn execute(
        &self,
        params: Value,
        ctx: &ToolContext,
    ) -> Result<TronToolResult, ToolError> {
        let file_path = match validate_required_string(&params, "file_path", "path to the file") {
            Ok(p) => p,
            Err(e) => return Ok(e),
        };

        let old_string = match params.get("old_string") {
            Some(Value::String(s)) => s.clone(),
            _ => {
                return Ok(error_result(
                    "Missing required parameter: old_string (the string to find)",
                ));
            }
        };

        let new_string = match params.get("new_string") {
            Some(Value::String(s)) => s.clone(),
            _ => {
                return Ok(error_result(
                    "Missing required parameter: new_string (the replacement string)",
                ));
            }
        };

        if old_string.is_empty() {
            return Ok(error_result("old_string must not be empty"));
        }

        if old_string == new_string {
            return Ok(error_result(
                "old_string and new_string are identical — no changes would be made",
            ));
        }

        let replace_all = params
            .get("replace_all")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let resolved = resolve_path(&file_path, &ctx.working_directory);

        // Read the file
        let bytes = match self.fs.read_file(&resolved).await {
            Ok(b) => b,
            Err(e) => return Ok(format_fs_error(&e, &resolved.to_string_lossy(), "reading")),
        };

        let content = String::from_utf8_lossy(&bytes).into_owned();

        // Count occurrences
        let count = content.matches(&old_string).count();
        if count == 0 {
            let preview = truncate_preview(&old_string, 50);
            return Ok(error_result(format!(
                "old_string not found in file: \"{preview}\""
            )));
        }

        if count > 1 && !replace_all {
            return Ok(error_result(format!(
                "Found {count} occurrences of old_string. Use replace_all: true to replace all, or make old_string more specific."
            )));
        }

        // Perform replacement
        let new_content = if replace_all {
            content.replace(&old_string, &new_string)
        } else {
            content.replacen(&old_string, &new_string, 1)
        };

        let replacements = if replace_all { count } else { 1 };

        // Generate diff
        let diff = generate_unified_diff(&content, &new_content, 3);

        // Write the modified file
        if let Err(e) = self.fs.write_file(&resolved, new_content.as_bytes()).await {
            return Ok(format_fs_error(&e, &resolved.to_string_lossy(), "writing"));
        }

        let details = json!({
            "filePath": resolved.to_string_lossy(),
            "replacements": replacements,
            "oldStringPreview": truncate_preview(&old_string, 50),
            "newStringPreview": truncate_preview(&new_string, 50),
            "diff": diff,
        });

        Ok(TronToolResult {
            content: ToolResultBody::Blocks(vec![
                tron_core::content::ToolResultContent::text(diff),
            ]),
            details: Some(details),
            is_error: None,
            stop_turn: None,
        })
    }
}
