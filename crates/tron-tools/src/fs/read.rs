//! `Read` tool — reads file contents with line numbers.
//!
//! Outputs lines in the format `   1→line content` with right-aligned line
//! numbers and arrow separators. Supports offset/limit for partial reads and
//! truncates long lines and large outputs.

use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tron_core::tools::{
    Tool, ToolCategory, ToolParameterSchema, ToolResultBody, TronToolResult, error_result,
};

use crate::errors::ToolError;
use crate::traits::{FileSystemOps, ToolContext, TronTool};
use crate::utils::fs_errors::format_fs_error;
use crate::utils::path::resolve_path;
use crate::utils::truncation::{TruncateOptions, estimate_tokens, truncate_output};
use crate::utils::validation::validate_required_string;

const MAX_LINE_LENGTH: usize = 2000;
const MAX_OUTPUT_TOKENS: usize = 20_000;
const ARROW: &str = "\u{2192}";

/// The `Read` tool reads file contents with line numbers.
pub struct ReadTool {
    fs: Arc<dyn FileSystemOps>,
}

impl ReadTool {
    /// Create a new `Read` tool with the given filesystem.
    pub fn new(fs: Arc<dyn FileSystemOps>) -> Self {
        Self { fs }
    }
}

/// Format lines with line numbers into a string.
fn format_lines(lines: &[&str], start: usize, end: usize) -> String {
    let width = format!("{end}").len().max(6);
    let mut output = String::new();
    for (i, line) in lines.iter().enumerate() {
        let line_num = start + i + 1;
        let display_line = if line.len() > MAX_LINE_LENGTH {
            format!("{}... [line truncated]", &line[..MAX_LINE_LENGTH])
        } else {
            (*line).to_string()
        };
        let _ = writeln!(output, "{line_num:>width$}{ARROW}{display_line}");
    }
    output
}

#[async_trait]
impl TronTool for ReadTool {
    fn name(&self) -> &str {
        "Read"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn definition(&self) -> Tool {
        Tool {
            name: "Read".into(),
            description: "Read the contents of a file. Returns the file content with line numbers.".into(),
            parameters: ToolParameterSchema {
                schema_type: "object".into(),
                properties: Some({
                    let mut m = serde_json::Map::new();
                    let _ = m.insert(
                        "file_path".into(),
                        json!({"type": "string", "description": "The path to the file to read (absolute or relative)"}),
                    );
                    let _ = m.insert(
                        "offset".into(),
                        json!({"type": "number", "description": "Line number to start reading from (0-indexed)"}),
                    );
                    let _ = m.insert(
                        "limit".into(),
                        json!({"type": "number", "description": "Maximum number of lines to read"}),
                    );
                    m
                }),
                required: Some(vec!["file_path".into()]),
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

        let resolved = resolve_path(&file_path, &ctx.working_directory);
        #[allow(clippy::cast_possible_truncation)]
        let offset = params.get("offset").and_then(Value::as_u64).unwrap_or(0) as usize;
        let limit = params.get("limit").and_then(Value::as_u64);

        // Check if path is a directory
        if let Ok(meta) = self.fs.metadata(&resolved).await {
            if meta.is_dir() {
                return Ok(error_result(format!("Is a directory: {}", resolved.display())));
            }
        }

        let bytes = match self.fs.read_file(&resolved).await {
            Ok(b) => b,
            Err(e) => return Ok(format_fs_error(&e, &resolved.to_string_lossy(), "reading")),
        };

        // Binary detection
        let check_len = bytes.len().min(8192);
        if bytes[..check_len].contains(&0) {
            return Ok(error_result(format!("Cannot read binary file: {}", resolved.display())));
        }

        let content = String::from_utf8_lossy(&bytes);
        let all_lines: Vec<&str> = content.lines().collect();
        let total_lines = all_lines.len();
        let start = offset.min(total_lines);
        #[allow(clippy::cast_possible_truncation)]
        let end = limit.map_or(total_lines, |l| (start + l as usize).min(total_lines));
        let selected = &all_lines[start..end];

        if selected.is_empty() {
            return Ok(TronToolResult {
                content: ToolResultBody::Text(String::new()),
                details: Some(json!({
                    "filePath": resolved.to_string_lossy(),
                    "totalLines": total_lines,
                    "linesReturned": 0,
                    "startLine": start + 1,
                    "endLine": start,
                    "truncated": false,
                })),
                is_error: None,
                stop_turn: None,
            });
        }

        let output = format_lines(selected, start, end);
        let original_tokens = estimate_tokens(output.len());
        let is_truncated = original_tokens > MAX_OUTPUT_TOKENS;
        let final_output = if is_truncated {
            truncate_output(&output, MAX_OUTPUT_TOKENS, &TruncateOptions {
                preserve_start_lines: 20,
                preserve_end_lines: 20,
                ..Default::default()
            }).content
        } else {
            output
        };

        Ok(TronToolResult {
            content: ToolResultBody::Blocks(vec![
                tron_core::content::ToolResultContent::text(final_output.clone()),
            ]),
            details: Some(json!({
                "filePath": resolved.to_string_lossy(),
                "totalLines": total_lines,
                "linesReturned": selected.len(),
                "startLine": start + 1,
                "endLine": end,
                "truncated": is_truncated,
                "originalTokens": original_tokens,
                "finalTokens": estimate_tokens(final_output.len()),
            })),
            is_error: None,
            stop_turn: None,
        })
    }
}
