//! Parameter extraction and validation helpers shared across tool implementations.

use serde_json::Value;
use tron_core::tools::{TronToolResult, error_result};

/// Extract a required string parameter.
///
/// Returns a ready-to-return error [`TronToolResult`] on the `Err` side so
/// callers can propagate it directly with `return Ok(e)`.
pub fn validate_required_string(
    params: &Value,
    key: &str,
    description: &str,
) -> Result<String, TronToolResult> {
    match params.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) | Some(Value::Null) | None => Err(error_result(format!(
            "Missing required parameter: {key} ({description})"
        ))),
        Some(_) => Err(error_result(format!(
            "Invalid type for parameter: {key} (expected string, {description})"
        ))),
    }
}

/// Extract an optional string parameter, ignoring non-string values.
pub fn get_optional_string(params: &Value, key: &str) -> Option<String> {
    params.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Extract an optional u64 parameter, ignoring non-numeric values.
pub fn get_optional_u64(params: &Value, key: &str) -> Option<u64> {
    params.get(key).and_then(Value::as_u64)
}

/// Extract an optional bool parameter, ignoring non-bool values.
pub fn get_optional_bool(params: &Value, key: &str) -> Option<bool> {
    params.get(key).and_then(Value::as_bool)
}

/// Reject paths that would resolve to (or above) the filesystem root.
pub fn validate_path_not_root(path: &str, param_name: &str) -> Result<(), TronToolResult> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "~" {
        return Err(error_result(format!(
            "Refusing to write to the filesystem root via parameter: {param_name}"
        )));
    }
    Ok(())
}
