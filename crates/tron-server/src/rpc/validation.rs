//! Input validation helpers for RPC parameters.

use super::errors::RpcError;

/// Maximum prompt length (1 MB).
pub const MAX_PROMPT_LENGTH: usize = 1_048_576;

/// Maximum general string parameter length (8 KB).
pub const MAX_PARAM_LENGTH: usize = 8_192;

/// Validate that a string parameter does not exceed `max_len` bytes.
pub fn validate_string_param(value: &str, name: &str, max_len: usize) -> Result<(), RpcError> {
    if value.len() > max_len {
        return Err(RpcError::InvalidParams {
            message: format!(
                "Parameter '{name}' exceeds maximum length ({} > {max_len})",
                value.len()
            ),
        });
    }
    Ok(())
}

/// Sanitize an error message for client consumption.
///
/// Preserves user-facing messages (invalid params, not found) but strips
/// internal details (file paths, stack traces) from internal errors.
pub fn sanitize_error_message(err: &RpcError) -> String {
    match err {
        RpcError::Parse { message }
        | RpcError::InvalidParams { message }
        | RpcError::NotFound { message, .. }
        | RpcError::NotAvailable { message }
        | RpcError::Custom { message, .. } => message.clone(),
        RpcError::MethodNotFound { .. } => err.to_string(),
        RpcError::Internal { .. } => "Internal error".to_string(),
    }
}
