//! RPC error codes and error type.
//!
//! Wire codes follow the JSON-RPC 2.0 reserved range (`-32700..-32600`) plus
//! the application range (`-32000..-32004`) the dispatch table in the gateway
//! spec assigns to session/runtime error kinds. [`RpcError::code`] still
//! returns the stable symbolic string (used for metrics labels and log
//! fields); [`RpcError::to_error_body`] is what actually maps a variant to
//! its numeric code, category, and retryability for the wire.

use crate::types::{RpcErrorBody, RpcErrorCategory};

// ── Error code constants ────────────────────────────────────────────

/// Invalid or missing parameters.
pub const INVALID_PARAMS: &str = "INVALID_PARAMS";
/// Unexpected internal error.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
/// Malformed request payload (not valid JSON).
pub const PARSE_ERROR: &str = "PARSE_ERROR";
/// Method not found in the registry.
pub const METHOD_NOT_FOUND: &str = "METHOD_NOT_FOUND";
/// Resource or feature not available.
pub const NOT_AVAILABLE: &str = "NOT_AVAILABLE";
/// Generic not-found.
pub const NOT_FOUND: &str = "NOT_FOUND";
/// Operation not valid in current state.
pub const INVALID_OPERATION: &str = "INVALID_OPERATION";
/// Session does not exist.
pub const SESSION_NOT_FOUND: &str = "SESSION_NOT_FOUND";
/// Session exists but is not active.
pub const SESSION_NOT_ACTIVE: &str = "SESSION_NOT_ACTIVE";
/// Concurrent session limit reached.
pub const MAX_SESSIONS_REACHED: &str = "MAX_SESSIONS_REACHED";
/// File does not exist.
pub const FILE_NOT_FOUND: &str = "FILE_NOT_FOUND";
/// Generic file I/O error.
pub const FILE_ERROR: &str = "FILE_ERROR";
/// Filesystem operation error.
pub const FILESYSTEM_ERROR: &str = "FILESYSTEM_ERROR";
/// Resource already exists.
pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
/// Path is invalid or unsafe.
pub const INVALID_PATH: &str = "INVALID_PATH";
/// Permission denied.
pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
/// Browser streaming error.
pub const BROWSER_ERROR: &str = "BROWSER_ERROR";
/// Skill loading/execution error.
pub const SKILL_ERROR: &str = "SKILL_ERROR";
/// Canvas error.
pub const CANVAS_ERROR: &str = "CANVAS_ERROR";
/// Tool result submission failed.
pub const TOOL_RESULT_FAILED: &str = "TOOL_RESULT_FAILED";
/// Transcription error.
pub const TRANSCRIPTION_ERROR: &str = "TRANSCRIPTION_ERROR";
/// Voice note error.
pub const VOICE_NOTE_ERROR: &str = "VOICE_NOTE_ERROR";
/// Message operation error.
pub const MESSAGE_ERROR: &str = "MESSAGE_ERROR";
/// Git operation error.
pub const GIT_ERROR: &str = "GIT_ERROR";
/// Device registration error.
pub const REGISTRATION_ERROR: &str = "REGISTRATION_ERROR";

/// RPC error type returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Request body was not valid JSON.
    #[error("{message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    /// No handler registered for the requested method.
    #[error("Method '{method}' not found")]
    MethodNotFound {
        /// The unrecognized method name.
        method: String,
    },

    /// Required parameter missing or wrong type.
    #[error("{message}")]
    InvalidParams {
        /// Description of what is wrong.
        message: String,
    },

    /// Requested resource not found.
    #[error("{message}")]
    NotFound {
        /// Specific error code (e.g. `SESSION_NOT_FOUND`).
        code: String,
        /// Human-readable message.
        message: String,
    },

    /// Internal server error.
    #[error("{message}")]
    Internal {
        /// Description.
        message: String,
    },

    /// Feature or resource not available.
    #[error("{message}")]
    NotAvailable {
        /// Description.
        message: String,
    },

    /// Domain-specific error with arbitrary code.
    #[error("{message}")]
    Custom {
        /// Machine-readable code.
        code: String,
        /// Human-readable message.
        message: String,
        /// Optional structured details.
        details: Option<serde_json::Value>,
    },
}

impl RpcError {
    /// Machine-readable error code for this variant.
    pub fn code(&self) -> &str {
        match self {
            Self::Parse { .. } => PARSE_ERROR,
            Self::MethodNotFound { .. } => METHOD_NOT_FOUND,
            Self::InvalidParams { .. } => INVALID_PARAMS,
            Self::NotFound { code, .. } | Self::Custom { code, .. } => code,
            Self::Internal { .. } => INTERNAL_ERROR,
            Self::NotAvailable { .. } => NOT_AVAILABLE,
        }
    }

    /// Numeric JSON-RPC code, category, and retryable hint for this variant.
    ///
    /// Mirrors the gateway's dispatch error table: the JSON-RPC reserved
    /// range for protocol-level failures (parse/method/params/internal) and
    /// the `-32000..-32004` application range for session/runtime kinds.
    /// `NotFound`/`Custom` carry an internal symbolic code that doesn't
    /// always have a dedicated number in that table (e.g. `FILE_NOT_FOUND`,
    /// `FILESYSTEM_ERROR`); those fall back to the nearest matching bucket.
    fn wire(&self) -> (i32, RpcErrorCategory, bool) {
        use RpcErrorCategory::{ClientError, ServerError, TransientError};

        match self {
            Self::Parse { .. } => (-32700, ClientError, false),
            Self::MethodNotFound { .. } => (-32601, ClientError, false),
            Self::InvalidParams { .. } => (-32602, ClientError, false),
            Self::Internal { .. } => (-32603, ServerError, true),
            Self::NotAvailable { .. } => (-32002, ServerError, true),
            Self::NotFound { code, .. } => match code.as_str() {
                c if c == SESSION_NOT_ACTIVE => (-32001, ClientError, false),
                _ => (-32000, ClientError, false),
            },
            Self::Custom { code, .. } => match code.as_str() {
                c if c == SESSION_NOT_ACTIVE => (-32001, ClientError, false),
                c if c == MAX_SESSIONS_REACHED => (-32002, ServerError, true),
                "SESSION_BUSY" => (-32003, TransientError, true),
                "CONTEXT_OVERFLOW" => (-32004, ClientError, false),
                _ => (-32603, ServerError, true),
            },
        }
    }

    /// Convert to the wire-format error body.
    pub fn to_error_body(&self) -> RpcErrorBody {
        let (code, category, retryable) = self.wire();
        RpcErrorBody {
            code,
            kind: self.code().to_owned(),
            message: self.to_string(),
            category,
            retryable,
            details: match self {
                Self::Custom { details, .. } => details.clone(),
                _ => None,
            },
        }
    }
}
