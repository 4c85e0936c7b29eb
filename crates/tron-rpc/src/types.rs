//! RPC wire-format types matching the iOS WebSocket protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Incoming RPC request from a client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcRequest {
    /// Unique request identifier.
    pub id: String,
    /// Method name (e.g. `session.create`).
    pub method: String,
    /// Optional parameters object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Optional idempotency key for deduplication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// Outgoing RPC response to a client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Echoed request identifier.
    pub id: String,
    /// Whether the call succeeded.
    pub success: bool,
    /// Result payload (present when `success == true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload (present when `success == false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorBody>,
}

/// Broad bucket a wire error falls into, so clients can decide UI behavior
/// (retry silently, show a dismissable toast, surface a hard failure) without
/// hardcoding a switch over every numeric code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcErrorCategory {
    /// Caller's request was malformed or invalid; retrying unchanged won't help.
    ClientError,
    /// Server-side failure; may or may not clear on retry.
    ServerError,
    /// Transient condition (e.g. the session is mid-turn); safe to retry.
    TransientError,
}

/// Structured error body inside an `RpcResponse`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcErrorBody {
    /// Numeric JSON-RPC error code (see the gateway's dispatch error table).
    pub code: i32,
    /// Stable symbolic error code (e.g. `SESSION_NOT_FOUND`), kept alongside
    /// the numeric `code` for logging, metrics labels, and older clients
    /// that still switch on it.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
    /// Category hint for client-side retry/UI decisions.
    pub category: RpcErrorCategory,
    /// Whether the caller can reasonably retry the same request.
    pub retryable: bool,
    /// Optional structured details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Server-pushed event.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcEvent {
    /// Event type (e.g. `agent.text_delta`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Associated session, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// ISO-8601 timestamp.
    pub timestamp: String,
    /// Event payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Associated run, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl RpcResponse {
    /// Build a success response.
    pub fn success(id: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            success: true,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response from an already-mapped error body.
    ///
    /// This is what every real dispatch path uses — [`crate::errors::RpcError::to_error_body`]
    /// is the only place the numeric code/category/retryable triple gets decided.
    pub fn from_error_body(id: impl Into<String>, body: RpcErrorBody) -> Self {
        Self {
            id: id.into(),
            success: false,
            result: None,
            error: Some(body),
        }
    }

    /// Build an error response from a typed [`crate::errors::RpcError`].
    pub fn from_error(id: impl Into<String>, error: &crate::errors::RpcError) -> Self {
        Self::from_error_body(id, error.to_error_body())
    }

    /// Build a bare-bones error response, for cases with no dedicated
    /// [`crate::errors::RpcError`] variant (legacy/tests). Prefer
    /// [`Self::from_error`] when an `RpcError` is available.
    pub fn error(id: impl Into<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: false,
            result: None,
            error: Some(RpcErrorBody {
                code: -32603,
                kind: kind.into(),
                message: message.into(),
                category: RpcErrorCategory::ServerError,
                retryable: false,
                details: None,
            }),
        }
    }

    /// Build an error response with structured details.
    pub fn error_with_details(
        id: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            id: id.into(),
            success: false,
            result: None,
            error: Some(RpcErrorBody {
                code: -32603,
                kind: kind.into(),
                message: message.into(),
                category: RpcErrorCategory::ServerError,
                retryable: false,
                details: Some(details),
            }),
        }
    }
}

impl RpcEvent {
    /// Create a new event with the current UTC timestamp.
    pub fn new(
        event_type: impl Into<String>,
        session_id: Option<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            session_id,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            data,
            run_id: None,
        }
    }

    /// Attach a run ID.
    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}
