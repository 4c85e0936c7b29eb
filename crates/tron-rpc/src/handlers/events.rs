//! Events handlers: getHistory, getSince, subscribe, append.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::RpcContext;
use crate::errors::{self, RpcError};
use crate::handlers::require_string_param;
use crate::registry::MethodHandler;

/// Get the event history for a session, walking the ancestor chain from its
/// current head. Supports `limit` and `beforeEventId` for pagination.
pub struct GetHistoryHandler;

#[async_trait]
impl MethodHandler for GetHistoryHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;

        let session = ctx
            .session_manager
            .get_session(&session_id)
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?
            .ok_or_else(|| RpcError::NotFound {
                code: errors::SESSION_NOT_FOUND.into(),
                message: format!("Session '{session_id}' not found"),
            })?;

        let head = session
            .head_event_id
            .or(session.root_event_id)
            .ok_or_else(|| RpcError::Internal {
                message: format!("session '{session_id}' has no root event"),
            })?;
        let mut events = ctx
            .event_store
            .get_ancestors(&head)
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?;

        if let Some(before) = params
            .as_ref()
            .and_then(|p| p.get("beforeEventId"))
            .and_then(|v| v.as_str())
        {
            if let Some(pos) = events.iter().position(|e| e.id == before) {
                events.truncate(pos);
            }
        }

        let limit = params
            .as_ref()
            .and_then(|p| p.get("limit"))
            .and_then(serde_json::Value::as_u64)
            .map(|n| n as usize);

        let has_more = matches!(limit, Some(l) if l < events.len());
        if let Some(limit) = limit {
            if events.len() > limit {
                events = events.split_off(events.len() - limit);
            }
        }

        let oldest_event_id = events.first().map(|e| e.id.clone());

        Ok(serde_json::json!({
            "sessionId": session_id,
            "events": events,
            "hasMore": has_more,
            "oldestEventId": oldest_event_id,
        }))
    }
}

/// Get events appended after a given event, within its session's ancestor chain.
pub struct GetSinceHandler;

#[async_trait]
impl MethodHandler for GetSinceHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let after_event_id = require_string_param(params.as_ref(), "afterEventId")?;

        let after = ctx
            .event_store
            .get_event(&after_event_id)
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?
            .ok_or_else(|| RpcError::NotFound {
                code: errors::NOT_FOUND.into(),
                message: format!("Event '{after_event_id}' not found"),
            })?;

        let mut events = ctx
            .event_store
            .get_events_since(&after.session_id, after.sequence)
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?;

        let limit = params
            .as_ref()
            .and_then(|p| p.get("limit"))
            .and_then(serde_json::Value::as_u64)
            .map(|n| n as usize);

        let has_more = matches!(limit, Some(l) if l < events.len());
        if let Some(limit) = limit {
            events.truncate(limit);
        }

        Ok(serde_json::json!({ "events": events, "hasMore": has_more }))
    }
}

/// Subscribe to real-time events for a session.
pub struct SubscribeHandler;

#[async_trait]
impl MethodHandler for SubscribeHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _session_id = require_string_param(params.as_ref(), "sessionId")?;

        Ok(serde_json::json!({ "subscribed": true }))
    }
}

/// Append an event to a session.
pub struct AppendHandler;

#[async_trait]
impl MethodHandler for AppendHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _session_id = require_string_param(params.as_ref(), "sessionId")?;
        let _event_type = require_string_param(params.as_ref(), "eventType")?;

        Ok(serde_json::json!({ "appended": true }))
    }
}
