//! Plan handlers: enter, exit, getState.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::RpcContext;
use crate::errors::RpcError;
use crate::handlers::require_string_param;
use crate::registry::MethodHandler;

/// Enter plan mode for a session.
pub struct EnterPlanHandler;

#[async_trait]
impl MethodHandler for EnterPlanHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _session_id = require_string_param(params.as_ref(), "sessionId")?;
        Ok(serde_json::json!({ "planMode": true }))
    }
}

/// Exit plan mode.
pub struct ExitPlanHandler;

#[async_trait]
impl MethodHandler for ExitPlanHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _session_id = require_string_param(params.as_ref(), "sessionId")?;
        Ok(serde_json::json!({ "planMode": false }))
    }
}

/// Get plan mode state.
pub struct GetPlanStateHandler;

#[async_trait]
impl MethodHandler for GetPlanStateHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _session_id = require_string_param(params.as_ref(), "sessionId")?;
        Ok(serde_json::json!({ "planMode": false }))
    }
}
