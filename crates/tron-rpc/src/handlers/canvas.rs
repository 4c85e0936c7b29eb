//! Canvas handler: get.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::RpcContext;
use crate::errors::RpcError;
use crate::handlers::require_string_param;
use crate::registry::MethodHandler;

/// Get a canvas by ID.
pub struct GetCanvasHandler;

#[async_trait]
impl MethodHandler for GetCanvasHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _canvas_id = require_string_param(params.as_ref(), "canvasId")?;
        Ok(serde_json::json!({ "stub": true }))
    }
}
