//! Tree handlers: getVisualization, getBranches, getSubtree, getAncestors, compareBranches.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::RpcContext;
use crate::errors::RpcError;
use crate::handlers::require_string_param;
use crate::registry::MethodHandler;

/// Get tree visualization for a session.
pub struct GetVisualizationHandler;

#[async_trait]
impl MethodHandler for GetVisualizationHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _session_id = require_string_param(params.as_ref(), "sessionId")?;
        Ok(serde_json::json!({ "stub": true, "tree": {} }))
    }
}

/// Get branches for a session.
pub struct GetBranchesHandler;

#[async_trait]
impl MethodHandler for GetBranchesHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _session_id = require_string_param(params.as_ref(), "sessionId")?;
        Ok(serde_json::json!({ "branches": [] }))
    }
}

/// Get a subtree rooted at a specific event.
pub struct GetSubtreeHandler;

#[async_trait]
impl MethodHandler for GetSubtreeHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _event_id = require_string_param(params.as_ref(), "eventId")?;
        Ok(serde_json::json!({ "stub": true, "subtree": {} }))
    }
}

/// Get ancestor chain for an event, root-ward, ignoring session boundaries.
pub struct GetAncestorsHandler;

#[async_trait]
impl MethodHandler for GetAncestorsHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let event_id = require_string_param(params.as_ref(), "eventId")?;
        let events = ctx
            .event_store
            .get_ancestors(&event_id)
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?;
        Ok(serde_json::json!({ "events": events }))
    }
}

/// Compare two branches.
pub struct CompareBranchesHandler;

#[async_trait]
impl MethodHandler for CompareBranchesHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _branch_a = require_string_param(params.as_ref(), "branchA")?;
        let _branch_b = require_string_param(params.as_ref(), "branchB")?;
        Ok(serde_json::json!({ "stub": true, "comparison": {} }))
    }
}
