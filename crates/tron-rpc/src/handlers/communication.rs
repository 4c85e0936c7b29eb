//! Communication handlers: send, receive, subscribe, unsubscribe.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::RpcContext;
use crate::errors::RpcError;
use crate::handlers::require_string_param;
use crate::registry::MethodHandler;

/// Send a communication message.
pub struct SendHandler;

#[async_trait]
impl MethodHandler for SendHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _channel = require_string_param(params.as_ref(), "channel")?;
        Ok(serde_json::json!({ "sent": true }))
    }
}

/// Receive pending messages.
pub struct ReceiveHandler;

#[async_trait]
impl MethodHandler for ReceiveHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _channel = require_string_param(params.as_ref(), "channel")?;
        Ok(serde_json::json!({ "messages": [] }))
    }
}

/// Subscribe to a communication channel.
pub struct SubscribeHandler;

#[async_trait]
impl MethodHandler for SubscribeHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _channel = require_string_param(params.as_ref(), "channel")?;
        Ok(serde_json::json!({ "subscribed": true }))
    }
}

/// Unsubscribe from a communication channel.
pub struct UnsubscribeHandler;

#[async_trait]
impl MethodHandler for UnsubscribeHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _channel = require_string_param(params.as_ref(), "channel")?;
        Ok(serde_json::json!({ "unsubscribed": true }))
    }
}
