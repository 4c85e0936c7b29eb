//! Agent handlers: prompt, abort, getState.

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use tracing::{info, info_span, warn, Instrument};

use crate::context::RpcContext;
use crate::errors::{self, RpcError};
use crate::handlers::{require_param, require_string_param};
use crate::registry::MethodHandler;
use tron_events::{AppendOptions, EventType};
use tron_runtime::orchestrator::agent_factory::{AgentFactory, CreateAgentOpts};
use tron_runtime::orchestrator::agent_runner;
use tron_runtime::types::{AgentConfig, RunContext};

/// Flatten a `message.user` `content` value (string or content-block array)
/// down to plain text for the provider call.
fn extract_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(obj) => obj
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        other => other.to_string(),
    }
}

/// Resolve client-supplied attachments into stored blob descriptors.
///
/// Each entry is either an already-stored descriptor (`{blobId, ...}`,
/// passed through unchanged) or inline data (`{mimeType, data}`, where
/// `data` is base64) that gets persisted via the blob store.
fn resolve_attachments(
    event_store: &tron_events::EventStore,
    attachments: &[Value],
) -> Result<Vec<Value>, RpcError> {
    attachments
        .iter()
        .map(|att| {
            if att.get("blobId").is_some() {
                return Ok(att.clone());
            }

            let data = att
                .get("data")
                .and_then(Value::as_str)
                .ok_or_else(|| RpcError::InvalidParams {
                    message: "Attachment must have either 'blobId' or 'data'".into(),
                })?;
            let mime_type = att
                .get("mimeType")
                .and_then(Value::as_str)
                .unwrap_or("application/octet-stream");

            let bytes = base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|e| RpcError::InvalidParams {
                    message: format!("Invalid base64 attachment data: {e}"),
                })?;

            let blob_id = event_store
                .store_blob(&bytes, mime_type)
                .map_err(|e| RpcError::Internal {
                    message: e.to_string(),
                })?;

            let mut descriptor = json!({
                "blobId": blob_id,
                "mimeType": mime_type,
            });
            if let Some(name) = att.get("name") {
                descriptor["name"] = name.clone();
            }
            Ok(descriptor)
        })
        .collect()
}

/// Submit a prompt to the agent for a session.
pub struct PromptHandler;

#[async_trait]
impl MethodHandler for PromptHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;
        let content = require_param(params.as_ref(), "content")?.clone();
        let attachments = params
            .as_ref()
            .and_then(|p| p.get("attachments"))
            .and_then(Value::as_array)
            .map(|items| resolve_attachments(&ctx.event_store, items))
            .transpose()?;
        let prompt = extract_text(&content);

        // Verify the session exists
        let _ = ctx
            .session_manager
            .get_session(&session_id)
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?
            .ok_or_else(|| RpcError::NotFound {
                code: errors::SESSION_NOT_FOUND.into(),
                message: format!("Session '{session_id}' not found"),
            })?;

        let run_id = uuid::Uuid::now_v7().to_string();

        // Register the run with the orchestrator (tracks CancellationToken).
        // If the session already has an active run, this returns an error.
        let cancel = ctx
            .orchestrator
            .start_run(&session_id, &run_id)
            .map_err(|e| RpcError::Custom {
                code: "SESSION_BUSY".into(),
                message: e.to_string(),
                details: None,
            })?;

        // Without agent deps (no provider auth at startup) the run is tracked
        // but never dispatched — `agent.getState` will show it busy forever
        // unless the caller aborts it. Acknowledge anyway so callers that
        // only care about the busy-lock (e.g. pure event-replay tests) don't
        // have to special-case this.
        let Some(deps) = &ctx.agent_deps else {
            warn!(session_id, "agent.prompt with no provider auth configured");
            return Ok(json!({
                "acknowledged": true,
                "runId": run_id,
            }));
        };

        let active = ctx
            .session_manager
            .resume_session(&session_id)
            .map_err(|e| {
                ctx.orchestrator.complete_run(&session_id);
                RpcError::Internal {
                    message: e.to_string(),
                }
            })?;

        let model = active.state.model.clone();
        let system_prompt = active.state.system_prompt.clone();
        let working_directory = active.state.working_directory.clone();
        let initial_messages = active.state.messages.clone();

        let mut user_payload = json!({"content": content});
        if let Some(attachments) = &attachments {
            user_payload["attachments"] = json!(attachments);
        }
        let _ = ctx.event_store.append(&AppendOptions {
            session_id: &session_id,
            event_type: EventType::MessageUser,
            payload: user_payload,
            parent_id: None,
        });

        let tools = (deps.tool_factory)();
        let provider_factory = deps.provider_factory.clone();
        let guardrails = deps.guardrails.clone();
        let hooks = deps.hooks.clone();
        let broadcast = ctx.orchestrator.broadcast().clone();
        let persister = active.context.persister.clone();
        let orchestrator = ctx.orchestrator.clone();
        let session_for_task = session_id.clone();

        let span = info_span!("run", session_id = %session_id, run_id = %run_id);
        let _ = tokio::spawn(
            async move {
                let provider = match provider_factory.create_for_model(&model).await {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(model = %model, error = %e, "run provider creation failed");
                        orchestrator.complete_run(&session_for_task);
                        return;
                    }
                };

                let agent_config = AgentConfig {
                    model: model.clone(),
                    system_prompt,
                    working_directory,
                    ..AgentConfig::default()
                };

                let mut agent = AgentFactory::create_agent(
                    agent_config,
                    session_for_task.clone(),
                    CreateAgentOpts {
                        provider,
                        tools,
                        guardrails,
                        hooks: hooks.clone(),
                        is_subagent: false,
                        denied_tools: vec![],
                        subagent_depth: 0,
                        subagent_max_depth: 0,
                        rules_content: None,
                        initial_messages,
                        memory_content: None,
                        rules_index: None,
                        pre_activated_rules: vec![],
                    },
                );

                agent.set_abort_token(cancel);
                agent.set_persister(Some(persister));

                let result = agent_runner::run_agent(
                    &mut agent,
                    &prompt,
                    RunContext::default(),
                    &hooks,
                    &broadcast,
                )
                .await;

                info!(
                    session_id = session_for_task,
                    turns = result.turns_executed,
                    stop_reason = ?result.stop_reason,
                    "dispatched run completed"
                );

                orchestrator.complete_run(&session_for_task);
            }
            .instrument(span),
        );

        Ok(json!({
            "acknowledged": true,
            "runId": run_id,
        }))
    }
}

/// Abort a running agent in a session.
pub struct AbortHandler;

#[async_trait]
impl MethodHandler for AbortHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;

        let aborted = ctx
            .orchestrator
            .abort(&session_id)
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?;

        Ok(serde_json::json!({ "aborted": aborted }))
    }
}

/// Get the current agent state for a session.
pub struct GetAgentStateHandler;

#[async_trait]
impl MethodHandler for GetAgentStateHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;

        let is_busy = ctx.orchestrator.has_active_run(&session_id);
        let run_id = ctx.orchestrator.get_run_id(&session_id);

        Ok(serde_json::json!({
            "sessionId": session_id,
            "busy": is_busy,
            "runId": run_id,
        }))
    }
}
