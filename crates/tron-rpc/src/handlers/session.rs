//! Session handlers: create, resume, list, delete, fork, getHead, getState,
//! getHistory, archive, unarchive, rewind, end.

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;
use tron_core::events::{BaseEvent, TronEvent};

use crate::context::RpcContext;
use crate::errors::{self, RpcError};
use crate::handlers::require_string_param;
use crate::registry::MethodHandler;

/// Create a new session.
pub struct CreateSessionHandler;

#[async_trait]
impl MethodHandler for CreateSessionHandler {
    #[instrument(skip(self, ctx), fields(method = "session.create"))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let working_dir = require_string_param(params.as_ref(), "workingDirectory")?;
        let model = params
            .as_ref()
            .and_then(|p| p.get("model"))
            .and_then(|v| v.as_str())
            .unwrap_or("claude-sonnet-4-20250514");
        let title = params
            .as_ref()
            .and_then(|p| p.get("title"))
            .and_then(|v| v.as_str());

        let session_id = ctx
            .session_manager
            .create_session(model, &working_dir, title)
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?;

        let _ = ctx.orchestrator.broadcast().emit(TronEvent::SessionCreated {
            base: BaseEvent::now(&session_id),
            model: model.to_string(),
            working_directory: working_dir.clone(),
        });

        // Optimistically discover rules and memory so iOS can display pills
        // immediately when a session opens (content is loaded later at prompt time).
        emit_optimistic_context_events(ctx, &session_id, &working_dir);

        Ok(serde_json::json!({
            "sessionId": session_id,
            "model": model,
            "workingDirectory": working_dir,
            "createdAt": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "isActive": true,
            "isArchived": false,
            "messageCount": 0,
            "eventCount": 1,
            "inputTokens": 0,
            "outputTokens": 0,
            "cost": 0.0,
        }))
    }
}

/// Discover rules files and memory, then persist + broadcast notification events.
///
/// This runs at session.create time so iOS can show "Loaded N rules" / "Loaded memory"
/// pills immediately. The actual content is loaded later when the first prompt is sent.
fn emit_optimistic_context_events(ctx: &RpcContext, session_id: &str, working_dir: &str) {
    use tron_context::loader::{ContextLoader, ContextLoaderConfig, load_global_rules};

    let wd = std::path::Path::new(working_dir);

    // Discover project rules files
    let mut loader = ContextLoader::new(ContextLoaderConfig {
        project_root: wd.to_path_buf(),
        ..ContextLoaderConfig::default()
    });
    let loaded_ctx = loader.load(wd).ok();

    // Build files array from project rules
    let mut files_json = Vec::new();
    let mut merged_size: usize = 0;

    if let Some(ref ctx_result) = loaded_ctx {
        for f in &ctx_result.files {
            let size_bytes = f.content.len();
            merged_size += size_bytes;
            let relative_path = f.path.strip_prefix(wd)
                .unwrap_or(&f.path)
                .to_string_lossy()
                .to_string();
            let level = match f.level {
                tron_context::loader::ContextLevel::Project => "project",
                tron_context::loader::ContextLevel::Directory => "directory",
            };
            files_json.push(serde_json::json!({
                "path": f.path.to_string_lossy(),
                "relativePath": relative_path,
                "level": level,
                "depth": f.depth,
                "sizeBytes": size_bytes,
            }));
        }
    }

    let project_file_count = loaded_ctx.as_ref().map_or(0, |ctx| ctx.files.len());

    // Discover global rules (~/.tron/CLAUDE.md)
    let home_dir = std::env::var("HOME").ok().map(std::path::PathBuf::from);
    let global_content = home_dir.as_deref().and_then(load_global_rules);

    if let Some(ref content) = global_content {
        let size_bytes = content.len();
        merged_size += size_bytes;
        let path = home_dir.as_ref()
            .map(|h| h.join(".tron").join("CLAUDE.md"))
            .unwrap_or_default();
        files_json.push(serde_json::json!({
            "path": path.to_string_lossy(),
            "relativePath": ".tron/CLAUDE.md",
            "level": "global",
            "depth": 0,
            "sizeBytes": size_bytes,
        }));
    }

    let total_files = project_file_count + usize::from(global_content.is_some());

    if total_files > 0 {
        #[allow(clippy::cast_possible_truncation)]
        let total = total_files as u32;
        #[allow(clippy::cast_possible_truncation)]
        let merged_tokens = (merged_size / 4) as u32;
        let _ = ctx.event_store.append(&tron_events::AppendOptions {
            session_id,
            event_type: tron_events::EventType::RulesLoaded,
            payload: serde_json::json!({
                "files": files_json,
                "totalFiles": total,
                "mergedTokens": merged_tokens,
                "dynamicRulesCount": 0,
            }),
            parent_id: None,
        });
        let _ = ctx.orchestrator.broadcast().emit(TronEvent::RulesLoaded {
            base: BaseEvent::now(session_id),
            total_files: total,
            dynamic_rules_count: 0,
        });
    }

    // Discover workspace memory from ledger entries (auto-inject setting must be enabled)
    let settings = tron_settings::get_settings();
    let auto_inject = &settings.context.memory.auto_inject;

    if auto_inject.enabled {
        let workspace = ctx
            .event_store
            .get_workspace_by_path(working_dir)
            .ok()
            .flatten();

        if let Some(ws) = workspace {
            #[allow(clippy::cast_possible_wrap)]
            let count_limit = auto_inject.count.clamp(1, 10) as i64;
            let entries = ctx
                .event_store
                .get_events_by_workspace_and_types(
                    &ws.id,
                    &["memory.ledger"],
                    Some(count_limit),
                    None,
                )
                .unwrap_or_default();

            if !entries.is_empty() {
                #[allow(clippy::cast_possible_truncation)]
                let count = entries.len() as u32;
                let tokens: u64 = entries.iter().map(|e| e.payload.len() as u64 / 4).sum();

                let _ = ctx.event_store.append(&tron_events::AppendOptions {
                    session_id,
                    event_type: tron_events::EventType::MemoryLoaded,
                    payload: serde_json::json!({
                        "count": count,
                        "tokens": tokens,
                        "workspaceId": ws.id,
                    }),
                    parent_id: None,
                });
                let _ = ctx.orchestrator.broadcast().emit(TronEvent::MemoryLoaded {
                    base: BaseEvent::now(session_id),
                    count,
                });
            }
        }
    }
}

/// Resume an existing session.
pub struct ResumeSessionHandler;

#[async_trait]
impl MethodHandler for ResumeSessionHandler {
    #[instrument(skip(self, ctx), fields(method = "session.resume", session_id))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;

        let active = ctx.session_manager.resume_session(&session_id).map_err(|e| {
            RpcError::NotFound {
                code: errors::SESSION_NOT_FOUND.into(),
                message: e.to_string(),
            }
        })?;

        let message_count = active.state.messages.len();
        let last_activity = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        Ok(serde_json::json!({
            "sessionId": session_id,
            "model": active.state.model,
            "messageCount": message_count,
            "lastActivity": last_activity,
        }))
    }
}

/// List sessions with optional filters.
pub struct ListSessionsHandler;

#[async_trait]
impl MethodHandler for ListSessionsHandler {
    #[instrument(skip(self, ctx), fields(method = "session.list"))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let include_archived = params
            .as_ref()
            .and_then(|p| p.get("includeArchived"))
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        #[allow(clippy::cast_possible_truncation)]
        let limit = params
            .as_ref()
            .and_then(|p| p.get("limit"))
            .and_then(serde_json::Value::as_u64)
            .map(|v| v as usize);

        let filter = tron_runtime::SessionFilter {
            include_archived,
            exclude_subagents: true,
            limit,
            ..Default::default()
        };

        let sessions = ctx
            .session_manager
            .list_sessions(&filter)
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?;

        // Get message previews for all sessions
        let session_ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
        let previews = ctx.event_store.get_session_message_previews(&session_ids).unwrap_or_default();

        let items: Vec<Value> = sessions
            .into_iter()
            .map(|s| {
                let is_active = ctx.session_manager.is_active(&s.id);
                let preview = previews.get(&s.id);
                serde_json::json!({
                    "sessionId": s.id,
                    "model": s.latest_model,
                    "title": s.title,
                    "workingDirectory": s.working_directory,
                    "createdAt": s.created_at,
                    "lastActivity": s.last_activity_at,
                    "endedAt": s.ended_at,
                    "isActive": is_active,
                    "isArchived": s.ended_at.is_some(),
                    "eventCount": s.event_count,
                    "messageCount": s.message_count,
                    "inputTokens": s.total_input_tokens,
                    "outputTokens": s.total_output_tokens,
                    "lastTurnInputTokens": s.last_turn_input_tokens,
                    "cacheReadTokens": s.total_cache_read_tokens,
                    "cacheCreationTokens": s.total_cache_creation_tokens,
                    "cost": 0.0,
                    "parentSessionId": s.parent_session_id,
                    "lastUserPrompt": preview.and_then(|p| p.last_user_prompt.as_deref()),
                    "lastAssistantResponse": preview.and_then(|p| p.last_assistant_response.as_deref()),
                })
            })
            .collect();

        Ok(serde_json::json!({ "sessions": items }))
    }
}

/// Delete a session.
pub struct DeleteSessionHandler;

#[async_trait]
impl MethodHandler for DeleteSessionHandler {
    #[instrument(skip(self, ctx), fields(method = "session.delete", session_id))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;

        ctx.session_manager
            .delete_session(&session_id)
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?;

        let _ = ctx.orchestrator.broadcast().emit(TronEvent::SessionDeleted {
            base: BaseEvent::now(&session_id),
        });

        Ok(serde_json::json!({ "deleted": true }))
    }
}

/// Fork a session at the current head (or a specific event).
pub struct ForkSessionHandler;

#[async_trait]
impl MethodHandler for ForkSessionHandler {
    #[instrument(skip(self, ctx), fields(method = "session.fork", session_id))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;
        let title = params
            .as_ref()
            .and_then(|p| p.get("title"))
            .and_then(|v| v.as_str());

        let fork_result = ctx
            .session_manager
            .fork_session(&session_id, None, title)
            .map_err(|e| RpcError::NotFound {
                code: errors::SESSION_NOT_FOUND.into(),
                message: e.to_string(),
            })?;

        let _ = ctx.orchestrator.broadcast().emit(TronEvent::SessionForked {
            base: BaseEvent::now(&session_id),
            new_session_id: fork_result.new_session_id.clone(),
        });

        Ok(serde_json::json!({
            "newSessionId": fork_result.new_session_id,
            "forkedFromSessionId": session_id,
            "forkedFromEventId": fork_result.forked_from_event_id,
            "rootEventId": fork_result.root_event_id,
        }))
    }
}

/// Get the head event ID for a session.
pub struct GetHeadHandler;

#[async_trait]
impl MethodHandler for GetHeadHandler {
    #[instrument(skip(self, ctx), fields(method = "session.getHead", session_id))]
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

        Ok(serde_json::json!({
            "sessionId": session.id,
            "headEventId": session.head_event_id,
        }))
    }
}

/// Get reconstructed state for a session.
pub struct GetStateHandler;

#[async_trait]
impl MethodHandler for GetStateHandler {
    #[instrument(skip(self, ctx), fields(method = "session.getState", session_id))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;

        // Get session row for metadata
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

        let active = ctx.session_manager.resume_session(&session_id).map_err(|e| {
            RpcError::NotFound {
                code: errors::SESSION_NOT_FOUND.into(),
                message: e.to_string(),
            }
        })?;

        let event_count = ctx
            .event_store
            .count_events(&session_id)
            .unwrap_or(0);

        Ok(serde_json::json!({
            "sessionId": session_id,
            "headEventId": session.head_event_id,
            "model": active.state.model,
            "turnCount": active.state.turn_count,
            "isEnded": active.state.is_ended,
            "workingDirectory": active.state.working_directory,
            "workspaceId": session.working_directory,
            "eventCount": event_count,
            "lastTurnInputTokens": session.last_turn_input_tokens,
            "tokenUsage": {
                "inputTokens": active.state.token_usage.input_tokens,
                "outputTokens": active.state.token_usage.output_tokens,
                "cacheReadTokens": session.total_cache_read_tokens,
                "cacheCreationTokens": session.total_cache_creation_tokens,
            },
        }))
    }
}

/// Archive a session.
pub struct ArchiveSessionHandler;

#[async_trait]
impl MethodHandler for ArchiveSessionHandler {
    #[instrument(skip(self, ctx), fields(method = "session.archive", session_id))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;

        ctx.session_manager
            .archive_session(&session_id)
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?;

        let _ = ctx.orchestrator.broadcast().emit(TronEvent::SessionArchived {
            base: BaseEvent::now(&session_id),
        });

        Ok(serde_json::json!({ "archived": true }))
    }
}

/// Get conversation history for a session (reconstructed messages).
pub struct GetHistoryHandler;

#[async_trait]
impl MethodHandler for GetHistoryHandler {
    #[instrument(skip(self, ctx), fields(method = "session.getHistory", session_id))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;

        #[allow(clippy::cast_possible_truncation)]
        let limit = params
            .as_ref()
            .and_then(|p| p.get("limit"))
            .and_then(serde_json::Value::as_u64)
            .map(|v| v as usize);

        let before_id = params
            .as_ref()
            .and_then(|p| p.get("beforeId"))
            .and_then(serde_json::Value::as_str);

        // Verify session exists
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

        // Get message-type events.
        // Tool calls are embedded as tool_use content blocks inside message.assistant events.
        // Tool results are persisted as "tool.result" events (NOT "message.tool_result").
        let message_types = ["message.user", "message.assistant", "tool.result"];
        let type_strs: Vec<&str> = message_types.to_vec();
        let events = ctx
            .event_store
            .get_events_by_type(
                &session_id,
                &type_strs,
                None,
            )
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?;

        // Apply beforeId pagination
        let events = if let Some(bid) = before_id {
            events
                .into_iter()
                .take_while(|e| e.id != bid)
                .collect::<Vec<_>>()
        } else {
            events
        };

        // Apply limit and determine hasMore
        let has_more = limit.is_some_and(|l| events.len() > l);
        let events = if let Some(l) = limit {
            events.into_iter().take(l).collect::<Vec<_>>()
        } else {
            events
        };

        // Convert to message shape
        let messages: Vec<Value> = events
            .iter()
            .map(|e| {
                let role = match e.event_type.as_str() {
                    "message.user" => "user",
                    "message.assistant" => "assistant",
                    "tool.result" => "tool",
                    _ => "unknown",
                };
                let mut content = serde_json::from_str::<Value>(&e.payload)
                    .unwrap_or(Value::Null);

                // ADAPTER(ios-compat): Apply TaskManager adapter during reconstruction.
                // tool.result events store raw JSON content, but iOS expects adapted text.
                // During live streaming, event_bridge.rs applies the adapter; here we do
                // the same for reconstruction using auto-detection since the action isn't stored.
                if e.event_type == "tool.result" {
                    if let Some(ref tn) = e.tool_name {
                        if tn == "TaskManager" {
                            if let Some(raw) =
                                content.get("content").and_then(Value::as_str).map(String::from)
                            {
                                let adapted =
                                    crate::adapters::adapt_task_manager_result_auto(&raw);
                                content["content"] = Value::String(adapted);
                            }
                        }
                    }
                }

                let mut msg = serde_json::json!({
                    "id": e.id,
                    "role": role,
                    "content": content,
                    "timestamp": e.timestamp,
                });
                if let Some(ref tool_name) = e.tool_name {
                    msg["toolUse"] = serde_json::json!({ "name": tool_name });
                }
                // Hoist toolCallId and isError from content to message level
                // for tool.result messages (iOS expects them at top level)
                if e.event_type == "tool.result" {
                    if let Some(tc_id) = content.get("toolCallId") {
                        msg["toolCallId"] = tc_id.clone();
                    }
                    if let Some(is_err) = content.get("isError") {
                        msg["isError"] = is_err.clone();
                    }
                }
                msg
            })
            .collect();

        Ok(serde_json::json!({
            "messages": messages,
            "hasMore": has_more,
        }))
    }
}

/// Unarchive a session.
pub struct UnarchiveSessionHandler;

#[async_trait]
impl MethodHandler for UnarchiveSessionHandler {
    #[instrument(skip(self, ctx), fields(method = "session.unarchive", session_id))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;

        ctx.session_manager
            .unarchive_session(&session_id)
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?;

        let _ = ctx.orchestrator.broadcast().emit(TronEvent::SessionUnarchived {
            base: BaseEvent::now(&session_id),
        });

        Ok(serde_json::json!({ "unarchived": true }))
    }
}

/// Rewind a session's head to an earlier event, discarding everything after it.
pub struct RewindSessionHandler;

#[async_trait]
impl MethodHandler for RewindSessionHandler {
    #[instrument(skip(self, ctx), fields(method = "session.rewind", session_id))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;
        let to_event_id = require_string_param(params.as_ref(), "toEventId")?;

        let result = ctx
            .event_store
            .rewind(&session_id, &to_event_id)
            .map_err(|e| match &e {
                tron_events::EventStoreError::SessionNotFound(_)
                | tron_events::EventStoreError::EventNotFound(_) => RpcError::NotFound {
                    code: errors::SESSION_NOT_FOUND.into(),
                    message: e.to_string(),
                },
                tron_events::EventStoreError::InvalidOperation(_) => RpcError::InvalidParams {
                    message: e.to_string(),
                },
                _ => RpcError::Internal {
                    message: e.to_string(),
                },
            })?;

        Ok(serde_json::json!({
            "newHeadEventId": result.new_head_event_id,
            "previousHeadEventId": result.previous_head_event_id,
        }))
    }
}

/// End a session: flush pending state, mark it ended, and drop it from the
/// active-session map.
pub struct EndSessionHandler;

#[async_trait]
impl MethodHandler for EndSessionHandler {
    #[instrument(skip(self, ctx), fields(method = "session.end", session_id))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;

        ctx.session_manager
            .end_session(&session_id)
            .await
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?;

        Ok(serde_json::json!({}))
    }
}
