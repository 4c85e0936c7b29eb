//! Event bridge — converts `TronEvent`s from the Orchestrator broadcast into
//! `RpcEvent`s and routes them through the `BroadcastManager`.

use std::sync::Arc;

use crate::rpc::types::RpcEvent;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tron_core::events::TronEvent;
use tron_tools::cdp::types::BrowserEvent;

use super::broadcast::BroadcastManager;

/// Bridges orchestrator events and browser events to WebSocket clients.
pub struct EventBridge {
    rx: broadcast::Receiver<TronEvent>,
    browser_rx: Option<broadcast::Receiver<BrowserEvent>>,
    broadcast: Arc<BroadcastManager>,
    cancel: CancellationToken,
}

impl EventBridge {
    /// Create a new event bridge.
    ///
    /// `browser_rx` is optional — when `None`, browser frame delivery is disabled.
    pub fn new(
        rx: broadcast::Receiver<TronEvent>,
        broadcast: Arc<BroadcastManager>,
        browser_rx: Option<broadcast::Receiver<BrowserEvent>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            rx,
            browser_rx,
            broadcast,
            cancel,
        }
    }

    /// Run the bridge loop. Exits on shutdown signal or when the broadcast sender is dropped.
    #[tracing::instrument(skip_all, name = "event_bridge")]
    pub async fn run(mut self) {
        if let Some(mut browser_rx) = self.browser_rx.take() {
            // Dual-channel select: TronEvent + BrowserEvent + shutdown
            loop {
                tokio::select! {
                    () = self.cancel.cancelled() => {
                        tracing::info!("event bridge: shutdown signal received");
                        break;
                    }
                    result = self.rx.recv() => {
                        match result {
                            Ok(event) => self.bridge_tron_event(&event).await,
                            Err(broadcast::error::RecvError::Lagged(n)) => {
                                tracing::warn!(lagged = n, "event bridge lagged");
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                tracing::info!("event bridge: sender closed, exiting");
                                break;
                            }
                        }
                    }
                    result = browser_rx.recv() => {
                        match result {
                            Ok(event) => self.bridge_browser_event(&event).await,
                            Err(broadcast::error::RecvError::Lagged(n)) => {
                                tracing::warn!(lagged = n, "browser event bridge lagged");
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                tracing::debug!("browser event channel closed, continuing with TronEvent only");
                                self.run_tron_only().await;
                                break;
                            }
                        }
                    }
                }
            }
        } else {
            self.run_tron_only().await;
        }
    }

    async fn run_tron_only(&mut self) {
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::info!("event bridge: shutdown signal received");
                    break;
                }
                result = self.rx.recv() => {
                    match result {
                        Ok(event) => self.bridge_tron_event(&event).await,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(lagged = n, "event bridge lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::info!("event bridge: sender closed, exiting");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn bridge_tron_event(&self, event: &TronEvent) {
        let event_type = event.event_type();
        tracing::debug!(event_type, "bridging event to client");
        let rpc_event = tron_event_to_rpc(event);
        let session_id = event.session_id();

        if session_id.is_empty() {
            self.broadcast.broadcast_all(&rpc_event).await;
        } else {
            self.broadcast
                .broadcast_to_session(session_id, &rpc_event)
                .await;
        }
    }

    async fn bridge_browser_event(&self, event: &BrowserEvent) {
        let rpc_event = browser_event_to_rpc(event);
        let session_id = match event {
            BrowserEvent::Frame { session_id, .. } | BrowserEvent::Closed { session_id } => {
                session_id
            }
        };
        self.broadcast
            .broadcast_to_session(session_id, &rpc_event)
            .await;
    }
}

/// Convert a `BrowserEvent` to an `RpcEvent` for WebSocket transmission.
fn browser_event_to_rpc(event: &BrowserEvent) -> RpcEvent {
    match event {
        BrowserEvent::Frame {
            session_id, frame, ..
        } => RpcEvent {
            event_type: "browser.frame".to_string(),
            session_id: Some(session_id.clone()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            data: Some(serde_json::json!({
                "sessionId": frame.session_id,
                "data": frame.data,
                "frameId": frame.frame_id,
                "timestamp": frame.timestamp,
                "metadata": frame.metadata,
            })),
            run_id: None,
        },
        BrowserEvent::Closed { session_id } => RpcEvent {
            event_type: "browser.closed".to_string(),
            session_id: Some(session_id.clone()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            data: Some(serde_json::json!({
                "sessionId": session_id,
            })),
            run_id: None,
        },
    }
}

/// Convert a `TronEvent` to an `RpcEvent` for WebSocket transmission.
#[allow(clippy::too_many_lines)]
pub fn tron_event_to_rpc(event: &TronEvent) -> RpcEvent {
    let event_type = event.event_type();
    let session_id = event.session_id();
    let timestamp = event.timestamp();

    let data = match event {
        TronEvent::MessageUpdate { content, .. } => Some(serde_json::json!({ "delta": content })),
        TronEvent::TurnStart { turn, .. } => Some(serde_json::json!({ "turn": turn })),
        TronEvent::TurnEnd {
            turn,
            duration,
            token_usage,
            token_record,
            cost,
            stop_reason,
            context_limit,
            model,
            ..
        } => {
            let mut data = serde_json::json!({
                "turn": turn,
                "duration": duration,
                "durationMs": duration,
            });
            if let Some(usage) = token_usage {
                data["tokenUsage"] = serde_json::to_value(usage).unwrap_or_default();
            }
            if let Some(record) = token_record {
                data["tokenRecord"] = record.clone();
            }
            if let Some(c) = cost {
                data["cost"] = serde_json::json!(c);
            }
            if let Some(sr) = stop_reason {
                data["stopReason"] = serde_json::json!(sr);
            }
            if let Some(limit) = context_limit {
                data["contextLimit"] = serde_json::json!(limit);
            }
            if let Some(m) = model {
                data["model"] = serde_json::json!(m);
            }
            Some(data)
        }
        TronEvent::ToolExecutionStart {
            tool_name,
            tool_call_id,
            arguments,
            ..
        } => {
            let mut data = serde_json::json!({
                "toolName": tool_name,
                "toolCallId": tool_call_id,
            });
            if let Some(args) = arguments {
                data["arguments"] = serde_json::json!(args);
            }
            Some(data)
        }
        TronEvent::ToolExecutionEnd {
            tool_name,
            tool_call_id,
            duration,
            is_error,
            result,
            ..
        } => {
            let success = !is_error.unwrap_or(false);
            let mut data = serde_json::json!({
                "toolName": tool_name,
                "toolCallId": tool_call_id,
                "duration": duration,
                "durationMs": duration,
                "success": success,
            });
            // Extract result text from TronToolResult
            if let Some(tool_result) = result {
                let result_text = match &tool_result.content {
                    tron_core::tools::ToolResultBody::Text(t) => t.clone(),
                    tron_core::tools::ToolResultBody::Blocks(blocks) => blocks
                        .iter()
                        .filter_map(|b| {
                            if let tron_core::content::ToolResultContent::Text { text } = b {
                                Some(text.as_str())
                            } else {
                                None
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\n"),
                };
                if success {
                    data["output"] = serde_json::json!(result_text);
                    data["result"] = serde_json::json!(result_text);
                } else {
                    data["error"] = serde_json::json!(result_text);
                }
                if let Some(ref details) = tool_result.details {
                    data["details"] = details.clone();
                }
            }
            Some(data)
        }
        TronEvent::ToolExecutionUpdate {
            tool_call_id,
            update,
            ..
        } => Some(serde_json::json!({
            "toolCallId": tool_call_id,
            "output": update,
        })),
        TronEvent::ToolUseBatch { tool_calls, .. } => {
            Some(serde_json::json!({ "toolCalls": tool_calls }))
        }
        TronEvent::ToolCallArgumentDelta {
            tool_call_id,
            tool_name,
            arguments_delta,
            ..
        } => {
            let mut data = serde_json::json!({
                "toolCallId": tool_call_id,
                "argumentsDelta": arguments_delta,
            });
            if let Some(name) = tool_name {
                data["toolName"] = serde_json::json!(name);
            }
            Some(data)
        }
        TronEvent::ToolCallGenerating {
            tool_call_id,
            tool_name,
            ..
        } => Some(serde_json::json!({
            "toolCallId": tool_call_id,
            "toolName": tool_name,
        })),
        TronEvent::AgentEnd { error, .. } => {
            error.as_ref().map(|e| serde_json::json!({ "error": e }))
        }
        TronEvent::AgentInterrupted {
            turn,
            partial_content,
            active_tool,
            ..
        } => {
            let mut data = serde_json::json!({ "turn": turn });
            if let Some(content) = partial_content {
                data["partialContent"] = serde_json::json!(content);
            }
            if let Some(tool) = active_tool {
                data["activeTool"] = serde_json::json!(tool);
            }
            Some(data)
        }
        TronEvent::TurnFailed {
            turn,
            error,
            code,
            category,
            recoverable,
            partial_content,
            ..
        } => {
            let mut data = serde_json::json!({
                "turn": turn,
                "error": error,
                "recoverable": recoverable,
            });
            if let Some(c) = code {
                data["code"] = serde_json::json!(c);
            }
            if let Some(cat) = category {
                data["category"] = serde_json::json!(cat);
            }
            if let Some(content) = partial_content {
                data["partialContent"] = serde_json::json!(content);
            }
            Some(data)
        }
        TronEvent::ResponseComplete {
            turn,
            stop_reason,
            token_usage,
            has_tool_calls,
            tool_call_count,
            token_record,
            model,
            ..
        } => {
            let mut data = serde_json::json!({
                "turn": turn,
                "stopReason": stop_reason,
                "hasToolCalls": has_tool_calls,
                "toolCallCount": tool_call_count,
            });
            if let Some(usage) = token_usage {
                data["tokenUsage"] = serde_json::to_value(usage).unwrap_or_default();
            }
            if let Some(record) = token_record {
                data["tokenRecord"] = record.clone();
            }
            if let Some(m) = model {
                data["model"] = serde_json::json!(m);
            }
            Some(data)
        }
        TronEvent::Error {
            error,
            context,
            code,
            provider,
            category,
            suggestion,
            retryable,
            status_code,
            error_type,
            model,
            ..
        } => {
            let mut data = serde_json::json!({ "message": error });
            if let Some(ctx) = context {
                data["context"] = serde_json::json!(ctx);
            }
            if let Some(c) = code {
                data["code"] = serde_json::json!(c);
            }
            if let Some(p) = provider {
                data["provider"] = serde_json::json!(p);
            }
            if let Some(cat) = category {
                data["category"] = serde_json::json!(cat);
            }
            if let Some(s) = suggestion {
                data["suggestion"] = serde_json::json!(s);
            }
            if let Some(r) = retryable {
                data["retryable"] = serde_json::json!(r);
            }
            if let Some(sc) = status_code {
                data["statusCode"] = serde_json::json!(sc);
            }
            if let Some(et) = error_type {
                data["errorType"] = serde_json::json!(et);
            }
            if let Some(m) = model {
                data["model"] = serde_json::json!(m);
            }
            Some(data)
        }
        TronEvent::CompactionStart {
            reason,
            tokens_before,
            ..
        } => Some(serde_json::json!({
            "reason": reason,
            "tokensBefore": tokens_before,
        })),
        TronEvent::CompactionComplete {
            success,
            tokens_before,
            tokens_after,
            compression_ratio,
            reason,
            summary,
            estimated_context_tokens,
            ..
        } => {
            let mut data = serde_json::json!({
                "success": success,
                "tokensBefore": tokens_before,
                "tokensAfter": tokens_after,
                "compressionRatio": compression_ratio,
            });
            if let Some(r) = reason {
                data["reason"] = serde_json::to_value(r).unwrap_or_default();
            }
            if let Some(s) = summary {
                data["summary"] = serde_json::json!(s);
            }
            if let Some(t) = estimated_context_tokens {
                data["estimatedContextTokens"] = serde_json::json!(t);
            }
            Some(data)
        }
        TronEvent::ContextWarning {
            usage_percent,
            message,
            ..
        } => Some(serde_json::json!({
            "usagePercent": usage_percent,
            "message": message,
        })),
        TronEvent::HookTriggered {
            hook_names,
            hook_event,
            tool_name,
            tool_call_id,
            ..
        } => {
            let mut data = serde_json::json!({
                "hookNames": hook_names,
                "hookEvent": hook_event,
            });
            if let Some(name) = tool_name {
                data["toolName"] = serde_json::json!(name);
            }
            if let Some(id) = tool_call_id {
                data["toolCallId"] = serde_json::json!(id);
            }
            Some(data)
        }
        TronEvent::HookCompleted {
            hook_names,
            hook_event,
            result,
            duration,
            reason,
            tool_name,
            tool_call_id,
            ..
        } => {
            let mut data = serde_json::json!({
                "hookNames": hook_names,
                "hookEvent": hook_event,
                "result": result,
            });
            if let Some(d) = duration {
                data["duration"] = serde_json::json!(d);
            }
            if let Some(r) = reason {
                data["reason"] = serde_json::json!(r);
            }
            if let Some(name) = tool_name {
                data["toolName"] = serde_json::json!(name);
            }
            if let Some(id) = tool_call_id {
                data["toolCallId"] = serde_json::json!(id);
            }
            Some(data)
        }
        TronEvent::HookBackgroundStarted {
            hook_names,
            hook_event,
            execution_id,
            ..
        } => Some(serde_json::json!({
            "hookNames": hook_names,
            "hookEvent": hook_event,
            "executionId": execution_id,
        })),
        TronEvent::HookBackgroundCompleted {
            hook_names,
            hook_event,
            execution_id,
            result,
            duration,
            error,
            ..
        } => {
            let mut data = serde_json::json!({
                "hookNames": hook_names,
                "hookEvent": hook_event,
                "executionId": execution_id,
                "result": result,
                "duration": duration,
            });
            if let Some(e) = error {
                data["error"] = serde_json::json!(e);
            }
            Some(data)
        }
        TronEvent::ApiRetry {
            attempt,
            max_retries,
            delay_ms,
            error_category,
            error_message,
            ..
        } => Some(serde_json::json!({
            "attempt": attempt,
            "maxRetries": max_retries,
            "delayMs": delay_ms,
            "errorCategory": error_category,
            "errorMessage": error_message,
        })),
        TronEvent::ThinkingDelta { delta, .. } => Some(serde_json::json!({ "delta": delta })),
        TronEvent::ThinkingEnd { thinking, .. } => {
            Some(serde_json::json!({ "thinking": thinking }))
        }
        TronEvent::SessionCreated {
            base,
            model,
            working_directory,
            ..
        } => Some(serde_json::json!({
            "model": model,
            "workingDirectory": working_directory,
            "messageCount": 0,
            "inputTokens": 0,
            "outputTokens": 0,
            "cost": 0.0,
            "lastActivity": base.timestamp,
            "isActive": true,
        })),
        TronEvent::SessionForked { new_session_id, .. } => Some(serde_json::json!({
            "newSessionId": new_session_id,
        })),
        TronEvent::SessionUpdated {
            title,
            model,
            message_count,
            input_tokens,
            output_tokens,
            last_turn_input_tokens,
            cache_read_tokens,
            cache_creation_tokens,
            cost,
            last_activity,
            is_active,
            last_user_prompt,
            last_assistant_response,
            parent_session_id,
            ..
        } => Some(serde_json::json!({
            "title": title,
            "model": model,
            "messageCount": message_count,
            "inputTokens": input_tokens,
            "outputTokens": output_tokens,
            "lastTurnInputTokens": last_turn_input_tokens,
            "cacheReadTokens": cache_read_tokens,
            "cacheCreationTokens": cache_creation_tokens,
            "cost": cost,
            "lastActivity": last_activity,
            "isActive": is_active,
            "lastUserPrompt": last_user_prompt,
            "lastAssistantResponse": last_assistant_response,
            "parentSessionId": parent_session_id,
        })),
        TronEvent::MemoryUpdated {
            title,
            entry_type,
            event_id,
            ..
        } => Some(serde_json::json!({
            "title": title,
            "entryType": entry_type,
            "eventId": event_id,
        })),
        TronEvent::ContextCleared {
            tokens_before,
            tokens_after,
            ..
        } => Some(serde_json::json!({
            "tokensBefore": tokens_before,
            "tokensAfter": tokens_after,
        })),
        TronEvent::MessageDeleted {
            target_event_id,
            target_type,
            target_turn,
            reason,
            ..
        } => Some(serde_json::json!({
            "targetEventId": target_event_id,
            "targetType": target_type,
            "targetTurn": target_turn,
            "reason": reason,
        })),
        TronEvent::RulesLoaded {
            total_files,
            dynamic_rules_count,
            ..
        } => Some(serde_json::json!({
            "totalFiles": total_files,
            "dynamicRulesCount": dynamic_rules_count,
        })),
        TronEvent::RulesActivated {
            rules,
            total_activated,
            ..
        } => Some(serde_json::json!({
            "rules": rules.iter().map(|r| serde_json::json!({
                "relativePath": r.relative_path,
                "scopeDir": r.scope_dir,
            })).collect::<Vec<_>>(),
            "totalActivated": total_activated,
        })),
        TronEvent::MemoryLoaded { count, .. } => Some(serde_json::json!({
            "count": count,
        })),
        TronEvent::SkillRemoved { skill_name, .. } => Some(serde_json::json!({
            "skillName": skill_name,
        })),
        TronEvent::SubagentSpawned {
            subagent_session_id,
            task,
            model,
            max_turns,
            spawn_depth,
            tool_call_id,
            blocking,
            working_directory,
            ..
        } => {
            let mut data = serde_json::json!({
                "subagentSessionId": subagent_session_id,
                "task": task,
                "model": model,
                "maxTurns": max_turns,
                "spawnDepth": spawn_depth,
                "blocking": blocking,
            });
            if let Some(id) = tool_call_id {
                data["toolCallId"] = serde_json::json!(id);
            }
            if let Some(wd) = working_directory {
                data["workingDirectory"] = serde_json::json!(wd);
            }
            Some(data)
        }
        TronEvent::SubagentStatusUpdate {
            subagent_session_id,
            status,
            current_turn,
            activity,
            ..
        } => {
            let mut data = serde_json::json!({
                "subagentSessionId": subagent_session_id,
                "status": status,
                "currentTurn": current_turn,
            });
            if let Some(act) = activity {
                data["activity"] = serde_json::json!(act);
            }
            Some(data)
        }
        TronEvent::SubagentCompleted {
            subagent_session_id,
            total_turns,
            duration,
            full_output,
            result_summary,
            token_usage,
            model,
            ..
        } => {
            let mut data = serde_json::json!({
                "subagentSessionId": subagent_session_id,
                "totalTurns": total_turns,
                "duration": duration,
            });
            if let Some(o) = full_output {
                data["fullOutput"] = serde_json::json!(o);
            }
            if let Some(s) = result_summary {
                data["resultSummary"] = serde_json::json!(s);
            }
            if let Some(tu) = token_usage {
                data["tokenUsage"] = tu.clone();
            }
            if let Some(m) = model {
                data["model"] = serde_json::json!(m);
            }
            Some(data)
        }
        TronEvent::SubagentFailed {
            subagent_session_id,
            error,
            duration,
            ..
        } => Some(serde_json::json!({
            "subagentSessionId": subagent_session_id,
            "error": error,
            "duration": duration,
        })),
        TronEvent::SubagentEvent {
            subagent_session_id,
            event,
            ..
        } => Some(serde_json::json!({
            "subagentSessionId": subagent_session_id,
            "event": event,
        })),
        TronEvent::SubagentResultAvailable {
            parent_session_id,
            subagent_session_id,
            task,
            result_summary,
            success,
            total_turns,
            duration,
            token_usage,
            error,
            completed_at,
            ..
        } => {
            let mut data = serde_json::json!({
                "parentSessionId": parent_session_id,
                "subagentSessionId": subagent_session_id,
                "task": task,
                "resultSummary": result_summary,
                "success": success,
                "totalTurns": total_turns,
                "duration": duration,
                "completedAt": completed_at,
            });
            if let Some(tu) = token_usage {
                data["tokenUsage"] = tu.clone();
            }
            if let Some(e) = error {
                data["error"] = serde_json::json!(e);
            }
            Some(data)
        }
        // Events with no additional data (empty object so iOS can decode `data: {}`)
        TronEvent::AgentStart { .. }
        | TronEvent::AgentReady { .. }
        | TronEvent::ThinkingStart { .. }
        | TronEvent::MemoryUpdating { .. }
        | TronEvent::SessionSaved { .. }
        | TronEvent::SessionLoaded { .. }
        | TronEvent::SessionArchived { .. }
        | TronEvent::SessionUnarchived { .. }
        | TronEvent::SessionDeleted { .. } => Some(serde_json::json!({})),
    };

    // Map internal event types to wire format
    let wire_type = match event_type {
        "agent_start" => "agent.start",
        "agent_end" => "agent.complete",
        "agent_ready" => "agent.ready",
        "agent_interrupted" => "agent.interrupted",
        "message_update" => "agent.text_delta",
        "turn_start" => "agent.turn_start",
        "turn_end" => "agent.turn_end",
        "agent.turn_failed" => "agent.turn_failed",
        "response_complete" => "agent.response_complete",
        "tool_execution_start" => "agent.tool_start",
        "tool_execution_end" => "agent.tool_end",
        "tool_execution_update" => "agent.tool_output",
        "tool_use_batch" => "agent.tool_use_batch",
        "toolcall_delta" => "agent.toolcall_delta",
        "toolcall_generating" => "agent.tool_generating",
        "hook_triggered" => "hook.triggered",
        "hook_completed" => "hook.completed",
        "hook.background_started" => "hook.background_started",
        "hook.background_completed" => "hook.background_completed",
        "compaction_start" => "agent.compaction_started",
        "compaction_complete" => "agent.compaction",
        "context_warning" => "context.warning",
        "api_retry" => "agent.retry",
        "thinking_start" => "agent.thinking_start",
        "thinking_delta" => "agent.thinking_delta",
        "thinking_end" => "agent.thinking_end",
        "error" => "agent.error",
        "session_created" => "session.created",
        "session_archived" => "session.archived",
        "session_unarchived" => "session.unarchived",
        "session_forked" => "session.forked",
        "session_deleted" => "session.deleted",
        "session_updated" => "session.updated",
        "memory_updating" => "agent.memory_updating",
        "memory_updated" => "agent.memory_updated",
        "context_cleared" => "agent.context_cleared",
        "message_deleted" => "agent.message_deleted",
        "rules_loaded" => "rules.loaded",
        "rules_activated" => "rules.activated",
        "memory_loaded" => "memory.loaded",
        "skill_removed" => "agent.skill_removed",
        "subagent_spawned" => "agent.subagent_spawned",
        "subagent_status_update" => "agent.subagent_status",
        "subagent_completed" => "agent.subagent_completed",
        "subagent_failed" => "agent.subagent_failed",
        "subagent_event" => "agent.subagent_event",
        "subagent_result_available" => "agent.subagent_result_available",
        other => other,
    };

    RpcEvent {
        event_type: wire_type.to_string(),
        session_id: if session_id.is_empty() {
            None
        } else {
            Some(session_id.to_string())
        },
        timestamp: timestamp.to_string(),
        data,
        run_id: None,
    }
}
