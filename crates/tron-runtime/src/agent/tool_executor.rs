//! Tool executor — guardrails → pre-hooks → execute → post-hooks pipeline.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tron_core::events::{BaseEvent, HookResult as EventHookResult, TronEvent};
use tron_core::messages::ToolCall;
use tron_guardrails::{EvaluationContext, GuardrailEngine};
use tron_hooks::engine::HookEngine;
use tron_hooks::types::{HookAction, HookContext};
use tron_tools::registry::ToolRegistry;
use tron_tools::traits::ToolContext;

use tracing::{debug, error, instrument, warn};

use crate::agent::event_emitter::EventEmitter;
use crate::types::ToolExecutionResult;

/// Execute a single tool call through the full pipeline.
///
/// Pipeline: guardrails → pre-hooks → execute → post-hooks → result
#[allow(clippy::too_many_arguments, clippy::too_many_lines, clippy::cast_possible_truncation)]
#[instrument(skip_all, fields(tool_name = tool_call.name, session_id))]
pub async fn execute_tool(
    tool_call: &ToolCall,
    registry: &ToolRegistry,
    guardrails: &Option<Arc<std::sync::Mutex<GuardrailEngine>>>,
    hooks: &Option<Arc<HookEngine>>,
    session_id: &str,
    working_directory: &str,
    emitter: &Arc<EventEmitter>,
    cancel: &CancellationToken,
    subagent_depth: u32,
    subagent_max_depth: u32,
) -> ToolExecutionResult {
    let start = Instant::now();
    let tool_call_id = tool_call.id.clone();
    let tool_name = tool_call.name.clone();

    // 1. Look up tool
    let Some(tool) = registry.get(&tool_name) else {
        error!(tool_name, "tool not found");
        return ToolExecutionResult {
            tool_call_id,
            result: tron_core::tools::error_result(format!(
                "Tool not found: {tool_name}"
            )),
            duration_ms: start.elapsed().as_millis() as u64,
            blocked_by_hook: false,
            blocked_by_guardrail: false,
            stops_turn: false,
            is_interactive: false,
        };
    };

    let stops_turn = tool.stops_turn();
    let is_interactive = tool.is_interactive();

    // 2. Evaluate guardrails (synchronous)
    if let Some(guardrail_engine) = guardrails {
        let eval_ctx = EvaluationContext {
            tool_name: tool_name.clone(),
            tool_arguments: Value::Object(tool_call.arguments.clone()),
            session_id: Some(session_id.to_owned()),
            tool_call_id: Some(tool_call_id.clone()),
        };
        if let Ok(mut engine) = guardrail_engine.lock() {
            let eval = engine.evaluate(&eval_ctx);
            if eval.blocked {
                warn!(tool_name, "blocked by guardrail");
                let reason = eval
                    .block_reason
                    .unwrap_or_else(|| "Blocked by guardrail".into());
                return ToolExecutionResult {
                    tool_call_id,
                    result: tron_core::tools::error_result(reason),
                    duration_ms: start.elapsed().as_millis() as u64,
                    blocked_by_hook: false,
                    blocked_by_guardrail: true,
                    stops_turn,
                    is_interactive,
                };
            }
        }
    }

    // 3. Execute PreToolUse hooks (blocking, sequential)
    let mut effective_args = Value::Object(tool_call.arguments.clone());
    if let Some(hook_engine) = hooks {
        let hook_ctx = HookContext::PreToolUse {
            session_id: session_id.to_owned(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_name: tool_name.clone(),
            tool_arguments: effective_args.clone(),
            tool_call_id: tool_call_id.clone(),
        };
        let _ = emitter.emit(TronEvent::HookTriggered {
            base: BaseEvent::now(session_id),
            hook_names: vec![],
            hook_event: "PreToolUse".into(),
            tool_name: Some(tool_name.clone()),
            tool_call_id: Some(tool_call_id.clone()),
        });
        let result = hook_engine.execute(&hook_ctx).await;
        let event_result = match result.action {
            HookAction::Block => EventHookResult::Block,
            HookAction::Modify => EventHookResult::Modify,
            HookAction::Continue => EventHookResult::Continue,
        };
        let _ = emitter.emit(TronEvent::HookCompleted {
            base: BaseEvent::now(session_id),
            hook_names: vec![],
            hook_event: "PreToolUse".into(),
            result: event_result,
            duration: None,
            reason: result.reason.clone(),
            tool_name: Some(tool_name.clone()),
            tool_call_id: Some(tool_call_id.clone()),
        });
        match result.action {
            HookAction::Block => {
                warn!(tool_name, "blocked by PreToolUse hook");
                let reason = result
                    .reason
                    .unwrap_or_else(|| "Blocked by PreToolUse hook".into());
                return ToolExecutionResult {
                    tool_call_id,
                    result: tron_core::tools::error_result(reason),
                    duration_ms: start.elapsed().as_millis() as u64,
                    blocked_by_hook: true,
                    blocked_by_guardrail: false,
                    stops_turn,
                    is_interactive,
                };
            }
            HookAction::Modify => {
                if let Some(mods) = result.modifications {
                    effective_args = mods;
                }
            }
            HookAction::Continue => {}
        }
    }

    // 4. Emit ToolExecutionStart
    let _ = emitter.emit(TronEvent::ToolExecutionStart {
        base: BaseEvent::now(session_id),
        tool_call_id: tool_call_id.clone(),
        tool_name: tool_name.clone(),
        arguments: effective_args.as_object().cloned(),
    });
    debug!(tool_name, tool_call_id, session_id, "tool execution started");

    // 5. Execute tool
    let ctx = ToolContext {
        tool_call_id: tool_call_id.clone(),
        session_id: session_id.to_owned(),
        working_directory: working_directory.to_owned(),
        cancellation: cancel.clone(),
        subagent_depth,
        subagent_max_depth,
    };

    let tool_result = if cancel.is_cancelled() {
        tron_core::tools::error_result("Operation cancelled")
    } else {
        match tool.execute(effective_args, &ctx).await {
            Ok(r) => r,
            Err(e) => tron_core::tools::error_result(e.to_string()),
        }
    };

    let duration_ms = start.elapsed().as_millis() as u64;

    // 6. Emit ToolExecutionEnd
    let _ = emitter.emit(TronEvent::ToolExecutionEnd {
        base: BaseEvent::now(session_id),
        tool_call_id: tool_call_id.clone(),
        tool_name: tool_name.clone(),
        duration: duration_ms,
        is_error: tool_result.is_error,
        result: Some(tool_result.clone()),
    });
    debug!(tool_name, tool_call_id, duration_ms, "tool executed");

    // 7. Execute PostToolUse hooks (background, fire-and-forget)
    if let Some(hook_engine) = hooks {
        let hook_ctx = HookContext::PostToolUse {
            session_id: session_id.to_owned(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_name: tool_name.clone(),
            tool_call_id: tool_call_id.clone(),
            result: serde_json::to_value(&tool_result).unwrap_or_default(),
            duration_ms,
        };
        let _ = emitter.emit(TronEvent::HookTriggered {
            base: BaseEvent::now(session_id),
            hook_names: vec![],
            hook_event: "PostToolUse".into(),
            tool_name: Some(tool_name.clone()),
            tool_call_id: Some(tool_call_id.clone()),
        });
        // Fire and forget
        let engine = hook_engine.clone();
        let emitter_bg = emitter.clone();
        let sid = session_id.to_owned();
        let tn = tool_name.clone();
        let tcid = tool_call_id.clone();
        let _handle = tokio::spawn(async move {
            let bg_result = engine.execute(&hook_ctx).await;
            let event_result = match bg_result.action {
                HookAction::Block => EventHookResult::Block,
                HookAction::Modify => EventHookResult::Modify,
                HookAction::Continue => EventHookResult::Continue,
            };
            let _ = emitter_bg.emit(TronEvent::HookCompleted {
                base: BaseEvent::now(&sid),
                hook_names: vec![],
                hook_event: "PostToolUse".into(),
                result: event_result,
                duration: None,
                reason: bg_result.reason.clone(),
                tool_name: Some(tn),
                tool_call_id: Some(tcid),
            });
        });
    }

    ToolExecutionResult {
        tool_call_id,
        result: tool_result,
        duration_ms,
        blocked_by_hook: false,
        blocked_by_guardrail: false,
        stops_turn,
        is_interactive,
    }
}
