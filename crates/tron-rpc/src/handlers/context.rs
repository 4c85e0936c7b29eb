//! Context handlers: getSnapshot, getDetailedSnapshot, shouldCompact,
//! previewCompaction, confirmCompaction, canAcceptTurn, clear, compact.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::RpcContext;
use crate::errors::{self, RpcError};
use crate::handlers::require_string_param;
use crate::registry::MethodHandler;
use tron_context::summarizer::{KeywordSummarizer, Summarizer};
use tron_context::token_estimator::estimate_messages_tokens;
use tron_events::{AppendOptions, EventType};
use tron_runtime::orchestrator::session_reconstructor;

/// Get context snapshot for a session: reconstructed model, message count,
/// cumulative token usage, and turn count as of the session's current head.
pub struct GetSnapshotHandler;

#[async_trait]
impl MethodHandler for GetSnapshotHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;

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

        let state = session_reconstructor::reconstruct(&ctx.event_store, &session_id)
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?;

        Ok(serde_json::json!({
            "sessionId": session_id,
            "snapshot": {
                "model": state.model,
                "messageCount": state.messages.len(),
                "turnCount": state.turn_count,
                "tokenUsage": state.token_usage,
                "isEnded": state.is_ended,
            },
        }))
    }
}

/// Get detailed context snapshot.
pub struct GetDetailedSnapshotHandler;

#[async_trait]
impl MethodHandler for GetDetailedSnapshotHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _session_id = require_string_param(params.as_ref(), "sessionId")?;
        Ok(serde_json::json!({ "stub": true, "snapshot": {} }))
    }
}

/// Check if compaction is recommended.
pub struct ShouldCompactHandler;

#[async_trait]
impl MethodHandler for ShouldCompactHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _session_id = require_string_param(params.as_ref(), "sessionId")?;
        Ok(serde_json::json!({ "shouldCompact": false }))
    }
}

/// Preview what compaction would produce.
pub struct PreviewCompactionHandler;

#[async_trait]
impl MethodHandler for PreviewCompactionHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _session_id = require_string_param(params.as_ref(), "sessionId")?;
        Ok(serde_json::json!({ "stub": true, "preview": {} }))
    }
}

/// Confirm and execute compaction.
pub struct ConfirmCompactionHandler;

#[async_trait]
impl MethodHandler for ConfirmCompactionHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _session_id = require_string_param(params.as_ref(), "sessionId")?;
        Ok(serde_json::json!({ "confirmed": true }))
    }
}

/// Check if the context can accept another turn.
pub struct CanAcceptTurnHandler;

#[async_trait]
impl MethodHandler for CanAcceptTurnHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let _session_id = require_string_param(params.as_ref(), "sessionId")?;
        Ok(serde_json::json!({ "canAcceptTurn": true }))
    }
}

/// Clear context for a session.
///
/// Appends a `context.cleared` event; `session_reconstructor::reconstruct`
/// already folds that event type by discarding every message before it
/// (see `handle_context_cleared`), so the effect is visible on the very
/// next `context.getSnapshot`/`session.getState` call.
pub struct ClearHandler;

#[async_trait]
impl MethodHandler for ClearHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;

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

        ctx.event_store
            .append(&AppendOptions {
                session_id: &session_id,
                event_type: EventType::ContextCleared,
                payload: serde_json::json!({}),
                parent_id: None,
            })
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?;

        Ok(serde_json::json!({}))
    }
}

/// Trigger compaction for a session.
///
/// Runs `tron-context`'s `KeywordSummarizer` (the non-LLM fallback
/// summarizer — `RpcContext` has no LLM handle to drive the real
/// summarizer subagent) over the reconstructed conversation and appends
/// the result as a `compact.summary` event. `session_reconstructor`
/// folds that event type by replacing every prior message with the
/// summary + acknowledgement pair, so `tokensSaved` is the token estimate
/// of what got folded away.
pub struct CompactHandler;

#[async_trait]
impl MethodHandler for CompactHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;

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

        let state = session_reconstructor::reconstruct(&ctx.event_store, &session_id)
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?;

        if state.messages.is_empty() {
            return Ok(serde_json::json!({ "compacted": false, "tokensSaved": 0 }));
        }

        let tokens_before = u64::from(estimate_messages_tokens(&state.messages));

        let summary_result = KeywordSummarizer::new()
            .summarize(&state.messages)
            .await
            .map_err(|e| RpcError::Internal {
                message: format!("compaction summarization failed: {e}"),
            })?;

        let tokens_after = u64::from(tron_context::token_estimator::estimate_block_tokens(
            &serde_json::json!({ "type": "text", "text": summary_result.narrative }),
        ));
        let tokens_saved = tokens_before.saturating_sub(tokens_after);

        ctx.event_store
            .append(&AppendOptions {
                session_id: &session_id,
                event_type: EventType::CompactSummary,
                payload: serde_json::json!({ "summary": summary_result.narrative }),
                parent_id: None,
            })
            .map_err(|e| RpcError::Internal {
                message: e.to_string(),
            })?;

        Ok(serde_json::json!({
            "compacted": true,
            "tokensSaved": tokens_saved,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_helpers::make_test_context;
    use serde_json::json;

    #[tokio::test]
    async fn get_snapshot() {
        let ctx = make_test_context();
        let sid = ctx
            .session_manager
            .create_session("m", "/tmp", Some("t"))
            .unwrap();

        let result = GetSnapshotHandler
            .handle(Some(json!({"sessionId": sid})), &ctx)
            .await
            .unwrap();
        assert_eq!(result["snapshot"]["model"], "m");
        assert_eq!(result["snapshot"]["turnCount"], 0);
    }

    #[tokio::test]
    async fn get_snapshot_session_not_found() {
        let ctx = make_test_context();
        let err = GetSnapshotHandler
            .handle(Some(json!({"sessionId": "nope"})), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn get_detailed_snapshot() {
        let ctx = make_test_context();
        let result = GetDetailedSnapshotHandler
            .handle(Some(json!({"sessionId": "s1"})), &ctx)
            .await
            .unwrap();
        assert!(result.is_object());
    }

    #[tokio::test]
    async fn should_compact() {
        let ctx = make_test_context();
        let result = ShouldCompactHandler
            .handle(Some(json!({"sessionId": "s1"})), &ctx)
            .await
            .unwrap();
        assert_eq!(result["shouldCompact"], false);
    }

    #[tokio::test]
    async fn preview_compaction() {
        let ctx = make_test_context();
        let result = PreviewCompactionHandler
            .handle(Some(json!({"sessionId": "s1"})), &ctx)
            .await
            .unwrap();
        assert!(result.is_object());
    }

    #[tokio::test]
    async fn confirm_compaction() {
        let ctx = make_test_context();
        let result = ConfirmCompactionHandler
            .handle(Some(json!({"sessionId": "s1"})), &ctx)
            .await
            .unwrap();
        assert_eq!(result["confirmed"], true);
    }

    #[tokio::test]
    async fn can_accept_turn() {
        let ctx = make_test_context();
        let result = CanAcceptTurnHandler
            .handle(Some(json!({"sessionId": "s1"})), &ctx)
            .await
            .unwrap();
        assert_eq!(result["canAcceptTurn"], true);
    }

    #[tokio::test]
    async fn clear_context() {
        let ctx = make_test_context();
        let sid = ctx
            .session_manager
            .create_session("m", "/tmp", Some("t"))
            .unwrap();
        let _ = ctx
            .event_store
            .append(&AppendOptions {
                session_id: &sid,
                event_type: EventType::MessageUser,
                payload: json!({"content": "hello"}),
                parent_id: None,
            })
            .unwrap();

        let result = ClearHandler
            .handle(Some(json!({"sessionId": sid})), &ctx)
            .await
            .unwrap();
        assert_eq!(result, json!({}));

        let state = session_reconstructor::reconstruct(&ctx.event_store, &sid).unwrap();
        assert!(state.messages.is_empty());
    }

    #[tokio::test]
    async fn clear_context_session_not_found() {
        let ctx = make_test_context();
        let err = ClearHandler
            .handle(Some(json!({"sessionId": "nope"})), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn compact_context() {
        let ctx = make_test_context();
        let sid = ctx
            .session_manager
            .create_session("m", "/tmp", Some("t"))
            .unwrap();
        let _ = ctx
            .event_store
            .append(&AppendOptions {
                session_id: &sid,
                event_type: EventType::MessageUser,
                payload: json!({"content": "please fix the login bug"}),
                parent_id: None,
            })
            .unwrap();
        let _ = ctx
            .event_store
            .append(&AppendOptions {
                session_id: &sid,
                event_type: EventType::MessageAssistant,
                payload: json!({"content": [{"type": "text", "text": "looking into it"}]}),
                parent_id: None,
            })
            .unwrap();

        let result = CompactHandler
            .handle(Some(json!({"sessionId": sid})), &ctx)
            .await
            .unwrap();
        assert_eq!(result["compacted"], true);
        assert!(result["tokensSaved"].as_u64().is_some());

        let state = session_reconstructor::reconstruct(&ctx.event_store, &sid).unwrap();
        // Compaction collapses prior history to a summary + ack pair.
        assert_eq!(state.messages.len(), 2);
        assert!(state.messages[0].is_user());
        assert!(state.messages[1].is_assistant());
    }

    #[tokio::test]
    async fn compact_context_empty_session() {
        let ctx = make_test_context();
        let sid = ctx
            .session_manager
            .create_session("m", "/tmp", Some("t"))
            .unwrap();

        let result = CompactHandler
            .handle(Some(json!({"sessionId": sid})), &ctx)
            .await
            .unwrap();
        assert_eq!(result["compacted"], false);
        assert_eq!(result["tokensSaved"], 0);
    }

    #[tokio::test]
    async fn compact_context_session_not_found() {
        let ctx = make_test_context();
        let err = CompactHandler
            .handle(Some(json!({"sessionId": "nope"})), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SESSION_NOT_FOUND");
    }
}
