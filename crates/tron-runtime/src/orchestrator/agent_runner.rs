//! Agent runner — wraps `TronAgent` with orchestrator integration.
//!
//! Handles skill injection, background hook draining, and
//! the critical `agent.complete` → `agent.ready` ordering.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tron_core::events::{BaseEvent, TronEvent};
use tron_hooks::engine::HookEngine;

use tracing::{debug, info, instrument, warn};

use crate::agent::event_emitter::EventEmitter;
use crate::agent::tron_agent::TronAgent;
use crate::types::{RunContext, RunResult};

/// Run an agent with orchestrator integration.
///
/// This wraps `TronAgent::run` with:
/// 1. Pre-run: drain background hooks from previous run
/// 2. Build and inject `RunContext` (skills, tasks, subagent results)
/// 3. Execute `agent.run(content, ctx)`
/// 4. Post-run: emit `agent.complete`
/// 5. Post-run: drain background hooks
/// 6. Post-run: emit `agent.ready` (MUST be after `agent.complete`)
#[instrument(skip_all, fields(session_id = agent.session_id()))]
pub async fn run_agent(
    agent: &mut TronAgent,
    content: &str,
    ctx: RunContext,
    hooks: &Option<Arc<HookEngine>>,
    broadcast: &Arc<EventEmitter>,
) -> RunResult {
    let session_id = agent.session_id().to_owned();
    debug!(session_id = agent.session_id(), "agent runner starting");

    // 1. Drain background hooks from previous run
    if let Some(hook_engine) = hooks {
        hook_engine.wait_for_background().await;
        debug!("background hooks drained");
    }

    // 2. Forward agent events to broadcast channel
    let mut agent_rx = agent.subscribe();
    let broadcast_clone = broadcast.clone();
    let forward_cancel = CancellationToken::new();
    let forward_cancel_clone = forward_cancel.clone();
    let forward_handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                event = agent_rx.recv() => {
                    match event {
                        Ok(e) => { let _ = broadcast_clone.emit(e); }
                        Err(broadcast::error::RecvError::Closed) => break,
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                    }
                }
                () = forward_cancel_clone.cancelled() => {
                    // Drain any remaining buffered events
                    while let Ok(event) = agent_rx.try_recv() {
                        let _ = broadcast_clone.emit(event);
                    }
                    break;
                }
            }
        }
    });

    // 3. Run the agent
    let result = agent.run(content, ctx).await;

    // Signal the forward task to drain remaining buffered events and exit
    forward_cancel.cancel();
    // Wait for it to finish draining (bounded timeout as safety net)
    if tokio::time::timeout(
        std::time::Duration::from_millis(100),
        forward_handle,
    )
    .await
    .is_err()
    {
        warn!(session_id, "forward task did not drain within 100ms");
    }

    // 5. Drain background hooks
    if let Some(hook_engine) = hooks {
        hook_engine.wait_for_background().await;
    }

    info!(session_id, stop_reason = ?result.stop_reason, turns = result.turns_executed, "agent run completed");

    // 6. Emit agent.ready — MUST be AFTER agent.complete
    let _ = broadcast.emit(TronEvent::AgentReady {
        base: BaseEvent::now(&session_id),
    });

    result
}
