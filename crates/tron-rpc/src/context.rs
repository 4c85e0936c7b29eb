//! RPC dependency-injection context.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tron_embeddings::EmbeddingController;
use tron_events::{ConnectionPool, EventStore};
use tron_guardrails::GuardrailEngine;
use tron_hooks::engine::HookEngine;
use tron_llm::provider::ProviderFactory;
use tron_runtime::orchestrator::orchestrator::Orchestrator;
use tron_runtime::orchestrator::session_manager::SessionManager;
use tron_runtime::orchestrator::subagent_manager::SubagentManager;
use tron_skills::registry::SkillRegistry;
use tron_tools::registry::ToolRegistry;
use tron_transcription::TranscriptionEngine;

/// Dependencies needed to create and run agents.
///
/// `None` on [`RpcContext::agent_deps`] means no provider auth was found at
/// startup; `agent.prompt` then returns `NOT_AVAILABLE` rather than panicking.
pub struct AgentDeps {
    /// Factory that creates a fresh LLM provider per request (reads current model + auth).
    pub provider_factory: Arc<dyn ProviderFactory>,
    /// Factory that creates a fresh tool registry per agent.
    pub tool_factory: Arc<dyn Fn() -> ToolRegistry + Send + Sync>,
    /// Guardrail engine (optional).
    pub guardrails: Option<Arc<std::sync::Mutex<GuardrailEngine>>>,
    /// Hook engine (optional).
    pub hooks: Option<Arc<HookEngine>>,
}

/// Shared context passed to every RPC handler.
pub struct RpcContext {
    /// Multi-session orchestrator.
    pub orchestrator: Arc<Orchestrator>,
    /// Session lifecycle manager.
    pub session_manager: Arc<SessionManager>,
    /// Event store for direct event queries.
    pub event_store: Arc<EventStore>,
    /// Skill registry (read/write).
    pub skill_registry: Arc<RwLock<SkillRegistry>>,
    /// Connection pool for task tables (same database file as events).
    pub task_pool: Option<ConnectionPool>,
    /// Path to the settings JSON file.
    pub settings_path: PathBuf,
    /// Agent execution dependencies (`None` = `agent.prompt` returns an error).
    pub agent_deps: Option<AgentDeps>,
    /// When the server started (for uptime calculation).
    pub server_start_time: Instant,
    /// Browser service for CDP-based browser automation (`None` = browser not available).
    pub browser_service: Option<Arc<tron_tools::cdp::service::BrowserService>>,
    /// Native transcription engine (`None` = sidecar fallback).
    pub transcription_engine: Option<Arc<TranscriptionEngine>>,
    /// Embedding controller for vector search (`None` = embeddings not loaded).
    pub embedding_controller: Option<Arc<tokio::sync::Mutex<EmbeddingController>>>,
    /// Subagent manager for spawning subsessions (`None` = fallback to keyword summarizer).
    pub subagent_manager: Option<Arc<SubagentManager>>,
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_helpers::make_test_context;

    #[test]
    fn context_has_orchestrator() {
        let ctx = make_test_context();
        assert_eq!(ctx.orchestrator.max_concurrent_sessions(), 10);
    }

    #[test]
    fn context_has_session_manager() {
        let ctx = make_test_context();
        assert_eq!(ctx.session_manager.active_count(), 0);
    }

    #[tokio::test]
    async fn context_session_manager_matches_orchestrator() {
        let ctx = make_test_context();
        let _ = ctx
            .session_manager
            .create_session("model", "/tmp", Some("test"))
            .unwrap();
        // Orchestrator sees it because they share the same `SessionManager`.
        assert_eq!(ctx.orchestrator.active_session_count(), 1);
    }

    #[test]
    fn context_has_event_store() {
        let ctx = make_test_context();
        assert!(ctx.event_store.list_workspaces().is_ok());
    }

    #[test]
    fn context_has_skill_registry() {
        let ctx = make_test_context();
        assert_eq!(ctx.skill_registry.read().list(None).len(), 0);
    }

    #[test]
    fn context_has_settings_path() {
        let ctx = make_test_context();
        assert!(!ctx.settings_path.as_os_str().is_empty());
    }

    #[test]
    fn context_without_agent_deps_by_default() {
        let ctx = make_test_context();
        assert!(ctx.agent_deps.is_none());
    }

    #[test]
    fn context_without_task_pool_by_default() {
        let ctx = make_test_context();
        assert!(ctx.task_pool.is_none());
    }
}
