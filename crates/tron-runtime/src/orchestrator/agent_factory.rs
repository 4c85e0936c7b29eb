//! Agent factory — DI-based `TronAgent` construction.

use std::sync::Arc;

use tron_context::context_manager::ContextManager;
use tron_context::rules_index::RulesIndex;
use tron_context::types::ContextManagerConfig;
use tron_core::messages::Message;
use tron_guardrails::GuardrailEngine;
use tron_hooks::engine::HookEngine;
use tron_llm::provider::Provider;
use tron_tools::registry::ToolRegistry;

use crate::agent::tron_agent::TronAgent;
use crate::types::AgentConfig;

/// Options for creating an agent.
pub struct CreateAgentOpts {
    /// LLM provider.
    pub provider: Arc<dyn Provider>,
    /// Tool registry.
    pub tools: ToolRegistry,
    /// Guardrail engine (optional).
    pub guardrails: Option<Arc<std::sync::Mutex<GuardrailEngine>>>,
    /// Hook engine (optional).
    pub hooks: Option<Arc<HookEngine>>,
    /// Whether this is a subagent.
    pub is_subagent: bool,
    /// Tools to deny for subagents.
    pub denied_tools: Vec<String>,
    /// Current subagent nesting depth (0 = top-level agent).
    pub subagent_depth: u32,
    /// Maximum nesting depth allowed for spawning children.
    pub subagent_max_depth: u32,
    /// Merged rules content (global + project).
    pub rules_content: Option<String>,
    /// Messages restored from session history.
    pub initial_messages: Vec<Message>,
    /// Workspace memory content (~/.tron/notes/MEMORY.md).
    pub memory_content: Option<String>,
    /// Scoped rules index for dynamic path-based activation.
    pub rules_index: Option<RulesIndex>,
    /// Rule relative paths to pre-activate (from session reconstruction).
    pub pre_activated_rules: Vec<String>,
}

/// Factory for constructing `TronAgent` instances.
pub struct AgentFactory;

impl AgentFactory {
    /// Create a new agent for the given session.
    pub fn create_agent(
        mut config: AgentConfig,
        session_id: String,
        opts: CreateAgentOpts,
    ) -> TronAgent {
        config.subagent_depth = opts.subagent_depth;
        config.subagent_max_depth = opts.subagent_max_depth;

        let mut registry = opts.tools;

        // Remove denied tools for subagents
        if opts.is_subagent {
            for tool_name in &opts.denied_tools {
                let _ = registry.remove(tool_name);
            }
            // Remove interactive tools from subagents
            let interactive_tools: Vec<String> = registry
                .list()
                .iter()
                .filter(|t| t.is_interactive())
                .map(|t| t.name().to_owned())
                .collect();
            for name in &interactive_tools {
                let _ = registry.remove(name);
            }
            // Deny subagent spawning tools when at max nesting depth
            if opts.subagent_max_depth == 0 {
                for name in &["SpawnSubagent", "QueryAgent", "WaitForAgents"] {
                    let _ = registry.remove(name);
                }
            }
        }

        let context_limit = tron_tokens::get_context_limit(&config.model);
        let mut compaction = config.compaction.clone();
        compaction.context_limit = context_limit;

        let ctx_config = ContextManagerConfig {
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            working_directory: config.working_directory.clone(),
            tools: registry.definitions(),
            rules_content: opts.rules_content,
            compaction,
        };

        let mut context_manager = ContextManager::new(ctx_config);

        if !opts.initial_messages.is_empty() {
            context_manager.set_messages(opts.initial_messages);
        }

        if opts.memory_content.is_some() {
            context_manager.set_memory_content(opts.memory_content);
        }

        // Wire scoped-rules index for dynamic activation
        if let Some(index) = opts.rules_index {
            context_manager.set_rules_index(index);
        }
        for path in &opts.pre_activated_rules {
            let _ = context_manager.pre_activate_rule(path);
        }
        if !opts.pre_activated_rules.is_empty() {
            context_manager.finalize_rule_activations();
        }

        TronAgent::new(
            config,
            opts.provider,
            registry,
            opts.guardrails,
            opts.hooks,
            context_manager,
            session_id,
        )
    }
}
