//! # tron-llm
//!
//! LLM provider trait and shared streaming utilities.
//!
//! Defines the `Provider` trait that all LLM backends implement:
//! - Shared SSE parser (handles Anthropic / `OpenAI` / Google format differences)
//! - Stream retry with exponential backoff + jitter
//! - Tool call JSON parsing from incremental deltas
//! - ID remapping utilities
//! - Model registry: `model_id -> ModelInfo { context_window, max_output, pricing, capabilities }`
//! - Provider factory: `create_provider(config) -> Box<dyn Provider>`

#![deny(unsafe_code)]

pub mod context_composition;
pub mod error_parsing;
pub mod health;
pub mod id_remapping;
pub mod models;
pub mod provider;
pub mod retry;
pub mod sse;
pub mod stream_pipeline;
pub mod tool_parsing;

pub use context_composition::{compose_context_parts, compose_context_parts_grouped};
pub use health::ProviderHealthTracker;
pub use id_remapping::{IdFormat, build_tool_call_id_mapping, remap_tool_call_id};
pub use models::model_ids;
pub use provider::Provider;
pub use retry::StreamRetryConfig;
pub use sse::{SseParserOptions, parse_sse_lines};
pub use tool_parsing::{ToolCallContext, parse_tool_call_arguments};
