//! # tron-tokens
//!
//! Token counting, normalization, and cost calculation for LLM usage.
//!
//! - Per-provider token extraction (Anthropic / Google / `OpenAI` report differently)
//! - `TokenRecord` with source, computed, and metadata fields
//! - Cost calculation per model via pricing table
//! - Cache cost tracking with breakpoint strategy

#![deny(unsafe_code)]

pub mod errors;
pub mod extraction;
pub mod normalization;
pub mod pricing;
pub mod state;
pub mod types;

pub use errors::{Result, TokenError};
pub use extraction::{
    AnthropicCacheCreation, AnthropicMessageDeltaUsage, AnthropicMessageStartUsage,
    ExtractionMeta, GoogleUsageMetadata, OpenAiUsage, extract_anthropic, extract_google,
    extract_openai,
};
pub use normalization::normalize_tokens;
pub use pricing::{
    calculate_cost, detect_provider, format_cost, format_tokens, get_context_limit,
    get_pricing_tier,
};
pub use state::{TokenStateManager, TokenStateManagerConfig};
pub use types::{
    AccumulatedTokens, CalculationMethod, ComputedTokens, ContextWindow, PricingTier, TokenMeta,
    TokenRecord, TokenSource, TokenState,
};
