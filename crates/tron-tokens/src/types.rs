//! # Token Types
//!
//! Shared types for token extraction, normalization, and session-level
//! accounting. Every provider's raw usage payload is extracted into a
//! [`TokenSource`], normalized into a [`TokenRecord`], and accumulated into
//! a [`TokenState`] for the lifetime of a session.

use tron_core::messages::ProviderType;

/// Raw token usage as reported by a provider, before normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenSource {
    /// Which provider this usage came from.
    pub provider: ProviderType,
    /// ISO 8601 timestamp of extraction.
    pub timestamp: String,
    /// Input tokens as reported by the provider (meaning varies by provider).
    pub raw_input_tokens: u64,
    /// Output tokens generated.
    pub raw_output_tokens: u64,
    /// Tokens read from prompt cache.
    pub raw_cache_read_tokens: u64,
    /// Tokens written to prompt cache (aggregate).
    pub raw_cache_creation_tokens: u64,
    /// 5-minute TTL cache creation tokens (Anthropic only).
    pub raw_cache_creation_5m_tokens: u64,
    /// 1-hour TTL cache creation tokens (Anthropic only).
    pub raw_cache_creation_1h_tokens: u64,
}

/// Metadata attached to a token extraction/normalization pass.
#[derive(Clone, Debug)]
pub struct TokenMeta {
    /// Turn number within the session.
    pub turn: u64,
    /// Session identifier.
    pub session_id: String,
    /// When the raw usage was extracted from the provider response.
    pub extracted_at: String,
    /// When normalization ran (set by [`super::normalization::normalize_tokens`]).
    pub normalized_at: String,
}

/// Which formula was used to compute the context window size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalculationMethod {
    /// Anthropic: `input + cache_read + cache_creation`.
    AnthropicCacheAware,
    /// `OpenAI` / Google: `input_tokens` directly.
    Direct,
}

/// Derived token figures, computed from a [`TokenSource`].
#[derive(Clone, Debug)]
pub struct ComputedTokens {
    /// Total context window size for this turn.
    pub context_window_tokens: u64,
    /// New (non-cached) input tokens added this turn.
    pub new_input_tokens: u64,
    /// Context window baseline from the previous turn.
    pub previous_context_baseline: u64,
    /// Which formula produced [`Self::context_window_tokens`].
    pub calculation_method: CalculationMethod,
}

/// An immutable, normalized record of one turn's token usage.
#[derive(Clone, Debug)]
pub struct TokenRecord {
    /// The raw source data this record was derived from.
    pub source: TokenSource,
    /// Derived figures.
    pub computed: ComputedTokens,
    /// Extraction/normalization metadata.
    pub meta: TokenMeta,
}

/// Running totals accumulated across all turns in a session.
#[derive(Clone, Debug, Default)]
pub struct AccumulatedTokens {
    /// Total input tokens across all turns.
    pub input_tokens: u64,
    /// Total output tokens across all turns.
    pub output_tokens: u64,
    /// Total cache read tokens across all turns.
    pub cache_read_tokens: u64,
    /// Total cache creation tokens across all turns.
    pub cache_creation_tokens: u64,
    /// Total 5-minute TTL cache creation tokens.
    pub cache_creation_5m_tokens: u64,
    /// Total 1-hour TTL cache creation tokens.
    pub cache_creation_1h_tokens: u64,
    /// Total cost in USD across all turns.
    pub cost: f64,
}

/// Context window utilization tracking.
#[derive(Clone, Copy, Debug)]
pub struct ContextWindow {
    /// Maximum context window size for the current model.
    pub max_size: u64,
    /// Current context window size (from the latest turn).
    pub current_size: u64,
    /// Tokens remaining before hitting `max_size`.
    pub tokens_remaining: u64,
    /// Percentage of the context window used (0.0-100.0).
    pub percent_used: f64,
}

impl ContextWindow {
    fn new(max_size: u64) -> Self {
        let mut window = Self {
            max_size,
            current_size: 0,
            tokens_remaining: max_size,
            percent_used: 0.0,
        };
        window.recalculate();
        window
    }

    /// Recompute [`Self::tokens_remaining`] and [`Self::percent_used`] from
    /// [`Self::current_size`] and [`Self::max_size`].
    #[allow(clippy::cast_precision_loss)]
    pub fn recalculate(&mut self) {
        self.tokens_remaining = self.max_size.saturating_sub(self.current_size);
        self.percent_used = if self.max_size == 0 {
            0.0
        } else {
            (self.current_size as f64 / self.max_size as f64) * 100.0
        };
    }
}

/// Complete token state for a session: history, running totals, and
/// context window utilization.
#[derive(Clone, Debug)]
pub struct TokenState {
    /// The most recently recorded turn, if any.
    pub current: Option<TokenRecord>,
    /// Full per-turn history, in recording order.
    pub history: Vec<TokenRecord>,
    /// Running totals across all turns.
    pub accumulated: AccumulatedTokens,
    /// Context window utilization.
    pub context_window: ContextWindow,
}

impl TokenState {
    /// Create an empty state with the given context window limit.
    #[must_use]
    pub fn new(max_context_size: u64) -> Self {
        Self {
            current: None,
            history: Vec::new(),
            accumulated: AccumulatedTokens::default(),
            context_window: ContextWindow::new(max_context_size),
        }
    }
}

/// Pricing rates for a model, in USD per million tokens.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricingTier {
    /// Cost per million input tokens.
    pub input_per_million: f64,
    /// Cost per million output tokens.
    pub output_per_million: f64,
    /// Multiplier applied to the base input rate for 5-minute TTL cache writes.
    pub cache_write_5m_multiplier: f64,
    /// Multiplier applied to the base input rate for 1-hour TTL cache writes.
    pub cache_write_1h_multiplier: f64,
    /// Multiplier applied to the base input rate for cache reads.
    pub cache_read_multiplier: f64,
}
