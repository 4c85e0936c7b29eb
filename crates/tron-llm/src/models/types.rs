//! # Model Types
//!
//! Shared types for the model registry. Each provider has its own model info
//! struct with provider-specific fields, but they all implement [`Into<ModelInfo>`]
//! for unified queries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// LLM provider, as detected from a model ID.
///
/// Distinct from [`tron_core::messages::ProviderType`], which tracks the
/// provider a token-usage record came from for cost normalization; this one
/// drives model-registry lookups and provider-factory construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderType {
    /// Anthropic (Claude).
    Anthropic,
    /// `OpenAI` (chat/completions models).
    #[serde(rename = "openai")]
    OpenAi,
    /// `OpenAI` Codex (Responses API).
    #[serde(rename = "openai-codex")]
    OpenAiCodex,
    /// Google (Gemini).
    Google,
}

impl ProviderType {
    /// String label for this provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::OpenAiCodex => "openai-codex",
            Self::Google => "google",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            "openai-codex" => Ok(Self::OpenAiCodex),
            "google" => Ok(Self::Google),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Model tier classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Anthropic Opus tier.
    Opus,
    /// Anthropic Sonnet tier.
    Sonnet,
    /// Anthropic Haiku tier.
    Haiku,
    /// `OpenAI` flagship tier (o-series).
    Flagship,
    /// `OpenAI` standard tier (gpt-4o).
    Standard,
    /// Google Pro tier.
    Pro,
    /// Google Flash tier.
    Flash,
    /// Google Flash Lite tier.
    FlashLite,
}

impl ModelTier {
    /// String label for this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opus => "opus",
            Self::Sonnet => "sonnet",
            Self::Haiku => "haiku",
            Self::Flagship => "flagship",
            Self::Standard => "standard",
            Self::Pro => "pro",
            Self::Flash => "flash",
            Self::FlashLite => "flash-lite",
        }
    }
}

/// Unified model information for cross-provider queries.
///
/// Every provider's model info can be converted into this type
/// for use in the UI model catalog and provider factory.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// API model ID (e.g., `"claude-opus-4-6"`).
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Short name for compact display.
    pub short_name: String,
    /// Model family (e.g., `"Claude 4.6"`, `"GPT-5.3"`).
    pub family: String,
    /// Provider that serves this model.
    pub provider: ProviderType,
    /// Performance tier.
    pub tier: ModelTier,
    /// Context window size in tokens.
    pub context_window: u64,
    /// Maximum output tokens.
    pub max_output: u64,
    /// Whether the model supports extended thinking.
    pub supports_thinking: bool,
    /// Whether the model supports reasoning (`OpenAI`).
    pub supports_reasoning: bool,
    /// Whether the model supports tool use.
    pub supports_tools: bool,
    /// Whether the model supports image inputs.
    pub supports_images: bool,
    /// Input cost per million tokens (USD).
    pub input_cost_per_million: f64,
    /// Output cost per million tokens (USD).
    pub output_cost_per_million: f64,
    /// Cache read cost per million tokens (USD), if caching supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read_cost_per_million: Option<f64>,
    /// Model description for UI display.
    pub description: String,
    /// Whether this is the recommended model in its tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended: Option<bool>,
    /// Whether this is a legacy model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy: Option<bool>,
    /// Whether this is a preview model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<bool>,
    /// Release date (ISO 8601).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

/// Model capabilities for runtime feature detection.
#[derive(Clone, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ModelCapabilities {
    /// Supports extended thinking (Anthropic).
    pub supports_thinking: bool,
    /// Supports adaptive thinking (Anthropic Opus 4.6).
    pub supports_adaptive_thinking: bool,
    /// Supports effort levels (Anthropic).
    pub supports_effort: bool,
    /// Available effort levels.
    pub effort_levels: Vec<String>,
    /// Default effort level.
    pub default_effort_level: Option<String>,
    /// Supports reasoning (`OpenAI`).
    pub supports_reasoning: bool,
    /// Available reasoning efforts.
    pub reasoning_levels: Vec<String>,
    /// Default reasoning effort.
    pub default_reasoning_level: Option<String>,
    /// Supports Gemini thinking levels (Gemini 3).
    pub supports_thinking_levels: bool,
    /// Available thinking levels (Gemini).
    pub thinking_levels: Vec<String>,
    /// Default thinking level (Gemini).
    pub default_thinking_level: Option<String>,
    /// Supports tool use.
    pub supports_tools: bool,
    /// Supports image inputs.
    pub supports_images: bool,
    /// Maximum output tokens.
    pub max_output: u64,
    /// Context window size.
    pub context_window: u64,
}

/// Grouping of models by category for UI display.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelCategory {
    /// Category name (e.g., `"Latest"`, `"Legacy"`).
    pub name: String,
    /// Category description.
    pub description: String,
    /// Models in this category.
    pub models: Vec<ModelInfo>,
}

/// Calculate the cost in USD for a given model and token counts.
#[allow(clippy::cast_precision_loss)]
pub fn calculate_cost(
    input_cost_per_million: f64,
    output_cost_per_million: f64,
    input_tokens: u64,
    output_tokens: u64,
) -> f64 {
    let input_cost = (input_tokens as f64 / 1_000_000.0) * input_cost_per_million;
    let output_cost = (output_tokens as f64 / 1_000_000.0) * output_cost_per_million;
    input_cost + output_cost
}

/// Format a token count for display (e.g., `200000` -> `"200K"`, `1000000` -> `"1M"`).
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn format_context_window(tokens: u64) -> String {
    if tokens >= 1_000_000 {
        let m = tokens as f64 / 1_000_000.0;
        if (m - m.round()).abs() < f64::EPSILON {
            format!("{}M", m as u64)
        } else {
            format!("{m:.1}M")
        }
    } else if tokens >= 1_000 {
        let k = tokens as f64 / 1_000.0;
        if (k - k.round()).abs() < f64::EPSILON {
            format!("{}K", k as u64)
        } else {
            format!("{k:.1}K")
        }
    } else {
        tokens.to_string()
    }
}

/// Format a cost per million tokens for display (e.g., `3.0` -> `"$3/M"`).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_model_pricing(cost_per_million: f64) -> String {
    if (cost_per_million - cost_per_million.round()).abs() < f64::EPSILON {
        format!("${}/M", cost_per_million as u64)
    } else {
        format!("${cost_per_million:.2}/M")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
