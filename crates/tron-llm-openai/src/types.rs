//! # `OpenAI` Types
//!
//! Configuration, Responses API wire types, and the model registry for the
//! `OpenAI` Codex endpoint.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Authentication
// ─────────────────────────────────────────────────────────────────────────────

/// `OpenAI` provider authentication.
///
/// OAuth only -- the Codex endpoint does not accept API keys.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpenAIAuth {
    /// OAuth authentication (access + refresh tokens).
    OAuth {
        /// OAuth tokens.
        #[serde(flatten)]
        tokens: tron_auth::OAuthTokens,
    },
}

/// `OpenAI` provider configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAIConfig {
    /// Model ID (e.g., `gpt-5.3-codex`).
    pub model: String,
    /// Authentication.
    pub auth: OpenAIAuth,
    /// Max output tokens override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Temperature override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Base URL override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Reasoning effort override (low/medium/high/xhigh/max).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
    /// OAuth API settings for token refresh.
    #[serde(default)]
    pub provider_settings: OpenAIApiSettings,
}

/// Settings for `OpenAI` OAuth token refresh.
///
/// These come from `OpenAIProviderAuth` in auth storage and are needed
/// to refresh expired OAuth tokens.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAIApiSettings {
    /// Custom token URL (defaults to `OpenAI`'s standard OAuth URL).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    /// OAuth client ID (required for token refresh).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Default reasoning effort when neither options nor config specify one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_reasoning_effort: Option<String>,
    /// Base URL override persisted alongside auth settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Responses API request types
// ─────────────────────────────────────────────────────────────────────────────

/// Maximum tool result content length before truncation.
pub const TOOL_RESULT_MAX_LENGTH: usize = 16_384;

/// A content part within a Responses API message.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// User-supplied text input.
    InputText {
        /// The text content.
        text: String,
    },
    /// User-supplied image input.
    InputImage {
        /// Data URL or remote URL for the image.
        image_url: String,
        /// Detail level hint (`auto`, `low`, `high`).
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    /// Model-generated text output.
    OutputText {
        /// The text content.
        text: String,
    },
}

/// An item in the Responses API `input` array.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesInputItem {
    /// A conversational message.
    Message {
        /// Message role (`user`, `assistant`, `developer`).
        role: String,
        /// Message content parts.
        content: Vec<MessageContent>,
        /// Item ID, when replaying a prior response.
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    /// A tool call emitted by the model.
    FunctionCall {
        /// Item ID, when replaying a prior response.
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// The call ID correlating this call with its output.
        call_id: String,
        /// Tool name.
        name: String,
        /// JSON-encoded arguments string.
        arguments: String,
    },
    /// A tool result supplied back to the model.
    FunctionCallOutput {
        /// The call ID this output answers.
        call_id: String,
        /// Tool output text (truncated at [`TOOL_RESULT_MAX_LENGTH`]).
        output: String,
    },
}

/// A tool definition for the Responses API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponsesTool {
    /// Tool type, always `"function"`.
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON schema for the tool's parameters.
    pub parameters: serde_json::Value,
}

/// Reasoning configuration for the Responses API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// Reasoning effort (low/medium/high/xhigh/max).
    pub effort: String,
    /// Reasoning summary verbosity, always `"detailed"`.
    pub summary: String,
}

/// Full request body for the Responses API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponsesRequest {
    /// Model ID.
    pub model: String,
    /// Conversation input items.
    pub input: Vec<ResponsesInputItem>,
    /// System instructions (fixed for the Codex endpoint).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Whether to stream the response via SSE.
    pub stream: bool,
    /// Whether `OpenAI` should store the response server-side.
    pub store: bool,
    /// Temperature override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Available tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ResponsesTool>>,
    /// Max output tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Reasoning configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningConfig>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Responses API SSE / response types
// ─────────────────────────────────────────────────────────────────────────────

/// A content part within a completed output item (`message` or `reasoning`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OutputContent {
    /// Content type (`output_text`, `summary_text`).
    #[serde(rename = "type")]
    pub content_type: String,
    /// Text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// An output item within a completed response (`message`, `reasoning`, `function_call`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResponsesOutputItem {
    /// Item type.
    #[serde(rename = "type")]
    pub item_type: String,
    /// Call ID, for `function_call` items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// Tool name, for `function_call` items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// JSON-encoded arguments, for `function_call` items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
    /// Content parts, for `message` items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<OutputContent>>,
    /// Reasoning summary parts, for `reasoning` items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Vec<OutputContent>>,
}

/// Token usage reported with a completed response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponsesUsage {
    /// Input token count.
    pub input_tokens: u64,
    /// Output token count.
    pub output_tokens: u64,
}

/// The completed response body carried by a `response.completed` event.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResponsesResponse {
    /// Response ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Output items produced by the model.
    #[serde(default)]
    pub output: Vec<ResponsesOutputItem>,
    /// Token usage for the full response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<ResponsesUsage>,
}

/// A single Responses API SSE event.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResponsesSseEvent {
    /// Event type (e.g., `response.output_text.delta`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Incremental text/argument delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
    /// The output item this event relates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ResponsesOutputItem>,
    /// Call ID this event relates to (`function_call_arguments.delta`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// The completed response (`response.completed`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponsesResponse>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Model registry
// ─────────────────────────────────────────────────────────────────────────────

/// Default base URL for the Codex Responses API.
pub const DEFAULT_BASE_URL: &str = "https://chatgpt.com/backend-api";

/// Information about an `OpenAI` Codex model.
#[derive(Clone, Debug)]
pub struct OpenAIModelInfo {
    /// Human-readable name.
    pub name: &'static str,
    /// Short display name.
    pub short_name: &'static str,
    /// Context window size in tokens.
    pub context_window: u32,
    /// Maximum output tokens.
    pub max_output: u32,
    /// Whether the model supports tool use.
    pub supports_tools: bool,
    /// Whether the model supports image inputs.
    pub supports_images: bool,
    /// Model tier.
    pub tier: &'static str,
    /// Whether this is a preview model.
    pub preview: bool,
    /// Default reasoning effort level.
    pub default_reasoning_level: &'static str,
    /// Available reasoning effort levels.
    pub reasoning_levels: &'static [&'static str],
    /// Input cost per 1K tokens.
    pub input_cost_per_1k: f64,
    /// Output cost per 1K tokens.
    pub output_cost_per_1k: f64,
}

/// Model registry mapping model IDs to their metadata.
#[allow(unused_results)]
pub static OPENAI_MODELS: std::sync::LazyLock<
    std::collections::HashMap<&'static str, OpenAIModelInfo>,
> = std::sync::LazyLock::new(|| {
    let mut m = std::collections::HashMap::new();
    m.insert(
        "gpt-5.3-codex",
        OpenAIModelInfo {
            name: "GPT-5.3 Codex",
            short_name: "GPT-5.3 Codex",
            context_window: 400_000,
            max_output: 128_000,
            supports_tools: true,
            supports_images: true,
            tier: "flagship",
            preview: false,
            default_reasoning_level: "medium",
            reasoning_levels: &["low", "medium", "high", "xhigh", "max"],
            input_cost_per_1k: 0.0125,
            output_cost_per_1k: 0.1,
        },
    );
    m.insert(
        "gpt-5.3-codex-spark",
        OpenAIModelInfo {
            name: "GPT-5.3 Codex Spark",
            short_name: "Codex Spark",
            context_window: 272_000,
            max_output: 64_000,
            supports_tools: true,
            supports_images: false,
            tier: "standard",
            preview: true,
            default_reasoning_level: "medium",
            reasoning_levels: &["low", "medium", "high"],
            input_cost_per_1k: 0.003,
            output_cost_per_1k: 0.024,
        },
    );
    m.insert(
        "gpt-5.2-codex",
        OpenAIModelInfo {
            name: "GPT-5.2 Codex",
            short_name: "GPT-5.2 Codex",
            context_window: 400_000,
            max_output: 128_000,
            supports_tools: true,
            supports_images: true,
            tier: "flagship",
            preview: false,
            default_reasoning_level: "medium",
            reasoning_levels: &["low", "medium", "high", "xhigh"],
            input_cost_per_1k: 0.0125,
            output_cost_per_1k: 0.1,
        },
    );
    m.insert(
        "gpt-5.1-codex-max",
        OpenAIModelInfo {
            name: "GPT-5.1 Codex Max",
            short_name: "Codex Max",
            context_window: 272_000,
            max_output: 128_000,
            supports_tools: true,
            supports_images: true,
            tier: "flagship",
            preview: false,
            default_reasoning_level: "high",
            reasoning_levels: &["low", "medium", "high", "xhigh"],
            input_cost_per_1k: 0.0125,
            output_cost_per_1k: 0.1,
        },
    );
    m.insert(
        "gpt-5.1-codex-mini",
        OpenAIModelInfo {
            name: "GPT-5.1 Codex Mini",
            short_name: "Codex Mini",
            context_window: 200_000,
            max_output: 64_000,
            supports_tools: true,
            supports_images: false,
            tier: "standard",
            preview: false,
            default_reasoning_level: "medium",
            reasoning_levels: &["low", "medium", "high"],
            input_cost_per_1k: 0.0025,
            output_cost_per_1k: 0.02,
        },
    );
    m
});

/// Look up an `OpenAI` Codex model by ID.
#[must_use]
pub fn get_openai_model(model_id: &str) -> Option<&'static OpenAIModelInfo> {
    OPENAI_MODELS.get(model_id)
}

/// Get all known model IDs.
#[must_use]
pub fn all_openai_model_ids() -> Vec<&'static str> {
    OPENAI_MODELS.keys().copied().collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_is_chatgpt_backend() {
        assert_eq!(DEFAULT_BASE_URL, "https://chatgpt.com/backend-api");
    }

    #[test]
    fn get_openai_model_known_id() {
        let info = get_openai_model("gpt-5.3-codex").unwrap();
        assert_eq!(info.name, "GPT-5.3 Codex");
        assert_eq!(info.default_reasoning_level, "medium");
    }

    #[test]
    fn get_openai_model_unknown_id_is_none() {
        assert!(get_openai_model("not-a-real-model").is_none());
    }

    #[test]
    fn all_openai_model_ids_nonempty() {
        let ids = all_openai_model_ids();
        assert!(ids.contains(&"gpt-5.3-codex"));
        assert!(ids.contains(&"gpt-5.1-codex-mini"));
    }

    #[test]
    fn responses_sse_event_default_roundtrip() {
        let event = ResponsesSseEvent {
            event_type: "response.output_text.delta".into(),
            delta: Some("hi".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: ResponsesSseEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_type, "response.output_text.delta");
        assert_eq!(back.delta.as_deref(), Some("hi"));
    }

    #[test]
    fn message_content_serializes_with_type_tag() {
        let content = MessageContent::InputText { text: "hello".into() };
        let val = serde_json::to_value(&content).unwrap();
        assert_eq!(val["type"], "input_text");
        assert_eq!(val["text"], "hello");
    }

    #[test]
    fn function_call_output_serializes() {
        let item = ResponsesInputItem::FunctionCallOutput {
            call_id: "call_1".into(),
            output: "result".into(),
        };
        let val = serde_json::to_value(&item).unwrap();
        assert_eq!(val["type"], "function_call_output");
        assert_eq!(val["call_id"], "call_1");
    }

    #[test]
    fn openai_auth_tag_is_oauth() {
        let auth = OpenAIAuth::OAuth {
            tokens: tron_auth::OAuthTokens {
                access_token: "a".into(),
                refresh_token: "r".into(),
                expires_at: 0,
            },
        };
        let val = serde_json::to_value(&auth).unwrap();
        assert_eq!(val["type"], "oauth");
    }
}
