//! # `OpenAI` Stream Handler
//!
//! SSE event state machine for the `OpenAI` Responses API.
//!
//! Converts Responses API SSE events into unified [`StreamEvent`]s:
//! - `response.output_text.delta` → `TextStart` + `TextDelta`
//! - `response.output_item.added` (`function_call`) → `ToolCallStart`
//! - `response.function_call_arguments.delta` → `ToolCallDelta`
//! - `response.reasoning_text.delta` → `ThinkingStart` + `ThinkingDelta` (full reasoning)
//! - `response.reasoning_summary_text.delta` → `ThinkingStart` + `ThinkingDelta` (summary fallback)
//! - `response.completed` → `ThinkingEnd`, `TextEnd`, `ToolCallEnd`, `Done`

use std::collections::{HashMap, HashSet};

use tron_llm::{ToolCallContext, parse_tool_call_arguments};
use tron_core::content::AssistantContent;
use tron_core::events::{AssistantMessage, StreamEvent};
use tron_core::messages::TokenUsage;

use super::types::ResponsesSseEvent;

/// State for tracking accumulated stream content.
#[derive(Clone, Debug)]
pub struct StreamState {
    /// Accumulated text content.
    pub accumulated_text: String,
    /// Accumulated thinking/reasoning content.
    pub accumulated_thinking: String,
    /// Tool calls by `call_id` → (id, name, `accumulated_args`).
    pub tool_calls: HashMap<String, ToolCallState>,
    /// Input tokens from usage.
    pub input_tokens: u64,
    /// Output tokens from usage.
    pub output_tokens: u64,
    /// Whether we've emitted `TextStart`.
    pub text_started: bool,
    /// Whether we've emitted `ThinkingStart`.
    pub thinking_started: bool,
    /// Deduplication set for reasoning text.
    pub seen_thinking_texts: HashSet<String>,
    /// Whether we received full reasoning text (vs only summary).
    pub has_reasoning_text: bool,
}

/// State for an individual tool call being accumulated.
#[derive(Clone, Debug)]
pub struct ToolCallState {
    /// Call ID.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Accumulated JSON arguments string.
    pub args: String,
}

/// Create a fresh stream state.
#[must_use]
pub fn create_stream_state() -> StreamState {
    StreamState {
        accumulated_text: String::new(),
        accumulated_thinking: String::new(),
        tool_calls: HashMap::new(),
        input_tokens: 0,
        output_tokens: 0,
        text_started: false,
        thinking_started: false,
        seen_thinking_texts: HashSet::new(),
        has_reasoning_text: false,
    }
}

/// Process a single SSE event and return corresponding [`StreamEvent`]s.
#[must_use]
pub fn process_stream_event(
    event: &ResponsesSseEvent,
    state: &mut StreamState,
) -> Vec<StreamEvent> {
    let mut events = Vec::new();

    match event.event_type.as_str() {
        "response.output_text.delta" => {
            if let Some(delta) = &event.delta {
                if !state.text_started {
                    state.text_started = true;
                    events.push(StreamEvent::TextStart);
                }
                state.accumulated_text.push_str(delta);
                events.push(StreamEvent::TextDelta {
                    delta: delta.clone(),
                });
            }
        }

        "response.output_item.added" => {
            if let Some(item) = &event.item {
                if item.item_type == "function_call" {
                    if let Some(call_id) = &item.call_id {
                        let name = item.name.clone().unwrap_or_default();
                        let initial_args = item.arguments.clone().unwrap_or_default();
                        let _ = state.tool_calls.insert(
                            call_id.clone(),
                            ToolCallState {
                                id: call_id.clone(),
                                name: name.clone(),
                                args: initial_args,
                            },
                        );
                        events.push(StreamEvent::ToolCallStart {
                            tool_call_id: call_id.clone(),
                            name,
                        });
                    }
                } else if item.item_type == "reasoning" && !state.thinking_started {
                    state.thinking_started = true;
                    events.push(StreamEvent::ThinkingStart);
                }
            }
        }

        "response.output_item.done" => {
            events.extend(handle_output_item_done(event, state));
        }

        "response.reasoning_summary_part.added" => {
            if !state.thinking_started {
                state.thinking_started = true;
                events.push(StreamEvent::ThinkingStart);
            }
        }

        "response.reasoning_text.delta" => {
            // Full reasoning content — preferred over summary when available.
            if let Some(delta) = &event.delta {
                if !state.has_reasoning_text {
                    // First reasoning_text delta: replace any summary-only content.
                    state.has_reasoning_text = true;
                    if !state.accumulated_thinking.is_empty() {
                        state.accumulated_thinking.clear();
                    }
                }
                if !state.thinking_started {
                    state.thinking_started = true;
                    events.push(StreamEvent::ThinkingStart);
                }
                state.accumulated_thinking.push_str(delta);
                events.push(StreamEvent::ThinkingDelta {
                    delta: delta.clone(),
                });
            }
        }

        "response.reasoning_summary_text.delta" => {
            // Skip summary deltas when we have full reasoning text.
            if state.has_reasoning_text {
                return events;
            }
            if let Some(delta) = &event.delta {
                if !state.seen_thinking_texts.contains(delta.as_str()) {
                    let _ = state.seen_thinking_texts.insert(delta.clone());
                    if !state.thinking_started {
                        state.thinking_started = true;
                        events.push(StreamEvent::ThinkingStart);
                    }
                    state.accumulated_thinking.push_str(delta);
                    events.push(StreamEvent::ThinkingDelta {
                        delta: delta.clone(),
                    });
                }
            }
        }

        "response.function_call_arguments.delta" => {
            if let (Some(call_id), Some(delta)) = (&event.call_id, &event.delta) {
                if let Some(tc) = state.tool_calls.get_mut(call_id.as_str()) {
                    tc.args.push_str(delta);
                    events.push(StreamEvent::ToolCallDelta {
                        tool_call_id: call_id.clone(),
                        arguments_delta: delta.clone(),
                    });
                }
            }
        }

        "response.completed" => {
            events.extend(process_completed_response(event, state));
        }

        _ => {} // Ignore unknown event types
    }

    events
}

/// Handle `response.output_item.done` — extract reasoning summary if not already streamed.
fn handle_output_item_done(event: &ResponsesSseEvent, state: &mut StreamState) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    let Some(item) = &event.item else {
        return events;
    };
    // Only process reasoning items with summary content not already streamed.
    if item.item_type != "reasoning"
        || item.summary.is_none()
        || !state.accumulated_thinking.is_empty()
        || state.has_reasoning_text
    {
        return events;
    }
    if !state.thinking_started {
        state.thinking_started = true;
        events.push(StreamEvent::ThinkingStart);
    }
    if let Some(summary) = &item.summary {
        for part in summary {
            if part.content_type == "summary_text" {
                if let Some(text) = &part.text {
                    let _ = state.seen_thinking_texts.insert(text.clone());
                    state.accumulated_thinking.push_str(text);
                    events.push(StreamEvent::ThinkingDelta {
                        delta: text.clone(),
                    });
                }
            }
        }
    }
    events
}

/// Process the `response.completed` event and emit final events.
fn process_completed_response(
    event: &ResponsesSseEvent,
    state: &mut StreamState,
) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    let Some(response) = &event.response else {
        return events;
    };

    // Extract usage
    if let Some(usage) = &response.usage {
        state.input_tokens = usage.input_tokens;
        state.output_tokens = usage.output_tokens;
    }

    // Process output items from completed response
    merge_completed_output_items(response, state, &mut events);

    // Emit thinking_end if we had thinking
    if state.thinking_started {
        events.push(StreamEvent::ThinkingEnd {
            thinking: state.accumulated_thinking.clone(),
            signature: None,
        });
    }

    // Emit text_end if we had text
    if state.text_started {
        events.push(StreamEvent::TextEnd {
            text: state.accumulated_text.clone(),
            signature: None,
        });
    }

    // Emit toolcall_end for each tool call
    for tc in state.tool_calls.values() {
        if !tc.id.is_empty() && !tc.name.is_empty() {
            let ctx = ToolCallContext {
                tool_call_id: Some(tc.id.clone()),
                tool_name: Some(tc.name.clone()),
                provider: Some("openai".into()),
            };
            let arguments = parse_tool_call_arguments(Some(&tc.args), Some(&ctx));
            events.push(StreamEvent::ToolCallEnd {
                tool_call: tron_core::messages::ToolCall {
                    content_type: "tool_use".into(),
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments: arguments.clone(),
                    thought_signature: None,
                },
            });
        }
    }

    // Build final done event
    events.push(build_done_event(state));

    events
}

/// Merge output items from the completed response into stream state.
fn merge_completed_output_items(
    response: &super::types::ResponsesResponse,
    state: &mut StreamState,
    events: &mut Vec<StreamEvent>,
) {
    for item in &response.output {
        match item.item_type.as_str() {
            "message" => merge_message_item(item, state),
            "reasoning" => merge_reasoning_item(item, state, events),
            "function_call" => merge_function_call_item(item, state),
            _ => {}
        }
    }
}

/// Merge a message output item — capture text if not yet started.
fn merge_message_item(item: &super::types::ResponsesOutputItem, state: &mut StreamState) {
    if let Some(content) = &item.content {
        for c in content {
            if c.content_type == "output_text" {
                if let Some(text) = &c.text {
                    if !state.text_started {
                        state.text_started = true;
                        state.accumulated_text.clone_from(text);
                    }
                }
            }
        }
    }
}

/// Merge a reasoning output item — use summary if no streaming deltas received.
fn merge_reasoning_item(
    item: &super::types::ResponsesOutputItem,
    state: &mut StreamState,
    events: &mut Vec<StreamEvent>,
) {
    if !state.accumulated_thinking.is_empty() || state.has_reasoning_text {
        return;
    }
    if let Some(summary) = &item.summary {
        for s in summary {
            if s.content_type == "summary_text" {
                if let Some(text) = &s.text {
                    if !state.thinking_started {
                        state.thinking_started = true;
                        events.push(StreamEvent::ThinkingStart);
                    }
                    state.accumulated_thinking.clone_from(text);
                }
            }
        }
    }
}

/// Merge a `function_call` output item — update or insert tool call state.
fn merge_function_call_item(item: &super::types::ResponsesOutputItem, state: &mut StreamState) {
    let Some(call_id) = &item.call_id else {
        return;
    };
    if let Some(existing) = state.tool_calls.get_mut(call_id.as_str()) {
        if let Some(arguments) = &item.arguments {
            if existing.args.is_empty() {
                existing.args.clone_from(arguments);
            }
        }
        if let Some(name) = &item.name {
            if existing.name.is_empty() {
                existing.name.clone_from(name);
            }
        }
    } else {
        let _ = state.tool_calls.insert(
            call_id.clone(),
            ToolCallState {
                id: call_id.clone(),
                name: item.name.clone().unwrap_or_default(),
                args: item.arguments.clone().unwrap_or_default(),
            },
        );
    }
}

/// Build the final `Done` event with the complete message.
fn build_done_event(state: &StreamState) -> StreamEvent {
    let mut content: Vec<AssistantContent> = Vec::new();

    if !state.accumulated_thinking.is_empty() {
        content.push(AssistantContent::Thinking {
            thinking: state.accumulated_thinking.clone(),
            signature: None,
        });
    }

    if !state.accumulated_text.is_empty() {
        content.push(AssistantContent::text(&state.accumulated_text));
    }

    for tc in state.tool_calls.values() {
        if !tc.id.is_empty() && !tc.name.is_empty() {
            let ctx = ToolCallContext {
                tool_call_id: Some(tc.id.clone()),
                tool_name: Some(tc.name.clone()),
                provider: Some("openai".into()),
            };
            let arguments = parse_tool_call_arguments(Some(&tc.args), Some(&ctx));
            content.push(AssistantContent::ToolUse {
                id: tc.id.clone(),
                name: tc.name.clone(),
                arguments,
                thought_signature: None,
            });
        }
    }

    let stop_reason = if state.tool_calls.is_empty() {
        "stop"
    } else {
        "tool_calls"
    };

    StreamEvent::Done {
        message: AssistantMessage {
            content,
            token_usage: Some(TokenUsage {
                input_tokens: state.input_tokens,
                output_tokens: state.output_tokens,
                provider_type: Some(tron_core::messages::ProviderType::OpenAi),
                ..TokenUsage::default()
            }),
        },
        stop_reason: stop_reason.into(),
    }
}

// =============================================================================
// Tests
// =============================================================================
