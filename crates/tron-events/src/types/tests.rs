//! Cross-module tests exercising [`SessionEvent::typed_payload`] end to end,
//! as opposed to the unit tests colocated with each payload struct.

use serde_json::json;

use super::base::SessionEvent;
use super::event_type::{EventType, ALL_EVENT_TYPES};
use super::state::{Message, MessageWithEventId, SessionState, SessionTokenUsage};

fn event(event_type: EventType, payload: serde_json::Value) -> SessionEvent {
    SessionEvent {
        id: "evt_test".to_string(),
        parent_id: None,
        session_id: "sess_test".to_string(),
        workspace_id: "ws_test".to_string(),
        timestamp: "2026-01-01T00:00:00Z".to_string(),
        event_type,
        sequence: 0,
        checksum: None,
        payload,
    }
}

#[test]
fn typed_payload_dispatches_message_user() {
    let e = event(
        EventType::MessageUser,
        json!({"content": "hello", "attachments": null}),
    );
    let typed = e.typed_payload().unwrap();
    matches!(typed, super::base::SessionEventPayload::MessageUser(_));
}

#[test]
fn typed_payload_dispatches_memory_loaded_as_raw_value() {
    let e = event(EventType::MemoryLoaded, json!({"anything": "goes"}));
    let typed = e.typed_payload().unwrap();
    match typed {
        super::base::SessionEventPayload::MemoryLoaded(v) => {
            assert_eq!(v["anything"], "goes");
        }
        _ => panic!("expected MemoryLoaded"),
    }
}

#[test]
fn all_event_types_round_trip_through_serde() {
    for event_type in ALL_EVENT_TYPES {
        let s = serde_json::to_string(&event_type).unwrap();
        let back: EventType = serde_json::from_str(&s).unwrap();
        assert_eq!(event_type, back);
    }
}

#[test]
fn session_state_serde_round_trip() {
    let state = SessionState {
        model: "claude-opus-4-6".to_string(),
        working_directory: "/tmp/project".to_string(),
        system_prompt: Some("be helpful".to_string()),
        reasoning_level: None,
        messages_with_event_ids: vec![MessageWithEventId {
            message: Message {
                role: "user".to_string(),
                content: json!("hi"),
                tool_call_id: None,
                is_error: None,
            },
            event_ids: vec![Some("evt_1".to_string())],
        }],
        token_usage: SessionTokenUsage {
            input_tokens: 10,
            output_tokens: 20,
            cache_read_tokens: None,
            cache_creation_tokens: None,
            cache_creation_5m_tokens: None,
            cache_creation_1h_tokens: None,
        },
        turn_count: 1,
        is_ended: Some(false),
        active_todos: vec![],
    };

    let s = serde_json::to_string(&state).unwrap();
    let back: SessionState = serde_json::from_str(&s).unwrap();
    assert_eq!(state, back);
}
