//! High-level transactional `EventStore` API.
//!
//! Composes all repository operations into atomic, session-centric methods.
//! Every write method runs inside a single `SQLite` transaction — callers
//! never observe partial state.

use serde_json::Value;
use uuid::Uuid;

use crate::errors::{EventStoreError, Result};
use crate::sqlite::connection::{ConnectionPool, PooledConnection};
use crate::sqlite::repositories::blob::BlobRepo;
use crate::sqlite::repositories::branch::BranchRepo;
use crate::sqlite::repositories::event::{EventRepo, ListEventsOptions, TokenUsageSummary};
use crate::sqlite::repositories::search::{SearchOptions, SearchRepo};
use crate::sqlite::repositories::session::{
    CreateSessionOptions, IncrementCounters, ListSessionsOptions, SessionRepo,
};
use crate::sqlite::repositories::workspace::WorkspaceRepo;
use crate::sqlite::row_types::{BlobRow, EventRow, SessionRow, WorkspaceRow};
use crate::reconstruct::reconstruct_from_events;
use crate::types::base::SessionEvent;
use crate::types::payloads::config::ConfigModelSwitchPayload;
use crate::types::payloads::session::SessionStartPayload;
use crate::types::state::{SearchResult, SessionState, SessionTokenUsage};
use crate::types::EventType;

/// Result of creating a new session.
#[derive(Debug)]
pub struct CreateSessionResult {
    /// The created session.
    pub session: SessionRow,
    /// The root `session.start` event.
    pub root_event: EventRow,
}

/// Result of forking a session.
#[derive(Debug)]
pub struct ForkResult {
    /// The newly created (forked) session.
    pub session: SessionRow,
    /// The root `session.fork` event.
    pub fork_event: EventRow,
}

/// Result of rewinding a session's head pointer.
#[derive(Debug)]
pub struct RewindResult {
    /// Session that was rewound.
    pub session_id: String,
    /// Head event ID after the rewind.
    pub new_head_event_id: String,
    /// Head event ID before the rewind, if the session had one.
    pub previous_head_event_id: Option<String>,
}

/// A position in the global (cross-session) event stream, used to resume
/// replay after a reconnect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventCursor {
    /// Event ID the cursor points at.
    pub event_id: String,
    /// Timestamp of the event the cursor points at.
    pub timestamp: String,
}

/// A page of globally-ordered events for a reconnecting client to replay.
#[derive(Debug)]
pub struct EventsSincePage {
    /// Events in this page, ordered `(timestamp, id)` ascending.
    pub events: Vec<EventRow>,
    /// Whether more events exist past this page.
    pub has_more: bool,
    /// Cursor to pass on the next call, if `has_more` is set.
    pub next_cursor: Option<EventCursor>,
}

/// Options for appending an event.
pub struct AppendOptions<'a> {
    /// Session to append to.
    pub session_id: &'a str,
    /// Event type.
    pub event_type: EventType,
    /// Event payload (JSON).
    pub payload: Value,
    /// Explicit parent. If `None`, chains from session head.
    pub parent_id: Option<&'a str>,
}

/// Options for forking a session.
#[derive(Default)]
pub struct ForkOptions<'a> {
    /// Optional model override for the fork.
    pub model: Option<&'a str>,
    /// Optional title for the forked session.
    pub title: Option<&'a str>,
}

/// High-level `EventStore` wrapping a connection pool and all repositories.
///
/// All write methods are transactional — they run inside `SAVEPOINT`/`RELEASE`
/// blocks so callers never see partial state.
pub struct EventStore {
    pool: ConnectionPool,
}

impl EventStore {
    /// Create a new `EventStore` with the given connection pool.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Get a connection from the pool.
    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Create a new session with a root `session.start` event.
    ///
    /// Atomic: workspace creation (get-or-create), session insertion, root event
    /// insertion, head/root pointer updates, and counter increments all happen
    /// in a single transaction.
    pub fn create_session(
        &self,
        model: &str,
        workspace_path: &str,
        title: Option<&str>,
    ) -> Result<CreateSessionResult> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        // 1. Get or create workspace
        let ws = WorkspaceRepo::get_or_create(&tx, workspace_path, None)?;

        // 2. Create session
        let session = SessionRepo::create(
            &tx,
            &CreateSessionOptions {
                workspace_id: &ws.id,
                model,
                working_directory: workspace_path,
                title,
                tags: None,
                parent_session_id: None,
                fork_from_event_id: None,
                spawning_session_id: None,
                spawn_type: None,
                spawn_task: None,
            },
        )?;

        // 3. Create root session.start event
        let event_id = format!("evt_{}", Uuid::now_v7());
        let now = chrono::Utc::now().to_rfc3339();
        let payload = serde_json::json!({
            "workingDirectory": workspace_path,
            "model": model,
        });
        let event = SessionEvent {
            id: event_id,
            session_id: session.id.clone(),
            parent_id: None,
            workspace_id: ws.id.clone(),
            timestamp: now,
            event_type: EventType::SessionStart,
            sequence: 0,
            checksum: None,
            payload,
        };
        EventRepo::insert(&tx, &event)?;

        // 4. Update session root and head
        let _ = SessionRepo::update_root(&tx, &session.id, &event.id)?;
        let _ = SessionRepo::update_head(&tx, &session.id, &event.id)?;

        // 5. Increment event count
        let _ = SessionRepo::increment_counters(
            &tx,
            &session.id,
            &IncrementCounters {
                event_count: Some(1),
                ..Default::default()
            },
        )?;

        tx.commit()?;

        // Re-fetch session to get updated head/root/counters
        let updated_session = SessionRepo::get_by_id(&conn, &session.id)?
            .ok_or(EventStoreError::SessionNotFound(session.id))?;

        // Re-read the event row to get denormalized fields
        let root_event = EventRepo::get_by_id(&conn, &event.id)?
            .ok_or(EventStoreError::EventNotFound(event.id))?;

        Ok(CreateSessionResult {
            session: updated_session,
            root_event,
        })
    }

    /// Append an event to a session.
    ///
    /// Atomic: sequence generation, event insertion, head update, and counter
    /// increments all happen in a single transaction.
    pub fn append(&self, opts: &AppendOptions<'_>) -> Result<EventRow> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        // 1. Fetch session (must exist)
        let session = SessionRepo::get_by_id(&tx, opts.session_id)?
            .ok_or_else(|| EventStoreError::SessionNotFound(opts.session_id.to_string()))?;

        // 2. Resolve parent. An explicit parent must match the session's
        // current head — appends are linear; branching off an ancestor
        // requires `fork()`, which creates a new session instead of
        // silently forking history under the caller's feet.
        let parent_id = match opts.parent_id {
            Some(pid) => {
                if session.head_event_id.as_deref() != Some(pid) {
                    return Err(EventStoreError::StaleParent {
                        expected_head: session.head_event_id.clone().unwrap_or_default(),
                        given_parent: pid.to_string(),
                    });
                }
                Some(pid.to_string())
            }
            None => session.head_event_id.clone(),
        };

        // 3. Get next sequence
        let sequence = EventRepo::get_next_sequence(&tx, opts.session_id)?;

        // 4. Build event (depth is computed by EventRepo::insert)
        let event_id = format!("evt_{}", Uuid::now_v7());
        let now = chrono::Utc::now().to_rfc3339();

        let event = SessionEvent {
            id: event_id,
            session_id: opts.session_id.to_string(),
            parent_id,
            workspace_id: session.workspace_id.clone(),
            timestamp: now,
            event_type: opts.event_type,
            sequence,
            checksum: None,
            payload: opts.payload.clone(),
        };

        // 6. Insert (repo extracts denormalized fields from payload)
        EventRepo::insert(&tx, &event)?;

        // 7. Update session head
        let _ = SessionRepo::update_head(&tx, opts.session_id, &event.id)?;

        // 8. Build counter increments
        let mut counters = IncrementCounters {
            event_count: Some(1),
            ..Default::default()
        };

        // Message count
        if matches!(
            opts.event_type,
            EventType::MessageUser | EventType::MessageAssistant
        ) {
            counters.message_count = Some(1);
        }

        // Token usage from payload
        if let Some(tu) = opts.payload.get("tokenUsage") {
            counters.input_tokens = tu.get("inputTokens").and_then(Value::as_i64);
            counters.output_tokens = tu.get("outputTokens").and_then(Value::as_i64);
            counters.cache_read_tokens = tu.get("cacheReadInputTokens").and_then(Value::as_i64);
            counters.cache_creation_tokens =
                tu.get("cacheCreationInputTokens").and_then(Value::as_i64);
        }

        // Cost from payload
        if let Some(cost) = opts.payload.get("cost").and_then(Value::as_f64) {
            counters.cost = Some(cost);
        }

        let _ = SessionRepo::increment_counters(&tx, opts.session_id, &counters)?;

        tx.commit()?;

        // Re-read the event to get denormalized fields set by insert
        let inserted = EventRepo::get_by_id(&conn, &event.id)?
            .ok_or(EventStoreError::EventNotFound(event.id))?;
        Ok(inserted)
    }

    /// Fork a session from a specific event.
    ///
    /// Creates a new session whose root `session.fork` event has its `parent_id`
    /// pointing into the source session's event tree. Ancestor walks from the
    /// fork event traverse back through the shared history.
    pub fn fork(
        &self,
        from_event_id: &str,
        opts: &ForkOptions<'_>,
    ) -> Result<ForkResult> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        // 1. Fetch source event
        let source_event = EventRepo::get_by_id(&tx, from_event_id)?
            .ok_or_else(|| EventStoreError::EventNotFound(from_event_id.to_string()))?;

        // 2. Fetch source session
        let source_session = SessionRepo::get_by_id(&tx, &source_event.session_id)?
            .ok_or_else(|| EventStoreError::SessionNotFound(source_event.session_id.clone()))?;

        // 3. Create forked session
        let model = opts.model.unwrap_or(&source_session.latest_model);
        let session = SessionRepo::create(
            &tx,
            &CreateSessionOptions {
                workspace_id: &source_session.workspace_id,
                model,
                working_directory: &source_session.working_directory,
                title: opts.title,
                tags: None,
                parent_session_id: Some(&source_session.id),
                fork_from_event_id: Some(from_event_id),
                spawning_session_id: None,
                spawn_type: None,
                spawn_task: None,
            },
        )?;

        // 4. Create fork event (parentId points into source tree)
        let event_id = format!("evt_{}", Uuid::now_v7());
        let now = chrono::Utc::now().to_rfc3339();
        let payload = serde_json::json!({
            "sourceSessionId": source_session.id,
            "sourceEventId": from_event_id,
        });

        let fork_event = SessionEvent {
            id: event_id,
            session_id: session.id.clone(),
            parent_id: Some(from_event_id.to_string()),
            workspace_id: source_session.workspace_id.clone(),
            timestamp: now,
            event_type: EventType::SessionFork,
            sequence: 0,
            checksum: None,
            payload,
        };
        EventRepo::insert(&tx, &fork_event)?;

        // 5. Set root and head
        let _ = SessionRepo::update_root(&tx, &session.id, &fork_event.id)?;
        let _ = SessionRepo::update_head(&tx, &session.id, &fork_event.id)?;

        // 6. Increment event count
        let _ = SessionRepo::increment_counters(
            &tx,
            &session.id,
            &IncrementCounters {
                event_count: Some(1),
                ..Default::default()
            },
        )?;

        tx.commit()?;

        let updated_session = SessionRepo::get_by_id(&conn, &session.id)?
            .ok_or(EventStoreError::SessionNotFound(session.id))?;

        let fork_event_row = EventRepo::get_by_id(&conn, &fork_event.id)?
            .ok_or(EventStoreError::EventNotFound(fork_event.id))?;

        Ok(ForkResult {
            session: updated_session,
            fork_event: fork_event_row,
        })
    }

    /// Move a session's head pointer to an earlier event in its own history.
    ///
    /// Events past the new head are never deleted — they remain addressable
    /// by ID, just unreachable from `get_state_at_head`. `to_event_id` must
    /// belong to `session_id` itself and must already be an ancestor of the
    /// current head; targeting an event on the other side of this session's
    /// own fork point (i.e. one that belongs to an ancestor session) is
    /// rejected rather than silently rewinding into foreign history.
    pub fn rewind(&self, session_id: &str, to_event_id: &str) -> Result<RewindResult> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        let session = SessionRepo::get_by_id(&tx, session_id)?
            .ok_or_else(|| EventStoreError::SessionNotFound(session_id.to_string()))?;

        let target = EventRepo::get_by_id(&tx, to_event_id)?
            .ok_or_else(|| EventStoreError::EventNotFound(to_event_id.to_string()))?;

        if target.session_id != session_id {
            return Err(EventStoreError::InvalidOperation(format!(
                "cannot rewind session '{session_id}' to event '{to_event_id}' — \
                 the event belongs to session '{}'",
                target.session_id
            )));
        }

        if let Some(head_event_id) = session.head_event_id.as_deref() {
            let ancestors = EventRepo::get_ancestors(&tx, head_event_id)?;
            if !ancestors.iter().any(|e| e.id == to_event_id) {
                return Err(EventStoreError::InvalidOperation(format!(
                    "event '{to_event_id}' is not an ancestor of session '{session_id}''s current head"
                )));
            }
        }

        let previous_head_event_id = session.head_event_id.clone();
        let _ = SessionRepo::update_head(&tx, session_id, to_event_id)?;
        tx.commit()?;

        Ok(RewindResult {
            session_id: session_id.to_string(),
            new_head_event_id: to_event_id.to_string(),
            previous_head_event_id,
        })
    }

    /// Delete a message by appending a `message.deleted` event.
    ///
    /// The target event must be a message event (`message.user`, `message.assistant`,
    /// or `tool.result`). The original event is never modified — deletion is recorded
    /// as a new event and applied during message reconstruction.
    pub fn delete_message(
        &self,
        session_id: &str,
        target_event_id: &str,
        reason: Option<&str>,
    ) -> Result<EventRow> {
        // Validate target exists and is a message type
        let conn = self.conn()?;
        let target = EventRepo::get_by_id(&conn, target_event_id)?
            .ok_or_else(|| EventStoreError::EventNotFound(target_event_id.to_string()))?;

        let target_type: EventType = target
            .event_type
            .parse()
            .map_err(|_| EventStoreError::InvalidOperation("Unknown event type".to_string()))?;

        if !matches!(
            target_type,
            EventType::MessageUser | EventType::MessageAssistant | EventType::ToolResult
        ) {
            return Err(EventStoreError::InvalidOperation(format!(
                "Cannot delete event of type '{}' — only message and tool result events can be deleted",
                target.event_type
            )));
        }

        // Append message.deleted event
        self.append(&AppendOptions {
            session_id,
            event_type: EventType::MessageDeleted,
            payload: serde_json::json!({
                "targetEventId": target_event_id,
                "targetType": target.event_type,
                "reason": reason.unwrap_or("user_request"),
            }),
            parent_id: None,
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Event retrieval
    // ─────────────────────────────────────────────────────────────────────

    /// Get a single event by ID.
    pub fn get_event(&self, event_id: &str) -> Result<Option<EventRow>> {
        let conn = self.conn()?;
        EventRepo::get_by_id(&conn, event_id)
    }

    /// Get all events for a session, ordered by sequence.
    pub fn get_events_by_session(
        &self,
        session_id: &str,
        opts: &ListEventsOptions,
    ) -> Result<Vec<EventRow>> {
        let conn = self.conn()?;
        EventRepo::get_by_session(&conn, session_id, opts)
    }

    /// Get ancestor chain from root to the given event (inclusive).
    pub fn get_ancestors(&self, event_id: &str) -> Result<Vec<EventRow>> {
        let conn = self.conn()?;
        EventRepo::get_ancestors(&conn, event_id)
    }

    /// Get direct children of an event.
    pub fn get_children(&self, event_id: &str) -> Result<Vec<EventRow>> {
        let conn = self.conn()?;
        EventRepo::get_children(&conn, event_id)
    }

    /// Get all descendants of an event (recursive).
    pub fn get_descendants(&self, event_id: &str) -> Result<Vec<EventRow>> {
        let conn = self.conn()?;
        EventRepo::get_descendants(&conn, event_id)
    }

    /// Get events inserted after a specific sequence number.
    pub fn get_events_since(
        &self,
        session_id: &str,
        after_sequence: i64,
    ) -> Result<Vec<EventRow>> {
        let conn = self.conn()?;
        EventRepo::get_since(&conn, session_id, after_sequence)
    }

    /// Get token usage summary for a session.
    pub fn get_token_usage_summary(&self, session_id: &str) -> Result<TokenUsageSummary> {
        let conn = self.conn()?;
        EventRepo::get_token_usage_summary(&conn, session_id)
    }

    /// Page through the global (cross-session) event stream strictly after
    /// `cursor`, in `(timestamp, id)` order. Used by reconnecting clients to
    /// catch up on everything they missed, independent of which session(s)
    /// produced it.
    pub fn events_since(&self, cursor: Option<&EventCursor>, limit: i64) -> Result<EventsSincePage> {
        let conn = self.conn()?;
        let fetch = limit.max(1) + 1;
        let (after_timestamp, after_id) = match cursor {
            Some(c) => (c.timestamp.as_str(), c.event_id.as_str()),
            None => ("", ""),
        };

        let mut rows = EventRepo::get_after_cursor(&conn, after_timestamp, after_id, fetch)?;

        let has_more = rows.len() as i64 > limit;
        if has_more {
            rows.truncate(limit as usize);
        }
        let next_cursor = rows.last().map(|e| EventCursor {
            event_id: e.id.clone(),
            timestamp: e.timestamp.clone(),
        });

        Ok(EventsSincePage {
            events: rows,
            has_more,
            next_cursor,
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // State reconstruction (delegated to C3)
    // ─────────────────────────────────────────────────────────────────────

    /// Reconstruct full session state at the session's current head.
    pub fn get_state_at_head(&self, session_id: &str) -> Result<SessionState> {
        let conn = self.conn()?;
        let session = SessionRepo::get_by_id(&conn, session_id)?
            .ok_or_else(|| EventStoreError::SessionNotFound(session_id.to_string()))?;

        let Some(head_event_id) = session.head_event_id.clone() else {
            return Ok(SessionState {
                model: session.latest_model.clone(),
                working_directory: session.working_directory.clone(),
                is_ended: Some(session.ended_at.is_some()),
                ..Default::default()
            });
        };

        self.state_at_event(&conn, &session, &head_event_id)
    }

    /// Reconstruct full session state as of an arbitrary ancestor event.
    ///
    /// Used when forking from (or inspecting) a point other than the
    /// current head.
    pub fn get_state_at(&self, event_id: &str) -> Result<SessionState> {
        let conn = self.conn()?;
        let target = EventRepo::get_by_id(&conn, event_id)?
            .ok_or_else(|| EventStoreError::EventNotFound(event_id.to_string()))?;
        let session = SessionRepo::get_by_id(&conn, &target.session_id)?
            .ok_or_else(|| EventStoreError::SessionNotFound(target.session_id.clone()))?;

        self.state_at_event(&conn, &session, event_id)
    }

    fn state_at_event(
        &self,
        conn: &PooledConnection,
        session: &SessionRow,
        event_id: &str,
    ) -> Result<SessionState> {
        let rows = EventRepo::get_ancestors(conn, event_id)?;
        let events = rows
            .iter()
            .map(Self::row_to_session_event)
            .collect::<Result<Vec<_>>>()?;

        // The session row's `latest_model` tracks the most recent switch, but
        // reconstructing at a historical event wants the model in effect at
        // that point, so walk the chain for the last override.
        let mut model = session.latest_model.clone();
        for event in &events {
            match event.event_type {
                EventType::SessionStart => {
                    if let Ok(payload) =
                        serde_json::from_value::<SessionStartPayload>(event.payload.clone())
                    {
                        model = payload.model;
                    }
                }
                EventType::ConfigModelSwitch => {
                    if let Ok(payload) =
                        serde_json::from_value::<ConfigModelSwitchPayload>(event.payload.clone())
                    {
                        model = payload.new_model;
                    }
                }
                _ => {}
            }
        }

        let result = reconstruct_from_events(&events);

        Ok(SessionState {
            model,
            working_directory: session.working_directory.clone(),
            system_prompt: result.system_prompt,
            reasoning_level: result.reasoning_level,
            messages_with_event_ids: result.messages_with_event_ids,
            token_usage: SessionTokenUsage {
                input_tokens: result.token_usage.input_tokens,
                output_tokens: result.token_usage.output_tokens,
                cache_read_tokens: Some(result.token_usage.cache_read_tokens)
                    .filter(|&v| v > 0),
                cache_creation_tokens: Some(result.token_usage.cache_creation_tokens)
                    .filter(|&v| v > 0),
                cache_creation_5m_tokens: None,
                cache_creation_1h_tokens: None,
            },
            turn_count: result.turn_count,
            is_ended: Some(session.ended_at.is_some()),
            active_todos: result.active_todos,
        })
    }

    /// Convert a persisted row back into the typed wire event reconstruction
    /// operates on.
    fn row_to_session_event(row: &EventRow) -> Result<SessionEvent> {
        Ok(SessionEvent {
            id: row.id.clone(),
            parent_id: row.parent_id.clone(),
            session_id: row.session_id.clone(),
            workspace_id: row.workspace_id.clone(),
            timestamp: row.timestamp.clone(),
            event_type: row
                .event_type
                .parse()
                .map_err(EventStoreError::InvalidOperation)?,
            sequence: row.sequence,
            checksum: row.checksum.clone(),
            payload: serde_json::from_str(&row.payload)?,
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session management
    // ─────────────────────────────────────────────────────────────────────

    /// Get session by ID.
    pub fn get_session(&self, session_id: &str) -> Result<Option<SessionRow>> {
        let conn = self.conn()?;
        SessionRepo::get_by_id(&conn, session_id)
    }

    /// List sessions with filtering.
    pub fn list_sessions(&self, opts: &ListSessionsOptions<'_>) -> Result<Vec<SessionRow>> {
        let conn = self.conn()?;
        SessionRepo::list(&conn, opts)
    }

    /// Mark a session as ended.
    pub fn end_session(&self, session_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        SessionRepo::mark_ended(&conn, session_id)
    }

    /// Reactivate an ended session.
    pub fn clear_session_ended(&self, session_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        SessionRepo::clear_ended(&conn, session_id)
    }

    /// Update the latest model for a session.
    pub fn update_latest_model(&self, session_id: &str, model: &str) -> Result<bool> {
        let conn = self.conn()?;
        SessionRepo::update_latest_model(&conn, session_id, model)
    }

    /// Update session title.
    pub fn update_session_title(&self, session_id: &str, title: Option<&str>) -> Result<bool> {
        let conn = self.conn()?;
        SessionRepo::update_title(&conn, session_id, title)
    }

    /// Delete a session and all its events.
    pub fn delete_session(&self, session_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        // Delete events first (foreign key constraint)
        let _ = EventRepo::delete_by_session(&tx, session_id)?;
        let _ = BranchRepo::delete_by_session(&tx, session_id)?;
        let deleted = SessionRepo::delete(&tx, session_id)?;

        tx.commit()?;
        Ok(deleted)
    }

    /// List subagent sessions for a parent.
    pub fn list_subagents(&self, spawning_session_id: &str) -> Result<Vec<SessionRow>> {
        let conn = self.conn()?;
        SessionRepo::list_subagents(&conn, spawning_session_id)
    }

    /// Update session spawn info (links child to parent session).
    pub fn update_spawn_info(
        &self,
        session_id: &str,
        spawning_session_id: &str,
        spawn_type: &str,
        spawn_task: &str,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE sessions SET spawning_session_id = ?1, spawn_type = ?2, spawn_task = ?3 WHERE id = ?4",
            rusqlite::params![spawning_session_id, spawn_type, spawn_task, session_id],
        )?;
        Ok(changed > 0)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Workspace management
    // ─────────────────────────────────────────────────────────────────────

    /// Get workspace by path.
    pub fn get_workspace_by_path(&self, path: &str) -> Result<Option<WorkspaceRow>> {
        let conn = self.conn()?;
        WorkspaceRepo::get_by_path(&conn, path)
    }

    /// Get or create workspace by path.
    pub fn get_or_create_workspace(
        &self,
        path: &str,
        name: Option<&str>,
    ) -> Result<WorkspaceRow> {
        let conn = self.conn()?;
        WorkspaceRepo::get_or_create(&conn, path, name)
    }

    /// List all workspaces.
    pub fn list_workspaces(&self) -> Result<Vec<WorkspaceRow>> {
        let conn = self.conn()?;
        WorkspaceRepo::list(&conn)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Blob storage
    // ─────────────────────────────────────────────────────────────────────

    /// Store blob content (SHA-256 deduplicated).
    pub fn store_blob(&self, content: &[u8], mime_type: &str) -> Result<String> {
        let conn = self.conn()?;
        BlobRepo::store(&conn, content, mime_type)
    }

    /// Get blob content by ID.
    pub fn get_blob_content(&self, blob_id: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn()?;
        BlobRepo::get_content(&conn, blob_id)
    }

    /// Get full blob metadata.
    pub fn get_blob(&self, blob_id: &str) -> Result<Option<BlobRow>> {
        let conn = self.conn()?;
        BlobRepo::get_by_id(&conn, blob_id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Search
    // ─────────────────────────────────────────────────────────────────────

    /// Full-text search across all events.
    pub fn search(&self, query: &str, opts: &SearchOptions<'_>) -> Result<Vec<SearchResult>> {
        let conn = self.conn()?;
        SearchRepo::search(&conn, query, opts)
    }

    /// Search within a specific session.
    pub fn search_in_session(
        &self,
        session_id: &str,
        query: &str,
        limit: Option<i64>,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.conn()?;
        SearchRepo::search_in_session(&conn, session_id, query, limit)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Branch management (delegated)
    // ─────────────────────────────────────────────────────────────────────

    /// Get branches for a session.
    pub fn get_branches(
        &self,
        session_id: &str,
    ) -> Result<Vec<crate::sqlite::row_types::BranchRow>> {
        let conn = self.conn()?;
        BranchRepo::get_by_session(&conn, session_id)
    }

    /// Get the raw connection pool (for advanced/custom queries).
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
