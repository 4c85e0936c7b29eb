//! Log querying from `SQLite`.
//!
//! [`LogStore`] provides read-only access to persisted logs with filtering,
//! full-text search, and trace tree queries.

use std::fmt::Write as _;

use rusqlite::Connection;

use crate::types::{LogEntry, LogLevel, LogQueryOptions};

/// Read-only log querying interface.
pub struct LogStore<'a> {
    conn: &'a Connection,
}

impl<'a> LogStore<'a> {
    /// Create a new log store backed by the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Query logs with filters.
    #[allow(clippy::cast_possible_wrap)]
    pub fn query(&self, opts: &LogQueryOptions) -> Vec<LogEntry> {
        let mut sql = String::from(
            "SELECT id, timestamp, level, level_num, component, message, \
             session_id, workspace_id, event_id, turn, trace_id, \
             parent_trace_id, depth, data, error_message, error_stack \
             FROM logs WHERE 1=1",
        );
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref sid) = opts.session_id {
            sql.push_str(" AND session_id = ?");
            params.push(Box::new(sid.clone()));
        }
        if let Some(ref wid) = opts.workspace_id {
            sql.push_str(" AND workspace_id = ?");
            params.push(Box::new(wid.clone()));
        }
        if let Some(min_level) = opts.min_level {
            sql.push_str(" AND level_num >= ?");
            params.push(Box::new(min_level));
        }
        if let Some(ref tid) = opts.trace_id {
            sql.push_str(" AND trace_id = ?");
            params.push(Box::new(tid.clone()));
        }
        if let Some(ref components) = opts.components {
            if !components.is_empty() {
                let placeholders: Vec<String> =
                    components.iter().map(|_| "?".to_string()).collect();
                let _ = write!(sql, " AND component IN ({})", placeholders.join(", "));
                for c in components {
                    params.push(Box::new(c.clone()));
                }
            }
        }

        let order = opts.order.as_deref().unwrap_or("asc");
        let _ = write!(sql, " ORDER BY timestamp {order}");

        if let Some(limit) = opts.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }
        if let Some(offset) = opts.offset {
            sql.push_str(" OFFSET ?");
            params.push(Box::new(offset as i64));
        }

        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            params.iter().map(AsRef::as_ref).collect();

        let Ok(mut stmt) = self.conn.prepare(&sql) else {
            return Vec::new();
        };

        let rows = stmt.query_map(param_refs.as_slice(), |row| Ok(row_to_entry(row)));

        match rows {
            Ok(mapped) => mapped.filter_map(Result::ok).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Get all logs for a session.
    pub fn get_session_logs(&self, session_id: &str) -> Vec<LogEntry> {
        self.query(&LogQueryOptions {
            session_id: Some(session_id.to_string()),
            order: Some("asc".to_string()),
            ..Default::default()
        })
    }

    /// Get recent errors (across all sessions).
    pub fn get_recent_errors(&self, limit: usize) -> Vec<LogEntry> {
        self.query(&LogQueryOptions {
            min_level: Some(LogLevel::Error.as_num()),
            order: Some("desc".to_string()),
            limit: Some(limit),
            ..Default::default()
        })
    }

    /// Get a trace tree (root + all descendants via `parent_trace_id`).
    pub fn get_trace_tree(&self, trace_id: &str) -> Vec<LogEntry> {
        let sql = "SELECT id, timestamp, level, level_num, component, message, \
                   session_id, workspace_id, event_id, turn, trace_id, \
                   parent_trace_id, depth, data, error_message, error_stack \
                   FROM logs WHERE trace_id = ?1 OR parent_trace_id = ?1 \
                   ORDER BY timestamp ASC";

        let Ok(mut stmt) = self.conn.prepare(sql) else {
            return Vec::new();
        };

        let rows = stmt.query_map([trace_id], |row| Ok(row_to_entry(row)));

        match rows {
            Ok(mapped) => mapped.filter_map(Result::ok).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Delete logs older than the given timestamp.
    ///
    /// Returns the number of deleted rows.
    pub fn prune_old_logs(&self, older_than: &str) -> usize {
        self.conn
            .execute("DELETE FROM logs WHERE timestamp < ?1", [older_than])
            .unwrap_or(0)
    }
}

/// Map a `SQLite` row to a [`LogEntry`].
fn row_to_entry(row: &rusqlite::Row<'_>) -> LogEntry {
    let level_str: String = row.get(2).unwrap_or_default();
    let level = LogLevel::from_str_lossy(&level_str);
    let data_str: Option<String> = row.get(13).unwrap_or(None);

    LogEntry {
        id: row.get(0).unwrap_or(0),
        timestamp: row.get(1).unwrap_or_default(),
        level,
        level_num: row.get(3).unwrap_or(0),
        component: row.get(4).unwrap_or_default(),
        message: row.get(5).unwrap_or_default(),
        session_id: row.get(6).unwrap_or(None),
        workspace_id: row.get(7).unwrap_or(None),
        event_id: row.get(8).unwrap_or(None),
        turn: row.get(9).unwrap_or(None),
        trace_id: row.get(10).unwrap_or(None),
        parent_trace_id: row.get(11).unwrap_or(None),
        depth: row.get(12).unwrap_or(None),
        data: data_str.and_then(|s| serde_json::from_str(&s).ok()),
        error_message: row.get(14).unwrap_or(None),
        error_stack: row.get(15).unwrap_or(None),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
