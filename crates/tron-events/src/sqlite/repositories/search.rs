//! Search repository — full-text search over events via the `events_fts`
//! FTS5 virtual table (kept in sync by triggers at insert time).

use std::fmt::Write as _;

use rusqlite::params;
use rusqlite::Connection;

use crate::errors::Result;
use crate::types::state::SearchResult;

/// Options for a workspace-wide search.
#[derive(Default)]
pub struct SearchOptions<'a> {
    /// Restrict to a single workspace.
    pub workspace_id: Option<&'a str>,
    /// Restrict to a single event type (e.g. `"message.user"`).
    pub event_type: Option<&'a str>,
    /// Maximum results to return.
    pub limit: Option<i64>,
}

/// Search repository — stateless, every method takes `&Connection`.
pub struct SearchRepo;

impl SearchRepo {
    /// Full-text search across all events, optionally scoped by workspace
    /// or event type. Results are ranked by FTS5 `bm25()`, best match first.
    pub fn search(
        conn: &Connection,
        query: &str,
        opts: &SearchOptions<'_>,
    ) -> Result<Vec<SearchResult>> {
        let limit = opts.limit.unwrap_or(50);
        let mut sql = String::from(
            "SELECT e.session_id, e.id, e.type, snippet(events_fts, 0, '[', ']', '...', 16),
                    bm25(events_fts), e.timestamp
             FROM events_fts
             JOIN events e ON e.rowid = events_fts.rowid
             WHERE events_fts MATCH ?1",
        );
        if opts.workspace_id.is_some() {
            sql.push_str(" AND e.workspace_id = ?2");
        }
        if opts.event_type.is_some() {
            sql.push_str(if opts.workspace_id.is_some() {
                " AND e.type = ?3"
            } else {
                " AND e.type = ?2"
            });
        }
        let _ = write!(sql, " ORDER BY bm25(events_fts) LIMIT {limit}");

        let mut stmt = conn.prepare(&sql)?;
        let rows = match (opts.workspace_id, opts.event_type) {
            (Some(ws), Some(ty)) => stmt
                .query_map(params![query, ws, ty], Self::map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
            (Some(ws), None) => stmt
                .query_map(params![query, ws], Self::map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
            (None, Some(ty)) => stmt
                .query_map(params![query, ty], Self::map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
            (None, None) => stmt
                .query_map(params![query], Self::map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };
        Ok(rows)
    }

    /// Full-text search restricted to a single session.
    pub fn search_in_session(
        conn: &Connection,
        session_id: &str,
        query: &str,
        limit: Option<i64>,
    ) -> Result<Vec<SearchResult>> {
        let limit = limit.unwrap_or(50);
        let mut stmt = conn.prepare(
            "SELECT e.session_id, e.id, e.type, snippet(events_fts, 0, '[', ']', '...', 16),
                    bm25(events_fts), e.timestamp
             FROM events_fts
             JOIN events e ON e.rowid = events_fts.rowid
             WHERE events_fts MATCH ?1 AND e.session_id = ?2
             ORDER BY bm25(events_fts) LIMIT ?3",
        )?;
        let rows = stmt
            .query_map(params![query, session_id, limit], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SearchResult> {
        Ok(SearchResult {
            session_id: row.get(0)?,
            event_id: row.get(1)?,
            event_type: row.get(2)?,
            snippet: row.get(3)?,
            rank: row.get(4)?,
            timestamp: row.get(5)?,
        })
    }
}

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::sqlite::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")
            .unwrap();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO workspaces (id, path, created_at, last_activity_at)
             VALUES ('ws_1', '/tmp/test', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO sessions (id, workspace_id, latest_model, working_directory, created_at, last_activity_at)
             VALUES ('sess_1', 'ws_1', 'test', '/tmp/test', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        conn
    }

    fn insert_message(conn: &Connection, id: &str, session_id: &str, content: &str) {
        conn.execute(
            "INSERT INTO events (id, session_id, parent_id, sequence, depth, type, timestamp, payload, workspace_id)
             VALUES (?1, ?2, NULL, 0, 0, 'message.user', '2025-01-01T00:00:00Z', ?3, 'ws_1')",
            params![id, session_id, serde_json::json!({"content": content}).to_string()],
        )
        .unwrap();
    }

    #[test]
    fn search_finds_matching_content() {
        let conn = setup();
        insert_message(&conn, "evt_1", "sess_1", "rust programming is great");
        let results = SearchRepo::search(&conn, "rust", &SearchOptions::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].event_id, "evt_1");
    }

    #[test]
    fn search_scoped_to_workspace() {
        let conn = setup();
        insert_message(&conn, "evt_1", "sess_1", "rust programming");
        let opts = SearchOptions {
            workspace_id: Some("nonexistent"),
            ..Default::default()
        };
        let results = SearchRepo::search(&conn, "rust", &opts).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn search_in_session_scopes_correctly() {
        let conn = setup();
        conn.execute(
            "INSERT INTO sessions (id, workspace_id, latest_model, working_directory, created_at, last_activity_at)
             VALUES ('sess_2', 'ws_1', 'test', '/tmp/test', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        insert_message(&conn, "evt_1", "sess_1", "hello world");
        insert_message(&conn, "evt_2", "sess_2", "hello cosmos");

        let results = SearchRepo::search_in_session(&conn, "sess_1", "hello", None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].session_id, "sess_1");
    }

    #[test]
    fn search_no_match_returns_empty() {
        let conn = setup();
        insert_message(&conn, "evt_1", "sess_1", "hello world");
        let results = SearchRepo::search(&conn, "nonexistentterm", &SearchOptions::default()).unwrap();
        assert!(results.is_empty());
    }
}
