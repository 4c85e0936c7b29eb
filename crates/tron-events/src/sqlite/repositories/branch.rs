//! Branch repository — CRUD for the `branches` table.
//!
//! Branches are schema-reserved: the table and this repository exist and
//! round-trip correctly, but no event store operation currently creates or
//! mutates a branch pointer. `session.fork` and `rewind` both operate
//! directly on `head_event_id` instead.

use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::errors::Result;
use crate::sqlite::row_types::BranchRow;

/// Branch repository — stateless, every method takes `&Connection`.
pub struct BranchRepo;

impl BranchRepo {
    /// Create a new branch pointer.
    pub fn create(
        conn: &Connection,
        session_id: &str,
        name: &str,
        description: Option<&str>,
        root_event_id: &str,
        head_event_id: &str,
        is_default: bool,
    ) -> Result<BranchRow> {
        let id = format!("branch_{}", Uuid::now_v7());
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO branches (id, session_id, name, description, root_event_id,
                 head_event_id, is_default, created_at, last_activity_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                id,
                session_id,
                name,
                description,
                root_event_id,
                head_event_id,
                is_default,
                now
            ],
        )?;
        Self::get_by_id(conn, &id)?.ok_or_else(|| {
            crate::errors::EventStoreError::Internal("branch vanished after insert".to_string())
        })
    }

    /// Get a branch by ID.
    pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<BranchRow>> {
        conn.query_row(
            "SELECT id, session_id, name, description, root_event_id, head_event_id,
                    is_default, created_at, last_activity_at
             FROM branches WHERE id = ?1",
            params![id],
            Self::map_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Get all branches for a session, default branch first.
    pub fn get_by_session(conn: &Connection, session_id: &str) -> Result<Vec<BranchRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, session_id, name, description, root_event_id, head_event_id,
                    is_default, created_at, last_activity_at
             FROM branches WHERE session_id = ?1
             ORDER BY is_default DESC, created_at ASC",
        )?;
        let rows = stmt
            .query_map(params![session_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Advance a branch's head pointer.
    pub fn update_head(conn: &Connection, id: &str, head_event_id: &str) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE branches SET head_event_id = ?1, last_activity_at = ?2 WHERE id = ?3",
            params![head_event_id, now, id],
        )?;
        Ok(changed > 0)
    }

    /// Delete all branches for a session. Returns the number removed.
    pub fn delete_by_session(conn: &Connection, session_id: &str) -> Result<usize> {
        let removed = conn.execute(
            "DELETE FROM branches WHERE session_id = ?1",
            params![session_id],
        )?;
        Ok(removed)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BranchRow> {
        Ok(BranchRow {
            id: row.get(0)?,
            session_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            root_event_id: row.get(4)?,
            head_event_id: row.get(5)?,
            is_default: row.get::<_, i64>(6)? != 0,
            created_at: row.get(7)?,
            last_activity_at: row.get(8)?,
        })
    }
}
