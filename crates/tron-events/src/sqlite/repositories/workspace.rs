//! Workspace repository — CRUD for the `workspaces` table.
//!
//! A workspace is keyed by its absolute filesystem path; `get_or_create` is
//! the primary entry point since session creation never wants to fail just
//! because the workspace row doesn't exist yet.

use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::errors::Result;
use crate::sqlite::row_types::WorkspaceRow;

/// Workspace repository — stateless, every method takes `&Connection`.
pub struct WorkspaceRepo;

impl WorkspaceRepo {
    /// Get or create the workspace at `path`. If it already exists, `name`
    /// is ignored — the first write wins.
    pub fn get_or_create(
        conn: &Connection,
        path: &str,
        name: Option<&str>,
    ) -> Result<WorkspaceRow> {
        if let Some(existing) = Self::get_by_path(conn, path)? {
            return Ok(existing);
        }

        let id = format!("ws_{}", Uuid::now_v7());
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO workspaces (id, path, name, created_at, last_activity_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![id, path, name, now],
        )?;

        Self::get_by_path(conn, path)?
            .ok_or_else(|| crate::errors::EventStoreError::Internal(
                "workspace vanished after insert".to_string(),
            ))
    }

    /// Get a workspace by its absolute path.
    pub fn get_by_path(conn: &Connection, path: &str) -> Result<Option<WorkspaceRow>> {
        conn.query_row(
            "SELECT id, path, name, created_at, last_activity_at, NULL
             FROM workspaces WHERE path = ?1",
            params![path],
            Self::map_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Get a workspace by ID.
    pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<WorkspaceRow>> {
        conn.query_row(
            "SELECT id, path, name, created_at, last_activity_at, NULL
             FROM workspaces WHERE id = ?1",
            params![id],
            Self::map_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// List all workspaces, most recently active first, with session counts.
    pub fn list(conn: &Connection) -> Result<Vec<WorkspaceRow>> {
        let mut stmt = conn.prepare(
            "SELECT w.id, w.path, w.name, w.created_at, w.last_activity_at,
                    (SELECT COUNT(*) FROM sessions s WHERE s.workspace_id = w.id)
             FROM workspaces w
             ORDER BY w.last_activity_at DESC",
        )?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Touch a workspace's `last_activity_at`.
    pub fn touch(conn: &Connection, id: &str) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE workspaces SET last_activity_at = ?1 WHERE id = ?2",
            params![now, id],
        )?;
        Ok(changed > 0)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WorkspaceRow> {
        Ok(WorkspaceRow {
            id: row.get(0)?,
            path: row.get(1)?,
            name: row.get(2)?,
            created_at: row.get(3)?,
            last_activity_at: row.get(4)?,
            session_count: row.get(5)?,
        })
    }
}
