//! Device token repository — CRUD for the `device_tokens` table.
//!
//! Manages APNS device token registrations for push notifications.
//! Tokens are uniquely identified by `(device_token, platform)`.

use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::errors::Result;
use crate::sqlite::row_types::DeviceTokenRow;

/// Result of registering a device token (upsert).
#[derive(Debug)]
pub struct RegisterTokenResult {
    /// The registration ID.
    pub id: String,
    /// Whether a new row was created (vs. updated existing).
    pub created: bool,
}

/// Device token repository — stateless, every method takes `&Connection`.
pub struct DeviceTokenRepo;

impl DeviceTokenRepo {
    /// Register or update a device token. Returns `{id, created}`.
    ///
    /// If the `(device_token, platform)` pair already exists, updates the
    /// session/workspace/environment and reactivates it. Otherwise inserts a new row.
    pub fn register(
        conn: &Connection,
        device_token: &str,
        session_id: Option<&str>,
        workspace_id: Option<&str>,
        environment: &str,
    ) -> Result<RegisterTokenResult> {
        let now = chrono::Utc::now().to_rfc3339();
        let platform = "ios";

        // Check if token already exists
        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM device_tokens WHERE device_token = ?1 AND platform = ?2",
                params![device_token, platform],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            // Update existing token
            let _ = conn.execute(
                "UPDATE device_tokens
                 SET session_id = ?1, workspace_id = ?2, environment = ?3,
                     last_used_at = ?4, is_active = 1
                 WHERE id = ?5",
                params![session_id, workspace_id, environment, now, id],
            )?;
            Ok(RegisterTokenResult { id, created: false })
        } else {
            // Insert new token
            let id = Uuid::now_v7().to_string();
            let _ = conn.execute(
                "INSERT INTO device_tokens (id, device_token, session_id, workspace_id,
                     platform, environment, created_at, last_used_at, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)",
                params![
                    id,
                    device_token,
                    session_id,
                    workspace_id,
                    platform,
                    environment,
                    now,
                    now
                ],
            )?;
            Ok(RegisterTokenResult { id, created: true })
        }
    }

    /// Unregister (deactivate) a device token. Returns whether any row was updated.
    pub fn unregister(conn: &Connection, device_token: &str) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE device_tokens SET is_active = 0 WHERE device_token = ?1",
            params![device_token],
        )?;
        Ok(changed > 0)
    }

    /// Get a device token by ID.
    pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<DeviceTokenRow>> {
        let row = conn
            .query_row(
                "SELECT id, device_token, session_id, workspace_id, platform,
                        environment, created_at, last_used_at, is_active
                 FROM device_tokens WHERE id = ?1",
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Get all active tokens.
    pub fn get_all_active(conn: &Connection) -> Result<Vec<DeviceTokenRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, device_token, session_id, workspace_id, platform,
                    environment, created_at, last_used_at, is_active
             FROM device_tokens WHERE is_active = 1",
        )?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Get active tokens for a specific session.
    pub fn get_by_session(conn: &Connection, session_id: &str) -> Result<Vec<DeviceTokenRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, device_token, session_id, workspace_id, platform,
                    environment, created_at, last_used_at, is_active
             FROM device_tokens WHERE session_id = ?1 AND is_active = 1",
        )?;
        let rows = stmt
            .query_map(params![session_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Mark a token as invalid (deactivate by `device_token` value).
    pub fn mark_invalid(conn: &Connection, device_token: &str) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE device_tokens SET is_active = 0 WHERE device_token = ?1",
            params![device_token],
        )?;
        Ok(changed > 0)
    }

    /// Map a rusqlite row to `DeviceTokenRow`.
    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DeviceTokenRow> {
        Ok(DeviceTokenRow {
            id: row.get(0)?,
            device_token: row.get(1)?,
            session_id: row.get(2)?,
            workspace_id: row.get(3)?,
            platform: row.get(4)?,
            environment: row.get(5)?,
            created_at: row.get(6)?,
            last_used_at: row.get(7)?,
            is_active: row.get::<_, i32>(8)? == 1,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
