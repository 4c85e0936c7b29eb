//! Blob repository — content-addressable storage for the `blobs` table.
//!
//! Content is keyed by its SHA-256 hash: storing the same bytes twice
//! returns the existing row and bumps `ref_count` instead of duplicating
//! storage. `release` is the mirror operation; a blob with `ref_count <= 0`
//! is eligible for garbage collection but is never deleted implicitly here
//! — callers decide when to sweep.

use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::{EventStoreError, Result};
use crate::sqlite::row_types::BlobRow;

/// Blob repository — stateless, every method takes `&Connection`.
pub struct BlobRepo;

impl BlobRepo {
    /// Store `content`, deduplicating by SHA-256 hash. Returns the blob ID.
    ///
    /// If identical content already exists, its `ref_count` is incremented
    /// and the existing ID is returned rather than duplicating the row.
    pub fn store(conn: &Connection, content: &[u8], mime_type: &str) -> Result<String> {
        let hash = Self::hash(content);

        if let Some(existing) = Self::get_by_hash(conn, &hash)? {
            let _ = conn.execute(
                "UPDATE blobs SET ref_count = ref_count + 1 WHERE id = ?1",
                params![existing.id],
            )?;
            return Ok(existing.id);
        }

        let id = format!("blob_{}", Uuid::now_v7());
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO blobs (id, hash, content, mime_type, size_original,
                 size_compressed, compression, ref_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5, 'none', 1, ?6)",
            params![id, hash, content, mime_type, content.len() as i64, now],
        )?;
        Ok(id)
    }

    /// Get a blob's raw content by ID.
    pub fn get_content(conn: &Connection, blob_id: &str) -> Result<Option<Vec<u8>>> {
        conn.query_row(
            "SELECT content FROM blobs WHERE id = ?1",
            params![blob_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(Into::into)
    }

    /// Get full blob metadata by ID.
    pub fn get_by_id(conn: &Connection, blob_id: &str) -> Result<Option<BlobRow>> {
        conn.query_row(
            "SELECT id, hash, content, mime_type, size_original, size_compressed,
                    compression, created_at, ref_count
             FROM blobs WHERE id = ?1",
            params![blob_id],
            Self::map_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Get full blob metadata by content hash.
    pub fn get_by_hash(conn: &Connection, hash: &str) -> Result<Option<BlobRow>> {
        conn.query_row(
            "SELECT id, hash, content, mime_type, size_original, size_compressed,
                    compression, created_at, ref_count
             FROM blobs WHERE hash = ?1",
            params![hash],
            Self::map_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Increment a blob's reference count.
    pub fn acquire(conn: &Connection, blob_id: &str) -> Result<()> {
        let changed = conn.execute(
            "UPDATE blobs SET ref_count = ref_count + 1 WHERE id = ?1",
            params![blob_id],
        )?;
        if changed == 0 {
            return Err(EventStoreError::BlobNotFound(blob_id.to_string()));
        }
        Ok(())
    }

    /// Decrement a blob's reference count. Returns the count after release;
    /// a value `<= 0` means the blob is eligible for garbage collection.
    pub fn release(conn: &Connection, blob_id: &str) -> Result<i64> {
        let changed = conn.execute(
            "UPDATE blobs SET ref_count = ref_count - 1 WHERE id = ?1",
            params![blob_id],
        )?;
        if changed == 0 {
            return Err(EventStoreError::BlobNotFound(blob_id.to_string()));
        }
        let ref_count: i64 = conn.query_row(
            "SELECT ref_count FROM blobs WHERE id = ?1",
            params![blob_id],
            |row| row.get(0),
        )?;
        Ok(ref_count)
    }

    /// Permanently delete blobs whose `ref_count <= 0`. Returns the count removed.
    pub fn sweep_unreferenced(conn: &Connection) -> Result<usize> {
        let removed = conn.execute("DELETE FROM blobs WHERE ref_count <= 0", [])?;
        Ok(removed)
    }

    fn hash(content: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        format!("{:x}", hasher.finalize())
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BlobRow> {
        Ok(BlobRow {
            id: row.get(0)?,
            hash: row.get(1)?,
            content: row.get(2)?,
            mime_type: row.get(3)?,
            size_original: row.get(4)?,
            size_compressed: row.get(5)?,
            compression: row.get(6)?,
            created_at: row.get(7)?,
            ref_count: row.get(8)?,
        })
    }
}
