//! File operation payloads, recorded for audit and context-window accounting.

use serde::{Deserialize, Serialize};

/// Payload for `file.read` events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReadPayload {
    /// Absolute path read.
    pub path: String,
    /// Content blob ID, if the content was large enough to externalize.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_id: Option<String>,
    /// Byte offset the read started at, for partial reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Number of lines returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_count: Option<i64>,
}

/// Payload for `file.write` events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileWritePayload {
    /// Absolute path written.
    pub path: String,
    /// Content blob ID holding the written content.
    pub blob_id: String,
    /// Whether the write created a new file.
    pub created: bool,
}

/// Payload for `file.edit` events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEditPayload {
    /// Absolute path edited.
    pub path: String,
    /// Content blob ID holding the diff applied.
    pub diff_blob_id: String,
    /// Number of lines added.
    pub lines_added: i64,
    /// Number of lines removed.
    pub lines_removed: i64,
}
