//! Memory manager error types.

use thiserror::Error;

/// Errors surfaced by the memory manager's pipeline.
///
/// Per the fail-silent contract, callers log and discard these rather than
/// propagate them into the turn runner.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Context compaction failed.
    #[error("compaction failed: {0}")]
    Compaction(String),

    /// Ledger write via subagent failed.
    #[error("ledger write failed: {0}")]
    Ledger(String),

    /// Fire-and-forget embedding failed.
    #[error("embedding failed: {0}")]
    Embedding(String),
}
