//! Memory ledger payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload for `memory.ledger` events — an append to the durable memory
/// ledger the context assembler folds into the system prompt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryLedgerPayload {
    /// Ledger entry key.
    pub key: String,
    /// Ledger entry value.
    pub value: String,
    /// Source that wrote this entry (`"user"`, `"agent"`, `"hook"`).
    pub source: String,
}

/// Payload for `memory.loaded` events.
///
/// The loaded memory shape varies by source (ledger snapshot, external
/// memory file, skill-provided context) so it is carried as opaque JSON
/// rather than a fixed struct.
pub type MemoryLoadedPayload = Value;
