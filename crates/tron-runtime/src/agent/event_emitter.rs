//! Broadcast channel wrapper for `TronEvent`s.
//!
//! Shared by `TronAgent`, `agent_runner`, `Orchestrator`, and `SubagentManager`
//! so that every layer can forward events onto a single fan-out channel
//! without owning a sender directly.

use tokio::sync::broadcast;
use tron_core::events::TronEvent;

const CHANNEL_CAPACITY: usize = 1024;

/// Fan-out emitter for `TronEvent`s.
pub struct EventEmitter {
    tx: broadcast::Sender<TronEvent>,
}

impl EventEmitter {
    /// Create a new emitter.
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<TronEvent> {
        self.tx.subscribe()
    }

    /// Emit an event. Returns the number of active receivers that saw it,
    /// or an error if there are none.
    pub fn emit(&self, event: TronEvent) -> Result<usize, broadcast::error::SendError<TronEvent>> {
        self.tx.send(event)
    }

    /// Number of active subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}
