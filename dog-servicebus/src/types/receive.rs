use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the broker hands out a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiveMode {
    /// Reserve the message until it is deleted, unlocked or the lock expires
    PeekLock,

    /// Remove the message from the queue as it is received
    ReceiveAndDelete,
}

impl Default for ReceiveMode {
    fn default() -> Self {
        Self::ReceiveAndDelete
    }
}

/// Options for a single receive call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveMessageOptions {
    pub mode: ReceiveMode,

    /// Server-side wait for a message; `None` returns immediately
    pub timeout: Option<Duration>,
}

impl ReceiveMessageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to peek-lock mode
    pub fn peek_lock(mut self) -> Self {
        self.mode = ReceiveMode::PeekLock;
        self
    }

    /// Switch to receive-and-delete mode
    pub fn receive_and_delete(mut self) -> Self {
        self.mode = ReceiveMode::ReceiveAndDelete;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn is_peek_lock(&self) -> bool {
        self.mode == ReceiveMode::PeekLock
    }
}
