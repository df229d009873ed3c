use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default peek-lock duration for new queues
pub const DEFAULT_LOCK_DURATION: Duration = Duration::from_secs(60);

/// Broker-side description of a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueInfo {
    /// Queue name
    pub title: String,

    /// Messages held by the queue (active, scheduled and locked)
    pub message_count: u64,

    /// How long a peek-lock holds a message
    pub lock_duration: Duration,
}

impl QueueInfo {
    /// Describe a queue to be created
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message_count: 0,
            lock_duration: DEFAULT_LOCK_DURATION,
        }
    }

    /// Set the peek-lock duration
    pub fn with_lock_duration(mut self, lock_duration: Duration) -> Self {
        self.lock_duration = lock_duration;
        self
    }
}
