use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters for queue adapter traffic
#[derive(Debug, Default)]
pub struct LiveMetrics {
    messages_sent: AtomicU64,
    messages_scheduled: AtomicU64,
    messages_received: AtomicU64,
    empty_receives: AtomicU64,
    messages_deleted: AtomicU64,
    messages_released: AtomicU64,
    queues_created: AtomicU64,
}

impl LiveMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_messages_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_messages_scheduled(&self) {
        self.messages_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_messages_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_empty_receives(&self) {
        self.empty_receives.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_messages_deleted(&self) {
        self.messages_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_messages_released(&self) {
        self.messages_released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queues_created(&self) {
        self.queues_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Messages sent, scheduled ones included
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    pub fn messages_scheduled(&self) -> u64 {
        self.messages_scheduled.load(Ordering::Relaxed)
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    pub fn empty_receives(&self) -> u64 {
        self.empty_receives.load(Ordering::Relaxed)
    }

    pub fn messages_deleted(&self) -> u64 {
        self.messages_deleted.load(Ordering::Relaxed)
    }

    pub fn messages_released(&self) -> u64 {
        self.messages_released.load(Ordering::Relaxed)
    }

    pub fn queues_created(&self) -> u64 {
        self.queues_created.load(Ordering::Relaxed)
    }

    /// Take a point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_sent: self.messages_sent(),
            messages_scheduled: self.messages_scheduled(),
            messages_received: self.messages_received(),
            empty_receives: self.empty_receives(),
            messages_deleted: self.messages_deleted(),
            messages_released: self.messages_released(),
            queues_created: self.queues_created(),
        }
    }
}

/// Plain copy of [`LiveMetrics`] counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub messages_sent: u64,
    pub messages_scheduled: u64,
    pub messages_received: u64,
    pub empty_receives: u64,
    pub messages_deleted: u64,
    pub messages_released: u64,
    pub queues_created: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = LiveMetrics::new();
        metrics.increment_messages_sent();
        metrics.increment_messages_sent();
        metrics.increment_messages_scheduled();
        metrics.increment_empty_receives();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.messages_sent, 2);
        assert_eq!(snapshot.messages_scheduled, 1);
        assert_eq!(snapshot.empty_receives, 1);
        assert_eq!(snapshot.messages_received, 0);
    }
}
