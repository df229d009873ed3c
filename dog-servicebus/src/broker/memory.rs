use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::{
    broker::ServiceBus, BrokerError, BrokerResult, BrokeredMessage, LockToken, MessageId,
    QueueInfo, ReceiveMessageOptions,
};

const RECEIVE_POLL_INTERVAL: Duration = Duration::from_millis(25);

struct MemoryQueue {
    info: QueueInfo,
    messages: VecDeque<BrokeredMessage>,
}

impl MemoryQueue {
    fn new(info: QueueInfo) -> Self {
        Self {
            info,
            messages: VecDeque::new(),
        }
    }

    fn lock_duration(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.info.lock_duration).unwrap_or_else(|_| chrono::Duration::seconds(60))
    }

    fn position_of_locked(&self, message: &BrokeredMessage) -> Option<usize> {
        let token = message.lock_token.as_ref()?;
        self.messages
            .iter()
            .position(|held| held.lock_token.as_ref() == Some(token))
    }
}

fn is_receivable(message: &BrokeredMessage, now: DateTime<Utc>) -> bool {
    let unlocked = match message.locked_until_utc {
        Some(until) => until <= now,
        None => true,
    };
    unlocked && message.is_visible_at(now)
}

/// Per-operation call counters, for asserting how the adapter talks to the broker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list_queues: u64,
    pub create_queue: u64,
    pub get_queue: u64,
    pub send: u64,
    pub receive: u64,
    pub delete: u64,
    pub unlock: u64,
}

#[derive(Default)]
struct CallCounters {
    list_queues: AtomicU64,
    create_queue: AtomicU64,
    get_queue: AtomicU64,
    send: AtomicU64,
    receive: AtomicU64,
    delete: AtomicU64,
    unlock: AtomicU64,
}

impl CallCounters {
    fn snapshot(&self) -> CallCounts {
        CallCounts {
            list_queues: self.list_queues.load(Ordering::Relaxed),
            create_queue: self.create_queue.load(Ordering::Relaxed),
            get_queue: self.get_queue.load(Ordering::Relaxed),
            send: self.send.load(Ordering::Relaxed),
            receive: self.receive.load(Ordering::Relaxed),
            delete: self.delete.load(Ordering::Relaxed),
            unlock: self.unlock.load(Ordering::Relaxed),
        }
    }
}

/// In-memory broker for testing and development.
///
/// Mirrors the hosted broker's observable behavior: scheduled visibility,
/// peek-lock with expiry, and duplicate-queue conflicts.
pub struct MemoryServiceBus {
    /// Queues keyed by title
    queues: RwLock<BTreeMap<String, MemoryQueue>>,

    next_sequence: AtomicU64,

    calls: CallCounters,
}

impl MemoryServiceBus {
    pub fn new() -> Self {
        Self {
            queues: RwLock::new(BTreeMap::new()),
            next_sequence: AtomicU64::new(1),
            calls: CallCounters::default(),
        }
    }

    /// Snapshot of how many times each broker operation was called
    pub fn calls(&self) -> CallCounts {
        self.calls.snapshot()
    }

    /// Copies of every message held by a queue, in send order, without locking them
    pub fn peek_messages(&self, queue: &str) -> BrokerResult<Vec<BrokeredMessage>> {
        let queues = self.queues.read();
        let queue_state = queues
            .get(queue)
            .ok_or_else(|| BrokerError::QueueNotFound(queue.to_string()))?;

        Ok(queue_state.messages.iter().cloned().collect())
    }

    /// Expire every held lock in a queue, as if the lock duration had elapsed
    pub fn force_lock_expiry(&self, queue: &str) -> BrokerResult<()> {
        let mut queues = self.queues.write();
        let queue_state = queues
            .get_mut(queue)
            .ok_or_else(|| BrokerError::QueueNotFound(queue.to_string()))?;

        let expired = Utc::now() - chrono::Duration::seconds(1);
        for message in queue_state.messages.iter_mut() {
            if message.locked_until_utc.is_some() {
                message.locked_until_utc = Some(expired);
            }
        }
        Ok(())
    }

    /// Make every scheduled message in a queue visible now
    pub fn force_schedule_elapsed(&self, queue: &str) -> BrokerResult<()> {
        let mut queues = self.queues.write();
        let queue_state = queues
            .get_mut(queue)
            .ok_or_else(|| BrokerError::QueueNotFound(queue.to_string()))?;

        let elapsed = Utc::now() - chrono::Duration::seconds(1);
        for message in queue_state.messages.iter_mut() {
            if message.scheduled_enqueue_time_utc.is_some() {
                message.scheduled_enqueue_time_utc = Some(elapsed);
            }
        }
        Ok(())
    }

    fn try_receive(&self, queue: &str, options: &ReceiveMessageOptions) -> BrokerResult<Option<BrokeredMessage>> {
        let now = Utc::now();
        let mut queues = self.queues.write();
        let queue_state = queues
            .get_mut(queue)
            .ok_or_else(|| BrokerError::QueueNotFound(queue.to_string()))?;

        let index = match queue_state.messages.iter().position(|m| is_receivable(m, now)) {
            Some(index) => index,
            None => return Ok(None),
        };

        if options.is_peek_lock() {
            let lock_until = now + queue_state.lock_duration();
            let message = &mut queue_state.messages[index];
            message.delivery_count += 1;
            message.lock_token = Some(LockToken::new());
            message.locked_until_utc = Some(lock_until);
            Ok(Some(message.clone()))
        } else {
            let mut message = match queue_state.messages.remove(index) {
                Some(message) => message,
                None => return Ok(None),
            };
            message.delivery_count += 1;
            message.lock_token = None;
            message.locked_until_utc = None;
            Ok(Some(message))
        }
    }

    /// Locate a message by its live lock token
    fn with_locked_message<F>(&self, queue: &str, message: &BrokeredMessage, f: F) -> BrokerResult<()>
    where
        F: FnOnce(&mut MemoryQueue, usize),
    {
        let now = Utc::now();
        let mut queues = self.queues.write();
        let queue_state = queues
            .get_mut(queue)
            .ok_or_else(|| BrokerError::QueueNotFound(queue.to_string()))?;

        let lock_lost = || BrokerError::LockLost { queue: queue.to_string() };
        let index = queue_state.position_of_locked(message).ok_or_else(lock_lost)?;

        let locked_until = queue_state.messages[index].locked_until_utc;
        match locked_until {
            Some(until) if until > now => {
                f(queue_state, index);
                Ok(())
            }
            _ => Err(lock_lost()),
        }
    }
}

#[async_trait]
impl ServiceBus for MemoryServiceBus {
    async fn list_queues(&self) -> BrokerResult<Vec<QueueInfo>> {
        self.calls.list_queues.fetch_add(1, Ordering::Relaxed);

        let queues = self.queues.read();
        Ok(queues
            .values()
            .map(|q| QueueInfo {
                message_count: q.messages.len() as u64,
                ..q.info.clone()
            })
            .collect())
    }

    async fn create_queue(&self, info: QueueInfo) -> BrokerResult<QueueInfo> {
        self.calls.create_queue.fetch_add(1, Ordering::Relaxed);

        let mut queues = self.queues.write();
        if queues.contains_key(&info.title) {
            return Err(BrokerError::QueueAlreadyExists(info.title));
        }

        let created = QueueInfo {
            message_count: 0,
            ..info
        };
        queues.insert(created.title.clone(), MemoryQueue::new(created.clone()));
        Ok(created)
    }

    async fn get_queue(&self, name: &str) -> BrokerResult<QueueInfo> {
        self.calls.get_queue.fetch_add(1, Ordering::Relaxed);

        let queues = self.queues.read();
        let queue_state = queues
            .get(name)
            .ok_or_else(|| BrokerError::QueueNotFound(name.to_string()))?;

        Ok(QueueInfo {
            message_count: queue_state.messages.len() as u64,
            ..queue_state.info.clone()
        })
    }

    async fn send_queue_message(&self, queue: &str, mut message: BrokeredMessage) -> BrokerResult<()> {
        self.calls.send.fetch_add(1, Ordering::Relaxed);

        let mut queues = self.queues.write();
        let queue_state = queues
            .get_mut(queue)
            .ok_or_else(|| BrokerError::QueueNotFound(queue.to_string()))?;

        if message.message_id.is_none() {
            message.message_id = Some(MessageId::new());
        }
        message.sequence_number = Some(self.next_sequence.fetch_add(1, Ordering::Relaxed));
        message.enqueued_time_utc = Some(Utc::now());
        message.delivery_count = 0;
        message.lock_token = None;
        message.locked_until_utc = None;

        queue_state.messages.push_back(message);
        Ok(())
    }

    async fn receive_queue_message(
        &self,
        queue: &str,
        options: ReceiveMessageOptions,
    ) -> BrokerResult<Option<BrokeredMessage>> {
        self.calls.receive.fetch_add(1, Ordering::Relaxed);

        let deadline = options.timeout.map(|timeout| tokio::time::Instant::now() + timeout);
        loop {
            if let Some(message) = self.try_receive(queue, &options)? {
                return Ok(Some(message));
            }

            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(tokio::time::Instant::now()),
                None => return Ok(None),
            };
            if remaining.is_zero() {
                return Ok(None);
            }
            tokio::time::sleep(remaining.min(RECEIVE_POLL_INTERVAL)).await;
        }
    }

    async fn delete_message(&self, queue: &str, message: &BrokeredMessage) -> BrokerResult<()> {
        self.calls.delete.fetch_add(1, Ordering::Relaxed);

        self.with_locked_message(queue, message, |queue_state, index| {
            queue_state.messages.remove(index);
        })
    }

    async fn unlock_message(&self, queue: &str, message: &BrokeredMessage) -> BrokerResult<()> {
        self.calls.unlock.fetch_add(1, Ordering::Relaxed);

        self.with_locked_message(queue, message, |queue_state, index| {
            let held = &mut queue_state.messages[index];
            held.lock_token = None;
            held.locked_until_utc = None;
        })
    }
}

impl Default for MemoryServiceBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn bus_with_queue(name: &str) -> MemoryServiceBus {
        let bus = MemoryServiceBus::new();
        bus.create_queue(QueueInfo::new(name)).await.unwrap();
        bus
    }

    #[tokio::test]
    async fn test_duplicate_queue_conflicts() {
        let bus = bus_with_queue("default").await;

        let result = bus.create_queue(QueueInfo::new("default")).await;
        assert_eq!(result, Err(BrokerError::QueueAlreadyExists("default".to_string())));
        assert_eq!(bus.list_queues().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_send_to_missing_queue() {
        let bus = MemoryServiceBus::new();

        let result = bus.send_queue_message("nope", BrokeredMessage::new("{}")).await;
        assert_eq!(result, Err(BrokerError::QueueNotFound("nope".to_string())));
    }

    #[tokio::test]
    async fn test_peek_lock_hides_message_until_unlocked() {
        let bus = bus_with_queue("default").await;
        bus.send_queue_message("default", BrokeredMessage::new("a")).await.unwrap();

        let options = ReceiveMessageOptions::new().peek_lock();
        let first = bus.receive_queue_message("default", options.clone()).await.unwrap().unwrap();
        assert_eq!(first.delivery_count, 1);
        assert!(first.lock_token.is_some());
        assert!(first.locked_until_utc.unwrap() > Utc::now());

        // Locked messages still count toward the queue size
        assert!(bus.receive_queue_message("default", options.clone()).await.unwrap().is_none());
        assert_eq!(bus.get_queue("default").await.unwrap().message_count, 1);

        bus.unlock_message("default", &first).await.unwrap();
        let second = bus.receive_queue_message("default", options).await.unwrap().unwrap();
        assert_eq!(second.message_id, first.message_id);
        assert_eq!(second.delivery_count, 2);
        assert_ne!(second.lock_token, first.lock_token);
    }

    #[tokio::test]
    async fn test_delete_requires_live_lock() {
        let bus = bus_with_queue("default").await;
        bus.send_queue_message("default", BrokeredMessage::new("a")).await.unwrap();

        let options = ReceiveMessageOptions::new().peek_lock();
        let received = bus.receive_queue_message("default", options).await.unwrap().unwrap();
        bus.force_lock_expiry("default").unwrap();

        let result = bus.delete_message("default", &received).await;
        assert_eq!(result, Err(BrokerError::LockLost { queue: "default".to_string() }));
        assert_eq!(bus.get_queue("default").await.unwrap().message_count, 1);
    }

    #[tokio::test]
    async fn test_receive_and_delete_removes_message() {
        let bus = bus_with_queue("default").await;
        bus.send_queue_message("default", BrokeredMessage::new("a")).await.unwrap();

        let received = bus
            .receive_queue_message("default", ReceiveMessageOptions::new().receive_and_delete())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(received.body, "a");
        assert!(received.lock_token.is_none());
        assert_eq!(bus.get_queue("default").await.unwrap().message_count, 0);
    }

    #[tokio::test]
    async fn test_scheduled_message_is_counted_but_not_received() {
        let bus = bus_with_queue("default").await;
        let message = BrokeredMessage::new("later")
            .with_scheduled_enqueue_time_utc(Utc::now() + chrono::Duration::seconds(600));
        bus.send_queue_message("default", message).await.unwrap();

        let options = ReceiveMessageOptions::new().peek_lock();
        assert!(bus.receive_queue_message("default", options).await.unwrap().is_none());
        assert_eq!(bus.get_queue("default").await.unwrap().message_count, 1);
    }

    #[tokio::test]
    async fn test_force_schedule_elapsed_makes_message_visible() {
        let bus = bus_with_queue("default").await;
        let message = BrokeredMessage::new("later")
            .with_scheduled_enqueue_time_utc(Utc::now() + chrono::Duration::seconds(600));
        bus.send_queue_message("default", message).await.unwrap();

        bus.force_schedule_elapsed("default").unwrap();

        let options = ReceiveMessageOptions::new().peek_lock();
        let received = bus.receive_queue_message("default", options).await.unwrap();
        assert_eq!(received.map(|m| m.body), Some("later".to_string()));
    }

    #[tokio::test]
    async fn test_receive_waits_up_to_timeout() {
        let bus = bus_with_queue("default").await;
        let message = BrokeredMessage::new("soon")
            .with_scheduled_enqueue_time_utc(Utc::now() + chrono::Duration::milliseconds(50));
        bus.send_queue_message("default", message).await.unwrap();

        let options = ReceiveMessageOptions::new()
            .peek_lock()
            .with_timeout(Duration::from_secs(2));
        let received = bus.receive_queue_message("default", options).await.unwrap();
        assert_eq!(received.map(|m| m.body), Some("soon".to_string()));
    }

    #[tokio::test]
    async fn test_fifo_by_sequence() {
        let bus = bus_with_queue("default").await;
        for body in ["one", "two", "three"] {
            bus.send_queue_message("default", BrokeredMessage::new(body)).await.unwrap();
        }

        let options = ReceiveMessageOptions::new().receive_and_delete();
        let mut bodies = Vec::new();
        while let Some(message) = bus.receive_queue_message("default", options.clone()).await.unwrap() {
            bodies.push(message.body);
        }
        assert_eq!(bodies, vec!["one", "two", "three"]);
    }
}
