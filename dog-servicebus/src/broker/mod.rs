pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;

use crate::{BrokerResult, BrokeredMessage, QueueInfo, ReceiveMessageOptions};

/// Broker client capabilities the queue adapter relies on.
///
/// Implementations wrap a hosted broker's SDK or REST surface. Errors are
/// reported as [`crate::BrokerError`] and reach adapter callers unchanged.
#[async_trait]
pub trait ServiceBus: Send + Sync {
    /// List every queue in the namespace
    async fn list_queues(&self) -> BrokerResult<Vec<QueueInfo>>;

    /// Create a queue; fails with `QueueAlreadyExists` on a duplicate title
    async fn create_queue(&self, info: QueueInfo) -> BrokerResult<QueueInfo>;

    /// Fetch a single queue description, including its message count
    async fn get_queue(&self, name: &str) -> BrokerResult<QueueInfo>;

    /// Send a message to a queue
    async fn send_queue_message(&self, queue: &str, message: BrokeredMessage) -> BrokerResult<()>;

    /// Receive at most one message; `None` when nothing is visible
    async fn receive_queue_message(
        &self,
        queue: &str,
        options: ReceiveMessageOptions,
    ) -> BrokerResult<Option<BrokeredMessage>>;

    /// Complete a peek-locked message, removing it from the queue
    async fn delete_message(&self, queue: &str, message: &BrokeredMessage) -> BrokerResult<()>;

    /// Abandon a peek-lock so the message can be received again
    async fn unlock_message(&self, queue: &str, message: &BrokeredMessage) -> BrokerResult<()>;
}

#[async_trait]
impl<T: ServiceBus + ?Sized> ServiceBus for Arc<T> {
    async fn list_queues(&self) -> BrokerResult<Vec<QueueInfo>> {
        (**self).list_queues().await
    }

    async fn create_queue(&self, info: QueueInfo) -> BrokerResult<QueueInfo> {
        (**self).create_queue(info).await
    }

    async fn get_queue(&self, name: &str) -> BrokerResult<QueueInfo> {
        (**self).get_queue(name).await
    }

    async fn send_queue_message(&self, queue: &str, message: BrokeredMessage) -> BrokerResult<()> {
        (**self).send_queue_message(queue, message).await
    }

    async fn receive_queue_message(
        &self,
        queue: &str,
        options: ReceiveMessageOptions,
    ) -> BrokerResult<Option<BrokeredMessage>> {
        (**self).receive_queue_message(queue, options).await
    }

    async fn delete_message(&self, queue: &str, message: &BrokeredMessage) -> BrokerResult<()> {
        (**self).delete_message(queue, message).await
    }

    async fn unlock_message(&self, queue: &str, message: &BrokeredMessage) -> BrokerResult<()> {
        (**self).unlock_message(queue, message).await
    }
}
