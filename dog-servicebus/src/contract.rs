use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::{MessageId, QueueResult};

/// The job-queue contract a host application programs against.
///
/// `queue: None` always means the implementation's default queue.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Handle returned by [`pop`](Self::pop)
    type Job: Send;

    /// Push a job by name with its data
    async fn push(&self, job: &str, data: Value, queue: Option<&str>) -> QueueResult<MessageId>;

    /// Push an already serialized payload
    async fn push_raw(&self, payload: String, queue: Option<&str>) -> QueueResult<MessageId>;

    /// Push a job that becomes visible after `delay`
    async fn later(
        &self,
        delay: Duration,
        job: &str,
        data: Value,
        queue: Option<&str>,
    ) -> QueueResult<MessageId>;

    /// Take the next visible job, if any
    async fn pop(&self, queue: Option<&str>) -> QueueResult<Option<Self::Job>>;

    /// Number of messages held by the queue
    async fn size(&self, queue: Option<&str>) -> QueueResult<u64>;
}
