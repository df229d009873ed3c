use std::any::Any;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::{
    broker::ServiceBus, codec::JobCodec, observability::LiveMetrics, BrokeredMessage, JobPayload,
    JobRegistry, LockToken, MessageId, QueueError, QueueResult,
};

/// A peek-locked message handed to the worker loop.
///
/// The lock is held by the broker. Call [`delete`](Self::delete) once the job
/// is done, or [`release`](Self::release) to put it back; otherwise the
/// broker redelivers it when the lock expires.
pub struct ServiceBusJob<B: ServiceBus + ?Sized> {
    service_bus: Arc<B>,
    codec: Arc<dyn JobCodec>,
    metrics: Arc<LiveMetrics>,
    message: BrokeredMessage,
    queue: String,
    deleted: bool,
    released: bool,
}

impl<B: ServiceBus + ?Sized> ServiceBusJob<B> {
    pub(crate) fn new(
        service_bus: Arc<B>,
        codec: Arc<dyn JobCodec>,
        metrics: Arc<LiveMetrics>,
        message: BrokeredMessage,
        queue: String,
    ) -> Self {
        Self {
            service_bus,
            codec,
            metrics,
            message,
            queue,
            deleted: false,
            released: false,
        }
    }

    /// Broker message id
    pub fn job_id(&self) -> Option<&MessageId> {
        self.message.message_id.as_ref()
    }

    /// Undecoded message body
    pub fn raw_body(&self) -> &str {
        &self.message.body
    }

    /// Decode the message body
    pub fn payload(&self) -> QueueResult<JobPayload> {
        self.codec.decode(&self.message.body)
    }

    /// Job name from the payload
    pub fn name(&self) -> QueueResult<String> {
        Ok(self.payload()?.job)
    }

    /// Number of times the broker has delivered this message
    pub fn attempts(&self) -> u32 {
        self.message.delivery_count
    }

    /// Queue the message was received from
    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn lock_token(&self) -> Option<&LockToken> {
        self.message.lock_token.as_ref()
    }

    pub fn locked_until(&self) -> Option<DateTime<Utc>> {
        self.message.locked_until_utc
    }

    /// The received message as reported by the broker
    pub fn message(&self) -> &BrokeredMessage {
        &self.message
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn is_deleted_or_released(&self) -> bool {
        self.deleted || self.released
    }

    /// Complete the message so the broker drops it
    pub async fn delete(&mut self) -> QueueResult<()> {
        if self.is_deleted_or_released() {
            return Err(QueueError::AlreadyAcknowledged);
        }

        self.service_bus.delete_message(&self.queue, &self.message).await?;
        self.deleted = true;
        self.metrics.increment_messages_deleted();

        debug!(queue = %self.queue, message_id = ?self.job_id(), "Deleted message");
        Ok(())
    }

    /// Abandon the lock so the broker redelivers the message
    pub async fn release(&mut self) -> QueueResult<()> {
        if self.is_deleted_or_released() {
            return Err(QueueError::AlreadyAcknowledged);
        }

        self.service_bus.unlock_message(&self.queue, &self.message).await?;
        self.released = true;
        self.metrics.increment_messages_released();

        debug!(queue = %self.queue, message_id = ?self.job_id(), "Released message");
        Ok(())
    }

    /// Run the registered handler for this message.
    ///
    /// Success and permanent failures delete the message, retryable failures
    /// and unknown job names release it. Handler errors are returned after
    /// the acknowledgement, unless the acknowledgement fails. An undecodable
    /// body is deleted.
    pub async fn fire<C>(&mut self, registry: &JobRegistry, context: C) -> QueueResult<()>
    where
        C: Send + Sync + 'static,
    {
        let payload = match self.payload() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(queue = %self.queue, message_id = ?self.job_id(), "Dropping undecodable message: {}", err);
                return self.acknowledge_failure(true, err).await;
            }
        };

        let context: Arc<dyn Any + Send + Sync> = Arc::new(context);
        match registry.execute(&payload, context).await {
            Ok(()) => {
                self.delete().await?;
                Ok(())
            }
            Err(QueueError::JobFailed(err)) if !err.is_retryable() => {
                warn!(job = %payload.job, attempts = self.attempts(), "Job failed permanently: {}", err);
                self.acknowledge_failure(true, QueueError::JobFailed(err)).await
            }
            Err(err) => {
                warn!(job = %payload.job, attempts = self.attempts(), "Job failed, releasing for redelivery: {}", err);
                self.acknowledge_failure(false, err).await
            }
        }
    }

    /// Delete or release after a failed run and hand back the failure.
    ///
    /// When the acknowledgement itself fails, the broker error is returned
    /// and the original failure is kept in the error event.
    async fn acknowledge_failure(&mut self, delete: bool, failure: QueueError) -> QueueResult<()> {
        let acknowledged = if delete {
            self.delete().await
        } else {
            self.release().await
        };

        match acknowledged {
            Ok(()) => Err(failure),
            Err(ack_err) => {
                error!(
                    queue = %self.queue,
                    message_id = ?self.job_id(),
                    job_error = %failure,
                    "Failed to acknowledge message after job failure: {}",
                    ack_err
                );
                Err(ack_err)
            }
        }
    }
}

impl<B: ServiceBus + ?Sized> std::fmt::Debug for ServiceBusJob<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceBusJob")
            .field("queue", &self.queue)
            .field("message", &self.message)
            .field("deleted", &self.deleted)
            .field("released", &self.released)
            .finish()
    }
}
