use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::{
    broker::ServiceBus,
    codec::{json::JsonCodec, JobCodec},
    contract::Queue,
    observability::LiveMetrics,
    BrokerError, BrokeredMessage, Job, JobPayload, MessageId, QueueConfig, QueueCreation,
    QueueError, QueueInfo, QueueResult, ReceiveMessageOptions, ServiceBusJob,
};

/// Queue driver that forwards job-queue operations to a Service Bus broker
pub struct ServiceBusQueue<B: ServiceBus> {
    service_bus: Arc<B>,
    codec: Arc<dyn JobCodec>,
    metrics: Arc<LiveMetrics>,
    config: QueueConfig,
    /// Queue names already created or confirmed under `CreateIfAbsent`
    ensured_queues: Arc<RwLock<HashSet<String>>>,
}

impl<B: ServiceBus + 'static> ServiceBusQueue<B> {
    /// Create an adapter with the default configuration
    pub fn new(service_bus: B) -> Self {
        Self::with_config(service_bus, QueueConfig::default())
    }

    /// Create an adapter with a custom configuration
    pub fn with_config(service_bus: B, config: QueueConfig) -> Self {
        Self {
            service_bus: Arc::new(service_bus),
            codec: Arc::new(JsonCodec),
            metrics: Arc::new(LiveMetrics::new()),
            config,
            ensured_queues: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Create an adapter and make sure the default queue exists
    pub async fn connect(service_bus: B, config: QueueConfig) -> QueueResult<Self> {
        config.validate()?;
        let queue = Self::with_config(service_bus, config);
        queue.get_queue(None).await?;
        Ok(queue)
    }

    /// Replace the payload codec
    pub fn with_codec<C: JobCodec + 'static>(mut self, codec: C) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Push a job by name with its data
    #[instrument(skip(self, data))]
    pub async fn push(&self, job: &str, data: Value, queue: Option<&str>) -> QueueResult<MessageId> {
        let payload = self.create_payload(job, data)?;
        self.push_raw(payload, queue).await
    }

    /// Push an already serialized payload
    #[instrument(skip(self, payload))]
    pub async fn push_raw(&self, payload: String, queue: Option<&str>) -> QueueResult<MessageId> {
        let message = BrokeredMessage::new(payload).with_content_type(self.codec.content_type());
        self.send(queue, message).await
    }

    /// Push a job that becomes visible `delay` from now
    #[instrument(skip(self, data))]
    pub async fn later(
        &self,
        delay: Duration,
        job: &str,
        data: Value,
        queue: Option<&str>,
    ) -> QueueResult<MessageId> {
        let payload = self.create_payload(job, data)?;
        self.later_raw(delay, payload, queue).await
    }

    /// Push a serialized payload that becomes visible `delay` from now
    #[instrument(skip(self, payload))]
    pub async fn later_raw(
        &self,
        delay: Duration,
        payload: String,
        queue: Option<&str>,
    ) -> QueueResult<MessageId> {
        let out_of_range = || QueueError::InvalidConfig(format!("Delay out of range: {:?}", delay));
        let release_at = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|delay| Utc::now().checked_add_signed(delay))
            .ok_or_else(out_of_range)?;

        let message = BrokeredMessage::new(payload)
            .with_content_type(self.codec.content_type())
            .with_scheduled_enqueue_time_utc(release_at);

        let message_id = self.send(queue, message).await?;
        self.metrics.increment_messages_scheduled();
        debug!(%message_id, %release_at, "Scheduled message");
        Ok(message_id)
    }

    /// Push a typed job
    pub async fn dispatch<J: Job>(&self, job: &J, queue: Option<&str>) -> QueueResult<MessageId> {
        self.push(job.job_type(), serde_json::to_value(job)?, queue).await
    }

    /// Push a typed job that becomes visible `delay` from now
    pub async fn dispatch_later<J: Job>(
        &self,
        delay: Duration,
        job: &J,
        queue: Option<&str>,
    ) -> QueueResult<MessageId> {
        self.later(delay, job.job_type(), serde_json::to_value(job)?, queue).await
    }

    /// Receive the next visible message under a peek-lock
    #[instrument(skip(self))]
    pub async fn pop(&self, queue: Option<&str>) -> QueueResult<Option<ServiceBusJob<B>>> {
        let queue = self.get_queue(queue).await?;

        let mut options = ReceiveMessageOptions::new().peek_lock();
        if let Some(timeout) = self.config.receive_timeout {
            options = options.with_timeout(timeout);
        }

        match self.service_bus.receive_queue_message(&queue, options).await? {
            Some(message) => {
                self.metrics.increment_messages_received();
                debug!(%queue, message_id = ?message.message_id, attempts = message.delivery_count, "Received message");
                Ok(Some(ServiceBusJob::new(
                    self.service_bus.clone(),
                    self.codec.clone(),
                    self.metrics.clone(),
                    message,
                    queue,
                )))
            }
            None => {
                self.metrics.increment_empty_receives();
                Ok(None)
            }
        }
    }

    /// Broker-reported message count for the queue
    #[instrument(skip(self))]
    pub async fn size(&self, queue: Option<&str>) -> QueueResult<u64> {
        let queue = self.get_queue(queue).await?;
        let info = self.service_bus.get_queue(&queue).await?;
        Ok(info.message_count)
    }

    /// Resolve the effective queue name and make sure the queue exists
    pub async fn get_queue(&self, queue: Option<&str>) -> QueueResult<String> {
        let name = self.resolve_queue(queue);

        match self.config.queue_creation {
            QueueCreation::Disabled => {}
            QueueCreation::CreateIfAbsent => {
                let known = self.ensured_queues.read().contains(&name);
                if !known {
                    self.create_queue(&name).await?;
                    self.ensured_queues.write().insert(name.clone());
                }
            }
            QueueCreation::ListThenCreate => {
                let exists = self
                    .service_bus
                    .list_queues()
                    .await?
                    .iter()
                    .any(|info| info.title == name);
                if !exists {
                    self.create_queue(&name).await?;
                }
            }
        }

        Ok(name)
    }

    /// Queue name an operation targets, without touching the broker
    pub fn resolve_queue(&self, queue: Option<&str>) -> String {
        match queue {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.config.default_queue.clone(),
        }
    }

    /// Get the underlying broker client
    pub fn service_bus(&self) -> &B {
        &self.service_bus
    }

    /// Get configuration
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Get traffic counters
    pub fn metrics(&self) -> &LiveMetrics {
        &self.metrics
    }

    fn create_payload(&self, job: &str, data: Value) -> QueueResult<String> {
        self.codec.encode(&JobPayload::new(job, data))
    }

    async fn send(&self, queue: Option<&str>, mut message: BrokeredMessage) -> QueueResult<MessageId> {
        let queue = self.get_queue(queue).await?;
        let message_id = message.message_id.get_or_insert_with(MessageId::new).clone();

        self.service_bus.send_queue_message(&queue, message).await?;
        self.metrics.increment_messages_sent();

        debug!(%queue, %message_id, codec = self.codec.codec_id(), "Sent message");
        Ok(message_id)
    }

    /// Create a queue, tolerating a concurrent creator
    async fn create_queue(&self, name: &str) -> QueueResult<()> {
        let info = QueueInfo::new(name).with_lock_duration(self.config.lock_duration);

        match self.service_bus.create_queue(info).await {
            Ok(_) => {
                self.metrics.increment_queues_created();
                info!(queue = %name, "Created queue");
                Ok(())
            }
            Err(BrokerError::QueueAlreadyExists(_)) => {
                debug!(queue = %name, "Queue already exists");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl<B: ServiceBus> Clone for ServiceBusQueue<B> {
    fn clone(&self) -> Self {
        Self {
            service_bus: self.service_bus.clone(),
            codec: self.codec.clone(),
            metrics: self.metrics.clone(),
            config: self.config.clone(),
            ensured_queues: self.ensured_queues.clone(),
        }
    }
}

#[async_trait]
impl<B: ServiceBus + 'static> Queue for ServiceBusQueue<B> {
    type Job = ServiceBusJob<B>;

    async fn push(&self, job: &str, data: Value, queue: Option<&str>) -> QueueResult<MessageId> {
        ServiceBusQueue::push(self, job, data, queue).await
    }

    async fn push_raw(&self, payload: String, queue: Option<&str>) -> QueueResult<MessageId> {
        ServiceBusQueue::push_raw(self, payload, queue).await
    }

    async fn later(
        &self,
        delay: Duration,
        job: &str,
        data: Value,
        queue: Option<&str>,
    ) -> QueueResult<MessageId> {
        ServiceBusQueue::later(self, delay, job, data, queue).await
    }

    async fn pop(&self, queue: Option<&str>) -> QueueResult<Option<Self::Job>> {
        ServiceBusQueue::pop(self, queue).await
    }

    async fn size(&self, queue: Option<&str>) -> QueueResult<u64> {
        ServiceBusQueue::size(self, queue).await
    }
}
