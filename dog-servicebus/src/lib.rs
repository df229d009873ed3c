//! # dog-servicebus: Service Bus queue driver
//!
//! Plugs a hosted message broker into the DogRS job-queue contract.
//! Four operations are translated into broker calls:
//!
//! - **push / push_raw**: send a brokered message
//! - **later**: send with a scheduled enqueue time (`now + delay`, UTC)
//! - **pop**: receive one message under a peek-lock
//! - **size**: broker-reported message count
//!
//! Queues are created on first use according to [`QueueCreation`].
//! Delivery guarantees, lock expiry and redelivery stay with the broker.
//!
//! ## Quick start
//!
//! ```rust
//! use dog_servicebus::prelude::*;
//! use dog_servicebus::broker::memory::MemoryServiceBus;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let queue = ServiceBusQueue::connect(
//!     MemoryServiceBus::new(),
//!     QueueConfig::new().with_default_queue("emails"),
//! )
//! .await?;
//!
//! queue.push("SendWelcomeEmail", json!({"user_id": 42}), None).await?;
//! assert_eq!(queue.size(None).await?, 1);
//!
//! if let Some(mut job) = queue.pop(None).await? {
//!     assert_eq!(job.name()?, "SendWelcomeEmail");
//!     job.delete().await?;
//! }
//! # Ok::<(), QueueError>(())
//! # }).unwrap();
//! ```

pub mod adapter;
pub mod broker;
pub mod codec;
pub mod config;
pub mod contract;
pub mod error;
pub mod job;
pub mod observability;
pub mod types;

pub use adapter::ServiceBusQueue;
pub use broker::ServiceBus;
pub use codec::{json::JsonCodec, JobCodec};
pub use config::{QueueConfig, QueueCreation};
pub use contract::Queue;
pub use error::{BrokerError, BrokerResult, JobError, QueueError, QueueResult};
pub use job::{Job, JobRegistry, ServiceBusJob};
pub use observability::{LiveMetrics, MetricsSnapshot};
pub use types::{
    BrokeredMessage, JobPayload, LockToken, MessageId, QueueInfo, ReceiveMessageOptions,
    ReceiveMode, DEFAULT_LOCK_DURATION,
};

#[cfg(feature = "tracing-basic")]
pub use observability::init_tracing;

/// Common imports for queue producers and workers
pub mod prelude {
    pub use crate::{
        Job, JobError, JobRegistry, Queue, QueueConfig, QueueCreation, QueueError, QueueResult,
        ServiceBus, ServiceBusJob, ServiceBusQueue,
    };

    pub use async_trait::async_trait;
}
