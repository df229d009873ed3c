pub mod ids;
pub mod message;
pub mod payload;
pub mod queue_info;
pub mod receive;

pub use ids::{LockToken, MessageId};
pub use message::BrokeredMessage;
pub use payload::JobPayload;
pub use queue_info::{QueueInfo, DEFAULT_LOCK_DURATION};
pub use receive::{ReceiveMessageOptions, ReceiveMode};
