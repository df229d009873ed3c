pub mod json;

use crate::{JobPayload, QueueResult};

/// Trait for job payload codecs
pub trait JobCodec: Send + Sync {
    /// Encode a payload into a message body
    fn encode(&self, payload: &JobPayload) -> QueueResult<String>;

    /// Decode a message body into a payload
    fn decode(&self, body: &str) -> QueueResult<JobPayload>;

    /// Get codec identifier
    fn codec_id(&self) -> &'static str;

    /// MIME type stamped on outgoing messages
    fn content_type(&self) -> &'static str;
}
