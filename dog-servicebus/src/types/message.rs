use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LockToken, MessageId};

/// A message as exchanged with the broker.
///
/// The adapter fills in `body`, `message_id`, `content_type` and optionally
/// `scheduled_enqueue_time_utc`. The remaining properties are stamped by the
/// broker on send and receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokeredMessage {
    /// Serialized job payload
    pub body: String,

    /// Message identifier
    pub message_id: Option<MessageId>,

    /// MIME type of the body
    pub content_type: Option<String>,

    /// When the message becomes visible to receivers
    pub scheduled_enqueue_time_utc: Option<DateTime<Utc>>,

    /// How many times the broker has handed this message out
    pub delivery_count: u32,

    /// Broker-assigned ordering number
    pub sequence_number: Option<u64>,

    /// When the broker accepted the message
    pub enqueued_time_utc: Option<DateTime<Utc>>,

    /// Lock token for peek-lock receives
    pub lock_token: Option<LockToken>,

    /// When the current peek-lock expires
    pub locked_until_utc: Option<DateTime<Utc>>,
}

impl BrokeredMessage {
    /// Create a new outgoing message with a fresh message id
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            message_id: Some(MessageId::new()),
            content_type: None,
            scheduled_enqueue_time_utc: None,
            delivery_count: 0,
            sequence_number: None,
            enqueued_time_utc: None,
            lock_token: None,
            locked_until_utc: None,
        }
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Delay visibility until the given instant
    pub fn with_scheduled_enqueue_time_utc(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_enqueue_time_utc = Some(at);
        self
    }

    /// Check whether the message is visible at `now`
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_enqueue_time_utc.map_or(true, |at| at <= now)
    }

    /// Body size in bytes
    pub fn body_size(&self) -> usize {
        self.body.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_message_has_id_and_no_broker_properties() {
        let message = BrokeredMessage::new("{}");
        assert!(message.message_id.is_some());
        assert_eq!(message.delivery_count, 0);
        assert!(message.lock_token.is_none());
        assert!(message.sequence_number.is_none());
    }

    #[test]
    fn test_scheduled_visibility() {
        let now = Utc::now();
        let message = BrokeredMessage::new("{}").with_scheduled_enqueue_time_utc(now + Duration::seconds(30));

        assert!(!message.is_visible_at(now));
        assert!(message.is_visible_at(now + Duration::seconds(30)));
        assert!(BrokeredMessage::new("{}").is_visible_at(now));
    }
}
