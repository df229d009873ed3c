use thiserror::Error;

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Result type for broker client calls
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Faults reported by a broker client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    #[error("Queue already exists: {0}")]
    QueueAlreadyExists(String),

    #[error("Message not found in queue {queue}")]
    MessageNotFound { queue: String },

    #[error("Message lock lost or expired in queue {queue}")]
    LockLost { queue: String },

    #[error("Broker transport error: {0}")]
    Transport(String),
}

/// Errors surfaced by the queue adapter and job handles
#[derive(Error, Debug, Clone)]
pub enum QueueError {
    /// Broker faults pass through untouched
    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Job type not registered: {0}")]
    JobTypeNotRegistered(String),

    #[error("Job execution failed: {0}")]
    JobFailed(#[from] JobError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Job has already been deleted or released")]
    AlreadyAcknowledged,
}

impl QueueError {
    /// The underlying broker fault, if this error came from the broker
    pub fn broker_error(&self) -> Option<&BrokerError> {
        match self {
            Self::Broker(err) => Some(err),
            _ => None,
        }
    }
}

/// Job execution outcome - determines whether the message is released or dropped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Retryable error - the message lock is released for redelivery
    #[error("Retryable error: {0}")]
    Retryable(String),

    /// Permanent error - the message is deleted
    #[error("Permanent error: {0}")]
    Permanent(String),
}

impl JobError {
    /// Create a retryable error
    pub fn retryable(msg: impl Into<String>) -> Self {
        Self::Retryable(msg.into())
    }

    /// Create a permanent error
    pub fn permanent(msg: impl Into<String>) -> Self {
        Self::Permanent(msg.into())
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        match self {
            Self::Retryable(msg) | Self::Permanent(msg) => msg,
        }
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
