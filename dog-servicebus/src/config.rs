use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::{QueueError, QueueResult, DEFAULT_LOCK_DURATION};

/// How the adapter makes sure a queue exists before using it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueCreation {
    /// Create each queue once per adapter, treating "already exists" as success
    CreateIfAbsent,

    /// List all queues before every operation and create the queue when missing
    ListThenCreate,

    /// Never create queues; a missing queue is a broker error
    Disabled,
}

impl Default for QueueCreation {
    fn default() -> Self {
        Self::CreateIfAbsent
    }
}

impl QueueCreation {
    pub fn name(self) -> &'static str {
        match self {
            Self::CreateIfAbsent => "create_if_absent",
            Self::ListThenCreate => "list_then_create",
            Self::Disabled => "disabled",
        }
    }
}

impl std::fmt::Display for QueueCreation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for QueueCreation {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create_if_absent" => Ok(Self::CreateIfAbsent),
            "list_then_create" => Ok(Self::ListThenCreate),
            "disabled" | "off" => Ok(Self::Disabled),
            _ => Err(QueueError::InvalidConfig(format!("Invalid queue creation policy: {}", s))),
        }
    }
}

/// Configuration for the Service Bus queue adapter
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Queue used when an operation names none
    pub default_queue: String,

    /// Queue existence policy
    pub queue_creation: QueueCreation,

    /// Server-side wait passed to receive calls; `None` returns immediately
    pub receive_timeout: Option<Duration>,

    /// Peek-lock duration for queues the adapter creates
    pub lock_duration: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            default_queue: "default".to_string(),
            queue_creation: QueueCreation::default(),
            receive_timeout: None,
            lock_duration: DEFAULT_LOCK_DURATION,
        }
    }
}

impl QueueConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default queue name
    pub fn with_default_queue<S: Into<String>>(mut self, name: S) -> Self {
        self.default_queue = name.into();
        self
    }

    /// Set the queue existence policy
    pub fn with_queue_creation(mut self, policy: QueueCreation) -> Self {
        self.queue_creation = policy;
        self
    }

    /// Wait up to `timeout` for a message on pop
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = Some(timeout);
        self
    }

    /// Set the lock duration for created queues
    pub fn with_lock_duration(mut self, lock_duration: Duration) -> Self {
        self.lock_duration = lock_duration;
        self
    }

    /// Load configuration from environment variables sharing `prefix`.
    ///
    /// Recognized keys: `DEFAULT_QUEUE`, `QUEUE_CREATION`,
    /// `RECEIVE_TIMEOUT_SECS`, `LOCK_DURATION_SECS`. Unset keys keep defaults.
    ///
    /// ```bash
    /// export DOG_SERVICEBUS__DEFAULT_QUEUE=emails
    /// export DOG_SERVICEBUS__QUEUE_CREATION=disabled
    /// ```
    pub fn from_env(prefix: &str) -> QueueResult<Self> {
        Self::from_lookup(|key| env::var(format!("{}{}", prefix, key)).ok())
    }

    fn from_lookup<F>(lookup: F) -> QueueResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup("DEFAULT_QUEUE") {
            config.default_queue = name;
        }
        if let Some(policy) = lookup("QUEUE_CREATION") {
            config.queue_creation = policy.parse()?;
        }
        if let Some(secs) = lookup("RECEIVE_TIMEOUT_SECS") {
            config.receive_timeout = Some(parse_secs("RECEIVE_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = lookup("LOCK_DURATION_SECS") {
            config.lock_duration = parse_secs("LOCK_DURATION_SECS", &secs)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the broker would refuse
    pub fn validate(&self) -> QueueResult<()> {
        if self.default_queue.trim().is_empty() {
            return Err(QueueError::InvalidConfig("Default queue name must not be empty".to_string()));
        }
        if self.lock_duration.is_zero() {
            return Err(QueueError::InvalidConfig("Lock duration must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> QueueResult<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| QueueError::InvalidConfig(format!("{} must be a whole number of seconds, got '{}'", key, value)))
}
