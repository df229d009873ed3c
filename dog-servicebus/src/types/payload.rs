use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Job descriptor carried in a message body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    /// Job name used for handler dispatch
    pub job: String,

    /// Handler arguments
    #[serde(default)]
    pub data: Value,
}

impl JobPayload {
    pub fn new(job: impl Into<String>, data: Value) -> Self {
        Self {
            job: job.into(),
            data,
        }
    }
}
