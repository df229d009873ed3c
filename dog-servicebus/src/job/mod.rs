pub mod handle;
pub mod registry;

pub use handle::ServiceBusJob;
pub use registry::{JobHandler, JobRegistry};

use crate::JobError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Trait for typed jobs that travel through the queue.
///
/// The serialized value becomes the payload's `data`; `JOB_TYPE` becomes its
/// `job` name and selects the handler on the consuming side.
#[async_trait]
pub trait Job: Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Context type passed to job execution
    type Context: Send + Sync + Clone + 'static;

    /// Job type identifier for dispatch
    const JOB_TYPE: &'static str;

    /// Run the job
    async fn handle(&self, ctx: Self::Context) -> Result<(), JobError>;

    /// Get the job type identifier for dispatch
    fn job_type(&self) -> &'static str {
        Self::JOB_TYPE
    }
}
