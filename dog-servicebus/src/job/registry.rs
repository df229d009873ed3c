use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use async_trait::async_trait;

use crate::{Job, JobError, JobPayload, QueueError, QueueResult};

/// Type-erased job handler for runtime dispatch
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Execute a job from its payload and context
    async fn execute(
        &self,
        payload: &JobPayload,
        context: Arc<dyn Any + Send + Sync>,
    ) -> Result<(), JobError>;

    /// Get the job type this handler processes
    fn job_type(&self) -> &'static str;
}

struct TypedJobHandler<J: Job> {
    _phantom: PhantomData<fn() -> J>,
}

impl<J: Job> TypedJobHandler<J> {
    fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<J: Job> JobHandler for TypedJobHandler<J> {
    async fn execute(
        &self,
        payload: &JobPayload,
        context: Arc<dyn Any + Send + Sync>,
    ) -> Result<(), JobError> {
        let job: J = serde_json::from_value(payload.data.clone())
            .map_err(|e| JobError::Permanent(format!("Failed to deserialize job: {}", e)))?;

        let typed_context = context
            .downcast_ref::<J::Context>()
            .ok_or_else(|| JobError::Permanent("Invalid context type".to_string()))?
            .clone();

        job.handle(typed_context).await
    }

    fn job_type(&self) -> &'static str {
        J::JOB_TYPE
    }
}

/// Registry mapping job names to their handlers
pub struct JobRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobRegistry {
    /// Create a new job registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a typed job
    pub fn register<J: Job>(&mut self) -> QueueResult<()> {
        self.register_handler(Arc::new(TypedJobHandler::<J>::new()))
    }

    /// Register a hand-written handler
    pub fn register_handler(&mut self, handler: Arc<dyn JobHandler>) -> QueueResult<()> {
        let job_type = handler.job_type().to_string();

        if self.handlers.contains_key(&job_type) {
            return Err(QueueError::InvalidConfig(format!("Job type '{}' already registered", job_type)));
        }

        self.handlers.insert(job_type, handler);
        Ok(())
    }

    /// Run the handler registered for the payload's job name
    pub async fn execute(
        &self,
        payload: &JobPayload,
        context: Arc<dyn Any + Send + Sync>,
    ) -> QueueResult<()> {
        let handler = self
            .handlers
            .get(&payload.job)
            .ok_or_else(|| QueueError::JobTypeNotRegistered(payload.job.clone()))?;

        handler.execute(payload, context).await?;
        Ok(())
    }

    /// Check if a job type is registered
    pub fn is_registered(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    /// Get all registered job types
    pub fn registered_types(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
