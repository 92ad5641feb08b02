use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{JobReceipt, JobRequest, QueueError, QueueJobOptions};

/// Submission side of an external at-least-once job queue.
///
/// Implementations must be safe for concurrent `add` calls; the broker owns
/// retries, ordering and retention once a job is accepted.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Queue name as registered with the broker.
    fn name(&self) -> &str;

    /// Options applied to jobs submitted without their own.
    fn default_options(&self) -> &QueueJobOptions;

    /// Submit a job. `Ok` means the broker accepted it, not that it ran.
    async fn add(&self, job: JobRequest) -> Result<JobReceipt, QueueError>;
}

#[async_trait]
impl<Q: JobQueue + ?Sized> JobQueue for Arc<Q> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn default_options(&self) -> &QueueJobOptions {
        (**self).default_options()
    }

    async fn add(&self, job: JobRequest) -> Result<JobReceipt, QueueError> {
        (**self).add(job).await
    }
}
