use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use seek_queue::{JobQueue, JobReceipt, JobRequest};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::idempotency::{floor_to_seconds, metrics_job_key, UNPARSED_TIME_FIELD};
use crate::types::{job_options, MetricsError, MetricsEvent, SEARCH_EVENT_JOB};

/// Publishes one job per completed search to the metrics queue.
pub struct MetricsEventPublisher {
    queue: Arc<dyn JobQueue>,
}

impl MetricsEventPublisher {
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &Arc<dyn JobQueue> {
        &self.queue
    }

    /// Submit the event under its idempotency key.
    ///
    /// An unparsable timestamp is logged and the event is still submitted,
    /// keyed on a placeholder time field.
    pub async fn try_publish(&self, event: &MetricsEvent) -> Result<JobReceipt, MetricsError> {
        if let Err(err) = floor_to_seconds(&event.timestamp) {
            warn!(
                request_id = %event.request_id,
                error = %err,
                time_field = UNPARSED_TIME_FIELD,
                "search metrics timestamp unparsable"
            );
        }

        let key = metrics_job_key(event);
        let job = JobRequest::new(SEARCH_EVENT_JOB, event)?
            .with_job_id(key.into_string())
            .with_options(job_options());
        Ok(self.queue.add(job).await?)
    }

    /// Publish search metrics. Failures, including a panicking broker
    /// client, are logged and swallowed; callers get no delivery confirmation.
    pub async fn publish_search_metrics(&self, event: MetricsEvent) {
        let outcome = AssertUnwindSafe(self.try_publish(&event))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(receipt)) => {
                debug!(
                    query = %event.query,
                    request_id = %event.request_id,
                    job_id = %receipt.job_id,
                    deduplicated = receipt.deduplicated,
                    "published search metrics"
                );
            }
            Ok(Err(err)) => {
                error!(
                    request_id = %event.request_id,
                    error = %err,
                    "failed to publish search metrics"
                );
            }
            Err(_) => {
                error!(
                    request_id = %event.request_id,
                    "queue client panicked while publishing search metrics"
                );
            }
        }
    }

    /// Publish on a detached task and return at once.
    pub fn dispatch(self: &Arc<Self>, event: MetricsEvent) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.publish_search_metrics(event).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idempotency::derive_key;
    use crate::types::{MetricsHit, METRICS_QUEUE};
    use async_trait::async_trait;
    use seek_queue::{InMemoryJobQueue, QueueError, QueueJobOptions};
    use std::time::Duration;

    /// A broker client that panics on submit.
    struct PanickingQueue(QueueJobOptions);

    #[async_trait]
    impl JobQueue for PanickingQueue {
        fn name(&self) -> &str {
            "panicking"
        }

        fn default_options(&self) -> &QueueJobOptions {
            &self.0
        }

        async fn add(&self, _job: JobRequest) -> Result<JobReceipt, QueueError> {
            panic!("broker client bug");
        }
    }

    /// A broker that never answers.
    struct HangingQueue(QueueJobOptions);

    #[async_trait]
    impl JobQueue for HangingQueue {
        fn name(&self) -> &str {
            "hanging"
        }

        fn default_options(&self) -> &QueueJobOptions {
            &self.0
        }

        async fn add(&self, _job: JobRequest) -> Result<JobReceipt, QueueError> {
            std::future::pending().await
        }
    }

    fn metrics_queue() -> Arc<InMemoryJobQueue> {
        Arc::new(InMemoryJobQueue::new(METRICS_QUEUE, job_options()))
    }

    fn event(timestamp: &str) -> MetricsEvent {
        MetricsEvent {
            request_id: "req-42".into(),
            query: "solana wallets".into(),
            offset: 10,
            execution_time_ms: 37,
            total_results: 2,
            hits_count: 1,
            hits: vec![MetricsHit {
                document_id: "doc-9".into(),
                url_host: "docs.example.org".into(),
                url_path: "/wallets".into(),
                score: 3.25,
            }],
            timestamp: timestamp.into(),
            user_agent: Some("Mozilla/5.0".into()),
        }
    }

    #[tokio::test]
    async fn test_publish_submits_keyed_job() {
        let queue = metrics_queue();
        let publisher = MetricsEventPublisher::new(queue.clone());

        publisher
            .publish_search_metrics(event("2025-06-01T10:00:00.250Z"))
            .await;

        let jobs = queue.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, SEARCH_EVENT_JOB);
        assert_eq!(
            jobs[0].id,
            derive_key(&["solana wallets", "10", "1748772000", "req-42"]).as_str()
        );
        assert_eq!(jobs[0].options, job_options());
        assert_eq!(jobs[0].payload["requestId"], "req-42");
        assert_eq!(jobs[0].payload["hits"][0]["urlHost"], "docs.example.org");
    }

    #[tokio::test]
    async fn test_same_second_publishes_collapse() {
        let queue = metrics_queue();
        let publisher = MetricsEventPublisher::new(queue.clone());

        let first = publisher
            .try_publish(&event("2025-06-01T10:00:00.100Z"))
            .await
            .unwrap();
        let second = publisher
            .try_publish(&event("2025-06-01T10:00:00.900Z"))
            .await
            .unwrap();

        assert_eq!(first.job_id, second.job_id);
        assert!(second.deduplicated);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_next_second_is_new_job() {
        let queue = metrics_queue();
        let publisher = MetricsEventPublisher::new(queue.clone());

        publisher
            .publish_search_metrics(event("2025-06-01T10:00:00.999Z"))
            .await;
        publisher
            .publish_search_metrics(event("2025-06-01T10:00:01.000Z"))
            .await;

        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn test_broker_failure_is_swallowed() {
        let queue = metrics_queue();
        queue.set_available(false);
        let publisher = MetricsEventPublisher::new(queue.clone());

        publisher
            .publish_search_metrics(event("2025-06-01T10:00:00Z"))
            .await;
        assert!(queue.is_empty());

        let err = publisher
            .try_publish(&event("2025-06-01T10:00:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(err, MetricsError::Queue(QueueError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_bad_timestamp_still_submitted() {
        let queue = metrics_queue();
        let publisher = MetricsEventPublisher::new(queue.clone());

        publisher.publish_search_metrics(event("not a time")).await;

        let jobs = queue.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(
            jobs[0].id,
            derive_key(&["solana wallets", "10", "NaN", "req-42"]).as_str()
        );
        assert_eq!(jobs[0].payload["timestamp"], "not a time");
    }

    #[tokio::test]
    async fn test_non_rfc3339_timestamps_submitted() {
        let queue = metrics_queue();
        let publisher = MetricsEventPublisher::new(queue.clone());

        for ts in [
            "2025-06-01T10:00:00",
            "2025-06-01",
            "Sun, 01 Jun 2025 10:00:00 GMT",
        ] {
            publisher.publish_search_metrics(event(ts)).await;
        }

        // The naive and RFC 2822 forms land in the same second.
        assert_eq!(queue.submissions(), 3);
        assert_eq!(queue.len(), 2);
        assert!(queue
            .get(derive_key(&["solana wallets", "10", "1748772000", "req-42"]).as_str())
            .is_some());
        assert!(queue
            .get(derive_key(&["solana wallets", "10", "1748736000", "req-42"]).as_str())
            .is_some());
    }

    #[tokio::test]
    async fn test_panicking_broker_is_contained() {
        let publisher = MetricsEventPublisher::new(Arc::new(PanickingQueue(job_options())));

        // Returns normally instead of unwinding into the caller.
        publisher
            .publish_search_metrics(event("2025-06-01T10:00:00Z"))
            .await;
    }

    #[tokio::test]
    async fn test_dispatch_completes_in_background() {
        let queue = metrics_queue();
        let publisher = Arc::new(MetricsEventPublisher::new(queue.clone()));

        publisher
            .dispatch(event("2025-06-01T10:00:00Z"))
            .await
            .unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_does_not_block_on_hung_broker() {
        let publisher = Arc::new(MetricsEventPublisher::new(Arc::new(HangingQueue(
            job_options(),
        ))));

        let started = std::time::Instant::now();
        let handle = publisher.dispatch(event("2025-06-01T10:00:00Z"));
        assert!(started.elapsed() < Duration::from_secs(1));

        // Still pending: the caller was never tied to it.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }
}
