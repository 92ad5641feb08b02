use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use crate::queue::JobQueue;
use crate::types::{JobReceipt, JobRequest, QueueError, QueueJobOptions};

/// Number of job records kept by default before the oldest is dropped.
pub const DEFAULT_MAX_JOBS: usize = 10_000;

/// A job as stored by [`InMemoryJobQueue`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedJob {
    pub id: String,
    pub name: String,
    pub payload: serde_json::Value,
    /// Options in force for this job after applying queue defaults.
    pub options: QueueJobOptions,
    pub added_at: DateTime<Utc>,
}

/// Process-local broker: stores submitted jobs without running them.
///
/// Deduplicates on job id, assigns sequential ids to jobs without one, and
/// keeps at most `max_jobs` records (least recently added dropped first).
pub struct InMemoryJobQueue {
    name: String,
    defaults: QueueJobOptions,
    jobs: Mutex<LruCache<String, QueuedJob>>,
    next_id: AtomicU64,
    submissions: AtomicU64,
    available: AtomicBool,
}

impl InMemoryJobQueue {
    /// Create a queue with the default record capacity.
    pub fn new(name: impl Into<String>, defaults: QueueJobOptions) -> Self {
        Self::with_capacity(name, defaults, DEFAULT_MAX_JOBS)
    }

    /// Create a queue keeping at most `max_jobs` records (minimum 1).
    pub fn with_capacity(name: impl Into<String>, defaults: QueueJobOptions, max_jobs: usize) -> Self {
        let capacity = NonZeroUsize::new(max_jobs).unwrap_or(NonZeroUsize::MIN);
        Self {
            name: name.into(),
            defaults,
            jobs: Mutex::new(LruCache::new(capacity)),
            next_id: AtomicU64::new(1),
            submissions: AtomicU64::new(0),
            available: AtomicBool::new(true),
        }
    }

    /// Take the broker on- or offline. While offline every `add` fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Stored jobs, oldest first.
    pub fn jobs(&self) -> Vec<QueuedJob> {
        let jobs = self.jobs.lock();
        let mut out: Vec<QueuedJob> = jobs.iter().map(|(_, job)| job.clone()).collect();
        out.reverse();
        out
    }

    pub fn get(&self, job_id: &str) -> Option<QueuedJob> {
        self.jobs.lock().peek(job_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Number of `add` calls the broker accepted, duplicates included.
    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_options(&self) -> &QueueJobOptions {
        &self.defaults
    }

    async fn add(&self, job: JobRequest) -> Result<JobReceipt, QueueError> {
        if !self.is_available() {
            return Err(QueueError::Unavailable(format!(
                "queue {} is offline",
                self.name
            )));
        }
        if job.name.is_empty() {
            return Err(QueueError::Rejected("job name cannot be empty".into()));
        }

        self.submissions.fetch_add(1, Ordering::Relaxed);

        let mut jobs = self.jobs.lock();
        let id = match job.job_id {
            Some(id) => {
                if jobs.contains(&id) {
                    debug!(queue = %self.name, job_id = %id, "duplicate job ignored");
                    return Ok(JobReceipt {
                        queue: self.name.clone(),
                        job_id: id,
                        name: job.name,
                        deduplicated: true,
                    });
                }
                id
            }
            None => self.next_id.fetch_add(1, Ordering::Relaxed).to_string(),
        };

        let options = QueueJobOptions::effective(job.options.as_ref(), &self.defaults);
        let stored = QueuedJob {
            id: id.clone(),
            name: job.name.clone(),
            payload: job.payload,
            options,
            added_at: Utc::now(),
        };
        if let Some((evicted, _)) = jobs.push(id.clone(), stored) {
            if evicted != id {
                debug!(queue = %self.name, job_id = %evicted, "job record evicted");
            }
        }

        debug!(queue = %self.name, job_id = %id, name = %job.name, "job added");

        Ok(JobReceipt {
            queue: self.name.clone(),
            job_id: id,
            name: job.name,
            deduplicated: false,
        })
    }
}
