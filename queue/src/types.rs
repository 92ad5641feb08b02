use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while submitting a job to the broker.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue broker unavailable: {0}")]
    Unavailable(String),

    #[error("job payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("job rejected by broker: {0}")]
    Rejected(String),
}

/// How the delay between retries grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Exponential,
    Fixed,
}

/// Retry backoff, serialised as `{ "type": "exponential", "delay": 2000 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backoff {
    #[serde(rename = "type")]
    pub kind: BackoffKind,
    #[serde(rename = "delay")]
    pub delay_ms: u64,
}

impl Backoff {
    pub fn exponential(delay_ms: u64) -> Self {
        Self {
            kind: BackoffKind::Exponential,
            delay_ms,
        }
    }

    pub fn fixed(delay_ms: u64) -> Self {
        Self {
            kind: BackoffKind::Fixed,
            delay_ms,
        }
    }

    /// Delay before retry number `retry` (1-based).
    ///
    /// Exponential backoff doubles per retry: `delay * 2^(retry - 1)`.
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let ms = match self.kind {
            BackoffKind::Fixed => self.delay_ms,
            BackoffKind::Exponential => {
                let factor = 1u64
                    .checked_shl(retry.saturating_sub(1))
                    .unwrap_or(u64::MAX);
                self.delay_ms.saturating_mul(factor)
            }
        };
        Duration::from_millis(ms)
    }
}

/// What the broker keeps after a job finishes.
///
/// Serialises the way the broker expects: `true`/`false` or a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Retention {
    /// `true` drops the record immediately, `false` keeps every record.
    Remove(bool),
    /// Keep only the most recent N records.
    KeepLast(u32),
}

impl fmt::Display for Retention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Retention::Remove(true) => write!(f, "remove"),
            Retention::Remove(false) => write!(f, "keep all"),
            Retention::KeepLast(n) => write!(f, "keep last {n}"),
        }
    }
}

/// Delivery options attached to a job or registered as a queue default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueJobOptions {
    pub attempts: u32,
    pub backoff: Backoff,
    pub remove_on_complete: Retention,
    pub remove_on_fail: Retention,
}

impl QueueJobOptions {
    /// Job-level options win; otherwise the queue defaults apply unchanged.
    pub fn effective(job: Option<&QueueJobOptions>, defaults: &QueueJobOptions) -> QueueJobOptions {
        job.copied().unwrap_or(*defaults)
    }

    /// Full retry schedule: the delay before each retry after the first attempt.
    pub fn retry_schedule(&self) -> Vec<Duration> {
        (1..self.attempts)
            .map(|retry| self.backoff.delay_for_attempt(retry))
            .collect()
    }
}

/// A job ready for submission.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    /// Job name, used by workers to route the job.
    pub name: String,
    pub payload: serde_json::Value,
    /// Deduplication identifier. The broker assigns one when absent.
    pub job_id: Option<String>,
    /// Per-job options; `None` means the queue defaults.
    pub options: Option<QueueJobOptions>,
}

impl JobRequest {
    /// Build a job from any serialisable payload.
    pub fn new<T: Serialize>(name: impl Into<String>, payload: &T) -> Result<Self, QueueError> {
        Ok(Self {
            name: name.into(),
            payload: serde_json::to_value(payload)?,
            job_id: None,
            options: None,
        })
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn with_options(mut self, options: QueueJobOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// Broker acknowledgement that a job was accepted.
///
/// Acceptance is not delivery: the job may still be retried or fail later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReceipt {
    pub queue: String,
    pub job_id: String,
    pub name: String,
    /// True when a live job with the same id already existed and nothing new was stored.
    pub deduplicated: bool,
}
