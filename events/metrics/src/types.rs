use seek_queue::{Backoff, QueueError, QueueJobOptions, Retention};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the queue search metrics are published to.
pub const METRICS_QUEUE: &str = "search-metrics";

/// Job name for a completed search.
pub const SEARCH_EVENT_JOB: &str = "search-event";

/// Options attached to every metrics job: three attempts backing off from
/// 1s, drop on success, keep the last 100 failures.
pub fn job_options() -> QueueJobOptions {
    QueueJobOptions {
        attempts: 3,
        backoff: Backoff::exponential(1000),
        remove_on_complete: Retention::Remove(true),
        remove_on_fail: Retention::KeepLast(100),
    }
}

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid event timestamp {timestamp:?}: {source}")]
    InvalidTimestamp {
        timestamp: String,
        source: chrono::ParseError,
    },

    #[error("queue submission failed: {0}")]
    Queue(#[from] QueueError),
}

/// One search hit as reported to the metrics pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsHit {
    pub document_id: String,
    pub url_host: String,
    pub url_path: String,
    pub score: f64,
}

/// Summary of one completed search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsEvent {
    pub request_id: String,
    pub query: String,
    pub offset: u64,
    pub execution_time_ms: u64,
    pub total_results: u64,
    pub hits_count: usize,
    pub hits: Vec<MetricsHit>,
    /// RFC 3339 time the search completed.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> MetricsEvent {
        MetricsEvent {
            request_id: "req-1".into(),
            query: "rust".into(),
            offset: 0,
            execution_time_ms: 12,
            total_results: 1,
            hits_count: 1,
            hits: vec![MetricsHit {
                document_id: "doc-1".into(),
                url_host: "example.com".into(),
                url_path: "/rust".into(),
                score: 1.5,
            }],
            timestamp: "2025-01-01T00:00:00.000Z".into(),
            user_agent: None,
        }
    }

    #[test]
    fn test_event_wire_shape() {
        let json = serde_json::to_value(event()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "requestId": "req-1",
                "query": "rust",
                "offset": 0,
                "executionTimeMs": 12,
                "totalResults": 1,
                "hitsCount": 1,
                "hits": [{
                    "documentId": "doc-1",
                    "urlHost": "example.com",
                    "urlPath": "/rust",
                    "score": 1.5
                }],
                "timestamp": "2025-01-01T00:00:00.000Z"
            })
        );
    }

    #[test]
    fn test_user_agent_included_when_present() {
        let mut e = event();
        e.user_agent = Some("curl/8.0".into());
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["userAgent"], "curl/8.0");
    }

    #[test]
    fn test_job_options() {
        let options = job_options();
        assert_eq!(options.attempts, 3);
        assert_eq!(options.backoff, Backoff::exponential(1000));
        assert_eq!(options.remove_on_complete, Retention::Remove(true));
        assert_eq!(options.remove_on_fail, Retention::KeepLast(100));
    }
}
