use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{MetricsError, MetricsEvent};

/// Separator placed between identity fields before hashing.
///
/// Fields are not escaped, so tuples like `("a|b", "c")` and `("a", "b|c")`
/// hash the same. Kept as-is so existing keys stay stable.
pub const KEY_DELIMITER: &str = "|";

/// Deterministic job identifier: lowercase hex SHA-256 of the identity fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash an ordered list of identity fields into a key.
pub fn derive_key<S: AsRef<str>>(fields: &[S]) -> IdempotencyKey {
    let mut hasher = Sha256::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            hasher.update(KEY_DELIMITER.as_bytes());
        }
        hasher.update(field.as_ref().as_bytes());
    }
    IdempotencyKey(hex::encode(hasher.finalize()))
}

/// Time field used in the key when the event timestamp cannot be parsed.
pub const UNPARSED_TIME_FIELD: &str = "NaN";

/// Parse an event timestamp and floor it to whole Unix seconds.
///
/// Accepts RFC 3339, RFC 2822, and offset-less `YYYY-MM-DD[THH:MM:SS[.f]]`
/// forms, the latter read as UTC.
pub fn floor_to_seconds(timestamp: &str) -> Result<i64, MetricsError> {
    let ts = timestamp.trim();
    let parsed = DateTime::parse_from_rfc3339(ts)
        .or_else(|_| DateTime::parse_from_rfc2822(ts))
        .map(|dt| dt.timestamp());

    match parsed {
        Ok(secs) => Ok(secs),
        Err(source) => parse_naive_utc(ts).ok_or_else(|| MetricsError::InvalidTimestamp {
            timestamp: timestamp.to_string(),
            source,
        }),
    }
}

fn parse_naive_utc(ts: &str) -> Option<i64> {
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(ts, format) {
            return Some(dt.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(ts, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

/// Key for a metrics job: `query | offset | floor(seconds) | requestId`.
///
/// Publishes of the same search within one wall-clock second share a key,
/// which is the broker's dedup window. An unparsable timestamp keys on
/// [`UNPARSED_TIME_FIELD`] instead of failing.
pub fn metrics_job_key(event: &MetricsEvent) -> IdempotencyKey {
    let time_field = floor_to_seconds(&event.timestamp)
        .map(|secs| secs.to_string())
        .unwrap_or_else(|_| UNPARSED_TIME_FIELD.to_string());
    derive_key(&[
        event.query.clone(),
        event.offset.to_string(),
        time_field,
        event.request_id.clone(),
    ])
}
