use std::fmt;

use seek_queue::{Backoff, QueueJobOptions, Retention};
use serde::{Deserialize, Serialize};

/// Name of the queue reward events are submitted to.
pub const REWARDS_QUEUE: &str = "rewards-events";

/// Default delivery options for the rewards queue: three attempts backing
/// off 2s, 4s, 8s; keep the last 100 completed and 500 failed records.
pub fn default_job_options() -> QueueJobOptions {
    QueueJobOptions {
        attempts: 3,
        backoff: Backoff::exponential(2000),
        remove_on_complete: Retention::KeepLast(100),
        remove_on_fail: Retention::KeepLast(500),
    }
}

/// Category of a reward-eligible search. Doubles as the job name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewardEventType {
    ImageSearch,
    AudioSearch,
    VideoSearch,
}

impl RewardEventType {
    pub const ALL: [RewardEventType; 3] = [
        RewardEventType::ImageSearch,
        RewardEventType::AudioSearch,
        RewardEventType::VideoSearch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RewardEventType::ImageSearch => "image-search",
            RewardEventType::AudioSearch => "audio-search",
            RewardEventType::VideoSearch => "video-search",
        }
    }
}

impl fmt::Display for RewardEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Payload of a reward job. Built only after eligibility and wallet checks pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardEvent {
    pub event_type: RewardEventType,
    /// Normalized wallet address.
    pub wallet_address: String,
    #[serde(default)]
    pub metadata: RewardMetadata,
}

impl RewardEvent {
    pub fn new(event_type: RewardEventType, wallet_address: String, timestamp: &str) -> Self {
        Self {
            event_type,
            wallet_address,
            metadata: RewardMetadata {
                timestamp: Some(timestamp.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_wire_names() {
        for event_type in RewardEventType::ALL {
            let json = serde_json::to_value(event_type).unwrap();
            assert_eq!(json, serde_json::json!(event_type.as_str()));
        }
        assert_eq!(RewardEventType::VideoSearch.to_string(), "video-search");
    }

    #[test]
    fn test_reward_event_payload_shape() {
        let event = RewardEvent::new(
            RewardEventType::ImageSearch,
            "a".repeat(43),
            "2025-01-01T00:00:00Z",
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "eventType": "image-search",
                "walletAddress": "a".repeat(43),
                "metadata": { "timestamp": "2025-01-01T00:00:00Z" }
            })
        );
    }

    #[test]
    fn test_default_job_options() {
        let options = default_job_options();
        assert_eq!(options.attempts, 3);
        assert_eq!(options.backoff, Backoff::exponential(2000));
        assert_eq!(options.remove_on_complete, Retention::KeepLast(100));
        assert_eq!(options.remove_on_fail, Retention::KeepLast(500));
    }
}
