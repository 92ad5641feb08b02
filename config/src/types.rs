use std::fmt;
use std::str::FromStr;

use seek_queue::QueueJobOptions;
use serde::{Deserialize, Serialize};

/// Default broker port.
pub const DEFAULT_PORT: u16 = 6379;

/// Default port for a sentinel node.
pub const DEFAULT_SENTINEL_PORT: u16 = 26379;

/// Per-retry growth of the connection retry delay, in milliseconds.
pub const CONNECT_RETRY_STEP_MS: u64 = 50;

/// Ceiling on the connection retry delay, in milliseconds.
pub const CONNECT_RETRY_CAP_MS: u64 = 2000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("missing required setting: {0}")]
    MissingField(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Broker topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    #[default]
    Standalone,
    Sentinel,
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionMode::Standalone => write!(f, "standalone"),
            ConnectionMode::Sentinel => write!(f, "sentinel"),
        }
    }
}

impl FromStr for ConnectionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standalone" => Ok(ConnectionMode::Standalone),
            "sentinel" => Ok(ConnectionMode::Sentinel),
            other => Err(ConfigError::Invalid(format!(
                "unknown connection mode {other:?} (expected standalone or sentinel)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelAddr {
    pub host: String,
    #[serde(default = "default_sentinel_port")]
    pub port: u16,
}

fn default_sentinel_port() -> u16 {
    DEFAULT_SENTINEL_PORT
}

/// How to reach the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub mode: ConnectionMode,
    /// Standalone host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Standalone port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Sentinel master group name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_name: Option<String>,
    /// Connection attempts made before event tracking is given up.
    pub max_connect_retries: u32,
    pub sentinels: Vec<SentinelAddr>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            mode: ConnectionMode::Standalone,
            host: Some("localhost".to_string()),
            port: Some(DEFAULT_PORT),
            master_name: None,
            max_connect_retries: 1,
            sentinels: Vec::new(),
        }
    }
}

/// A named queue and the job options registered as its defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSection {
    pub queue: String,
    pub options: QueueJobOptions,
}
