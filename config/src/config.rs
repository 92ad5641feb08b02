use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use seek_queue::QueueJobOptions;
use tracing::warn;

use crate::types::*;

/// Environment variable names for the three sentinel slots: (host, port).
const SENTINEL_ENV: [(&str, &str); 3] = [
    ("REDIS_SENTINEL_1_HOST", "REDIS_SENTINEL_1_PORT"),
    ("REDIS_SENTINEL_2_HOST", "REDIS_SENTINEL_2_PORT"),
    ("REDIS_SENTINEL_3_HOST", "REDIS_SENTINEL_3_PORT"),
];

/// Service configuration: broker connection plus the two event queues.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default = "default_rewards_section")]
    pub rewards: QueueSection,
    #[serde(default = "default_metrics_section")]
    pub metrics: QueueSection,
}

fn default_rewards_section() -> QueueSection {
    QueueSection {
        queue: seek_rewards::REWARDS_QUEUE.to_string(),
        options: seek_rewards::default_job_options(),
    }
}

fn default_metrics_section() -> QueueSection {
    QueueSection {
        queue: seek_metrics::METRICS_QUEUE.to_string(),
        options: seek_metrics::job_options(),
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            rewards: default_rewards_section(),
            metrics: default_metrics_section(),
        }
    }
}

impl ServiceConfig {
    /// Load a config from a TOML file. Missing sections take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Save the config to a TOML file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Override connection settings from deployment variables.
    ///
    /// `lookup` resolves a variable name; pass `|k| std::env::var(k).ok()` for
    /// the process environment. Sentinel slots found in the environment
    /// replace the configured sentinel list.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let conn = &mut self.connection;

        if let Some(mode) = lookup("REDIS_MODE") {
            conn.mode = mode.parse()?;
        }
        if let Some(host) = lookup("REDIS_HOST") {
            conn.host = Some(host);
        }
        if let Some(port) = lookup("REDIS_PORT") {
            conn.port = Some(parse_port("REDIS_PORT", &port)?);
        }
        if let Some(name) = lookup("REDIS_MASTER_NAME") {
            conn.master_name = Some(name);
        }

        let mut sentinels = Vec::new();
        for (host_var, port_var) in SENTINEL_ENV {
            let port = lookup(port_var);
            match lookup(host_var) {
                Some(host) => {
                    let port = match port {
                        Some(p) => parse_port(port_var, &p)?,
                        None => DEFAULT_SENTINEL_PORT,
                    };
                    sentinels.push(SentinelAddr { host, port });
                }
                None if port.is_some() => return Err(ConfigError::MissingField(host_var)),
                None => {}
            }
        }
        if !sentinels.is_empty() {
            conn.sentinels = sentinels;
        }

        Ok(())
    }

    /// Validate the connection and queue settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let conn = &self.connection;
        match conn.mode {
            ConnectionMode::Standalone => {
                if conn.host.as_deref().map_or(true, |h| h.trim().is_empty()) {
                    return Err(ConfigError::MissingField("connection.host"));
                }
                if conn.port.is_none() {
                    return Err(ConfigError::MissingField("connection.port"));
                }
            }
            ConnectionMode::Sentinel => {
                if conn.master_name.as_deref().map_or(true, |n| n.trim().is_empty()) {
                    return Err(ConfigError::MissingField("connection.master_name"));
                }
                if conn.sentinels.is_empty() {
                    return Err(ConfigError::MissingField("connection.sentinels"));
                }
                if let Some(i) = conn.sentinels.iter().position(|s| s.host.trim().is_empty()) {
                    return Err(ConfigError::Invalid(format!("sentinel {i} has an empty host")));
                }
            }
        }

        let mut seen = HashSet::new();
        for (section, queue) in [("rewards", &self.rewards), ("metrics", &self.metrics)] {
            if queue.queue.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{section}.queue is empty")));
            }
            if !seen.insert(queue.queue.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "queue name {:?} is used by more than one section",
                    queue.queue
                )));
            }
            validate_options(section, &queue.options)?;
        }

        Ok(())
    }

    /// Delay before reconnect attempt `times` (1-based), or `None` once the
    /// retry budget is spent and event tracking should be treated as off.
    pub fn retry_delay(&self, times: u32) -> Option<Duration> {
        if times > self.connection.max_connect_retries {
            warn!(
                attempts = times,
                "broker connection failed, event tracking will be disabled"
            );
            return None;
        }
        let ms = (times as u64)
            .saturating_mul(CONNECT_RETRY_STEP_MS)
            .min(CONNECT_RETRY_CAP_MS);
        Some(Duration::from_millis(ms))
    }

    /// Every reconnect delay allowed by the retry budget, in order.
    pub fn connect_retry_schedule(&self) -> Vec<Duration> {
        (1..=self.connection.max_connect_retries)
            .filter_map(|times| self.retry_delay(times))
            .collect()
    }
}

fn validate_options(section: &str, options: &QueueJobOptions) -> Result<(), ConfigError> {
    if options.attempts == 0 {
        return Err(ConfigError::Invalid(format!(
            "{section}.options.attempts must be at least 1"
        )));
    }
    if options.backoff.delay_ms == 0 {
        return Err(ConfigError::Invalid(format!(
            "{section}.options.backoff delay must be positive"
        )));
    }
    Ok(())
}

fn parse_port(var: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{var}={value:?} is not a valid port")))
}
