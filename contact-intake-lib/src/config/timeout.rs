use serde::Deserialize;
use std::time::Duration;

/// Timeout configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    /// Graceful shutdown timeout in seconds
    /// Upper bound on waiting for in-flight recorder/telemetry dispatches
    /// Default: 30
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_secs: u64,
    /// Upper bound for one submission's recorder + telemetry dispatch, in seconds
    /// Default: 10
    #[serde(default = "default_fanout_timeout")]
    pub fanout_secs: u64,
    /// Maximum time to read a request body, in seconds
    /// Default: 15
    #[serde(default = "default_body_read_timeout")]
    pub body_read_secs: u64,
}

impl TimeoutConfig {
    pub fn shutdown(&self) -> Duration {
        Duration::from_secs(self.shutdown_secs)
    }

    pub fn fanout(&self) -> Duration {
        Duration::from_secs(self.fanout_secs)
    }

    pub fn body_read(&self) -> Duration {
        Duration::from_secs(self.body_read_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            shutdown_secs: default_shutdown_timeout(),
            fanout_secs: default_fanout_timeout(),
            body_read_secs: default_body_read_timeout(),
        }
    }
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_fanout_timeout() -> u64 {
    10
}

fn default_body_read_timeout() -> u64 {
    15
}
