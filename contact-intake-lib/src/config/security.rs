use serde::Deserialize;
use std::time::Duration;

/// Security configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SecurityConfig {
    /// Derive the client identity from proxy headers
    /// (cf-connecting-ip, x-real-ip, x-forwarded-for).
    ///
    /// Only safe when the edge in front of this service strips or overwrites
    /// these headers. When false, the socket peer address is used.
    /// Default: true
    #[serde(default = "default_true")]
    pub trust_proxy_headers: bool,
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self { trust_proxy_headers: default_true(), rate_limit: RateLimitConfig::default() }
    }
}

/// Fixed-window rate limiting configuration
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum accepted submissions per client within one window
    /// Default: 3
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Window length in seconds
    /// Default: 3600 (1 hour)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Interval of the sweep that drops expired entries, in seconds
    /// Default: 600 (10 minutes)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_requests() -> u32 {
    3
}

fn default_window_secs() -> u64 {
    60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    10 * 60
}
