use serde::Deserialize;
use std::net::SocketAddr;

use super::security::SecurityConfig;
use super::sheets::SheetsConfig;
use super::telemetry::{LoggingConfig, TelemetryConfig};
use super::timeout::TimeoutConfig;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address and port to listen on
    /// Example: "0.0.0.0:3000" or "127.0.0.1:8080"
    pub listen: SocketAddr,
    /// Contact endpoint configuration
    #[serde(default)]
    pub intake: IntakeConfig,
    /// Security configuration (rate limiting, client identity)
    #[serde(default)]
    pub security: SecurityConfig,
    /// Spreadsheet recorder configuration
    /// Credentials can also be supplied through GOOGLE_SHEET_ID / GOOGLE_SHEETS_ACCESS_TOKEN
    #[serde(default)]
    pub sheets: SheetsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Timeout configuration
    #[serde(default)]
    pub timeout: TimeoutConfig,
    /// Telemetry configuration
    /// Controls metrics and the observability server
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Contact endpoint configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IntakeConfig {
    /// Path of the submission endpoint
    /// Default: "/api/contact"
    #[serde(default = "default_path")]
    pub path: String,
    /// Maximum accepted request body size in bytes
    /// Default: 65536 (64 KiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self { path: default_path(), max_body_bytes: default_max_body_bytes() }
    }
}

fn default_path() -> String {
    "/api/contact".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}
