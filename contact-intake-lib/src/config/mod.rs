mod loader;
mod root;
mod security;
mod sheets;
mod telemetry;
mod timeout;
mod validator;

pub use loader::{apply_env_overrides, load_from_path, ENV_ACCESS_TOKEN, ENV_SHEET_ID};
pub use root::{Config, IntakeConfig};
pub use security::{RateLimitConfig, SecurityConfig};
pub use sheets::SheetsConfig;
pub use telemetry::{LoggingConfig, TelemetryConfig};
pub use timeout::TimeoutConfig;
pub use validator::validate;
