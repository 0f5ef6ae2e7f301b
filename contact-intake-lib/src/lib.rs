#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod intake;
pub mod recorder;
pub mod security;
pub mod server;
pub mod telemetry;

pub use config::{load_from_path, Config};
pub use error::{IntakeError, Result};
pub use intake::{IntakePipeline, IntakeResponse, Rejection};
pub use recorder::{Recorder, RecorderError, SheetsRecorder};
pub use security::rate_limit::{Quota, RateLimitResult, RateLimiter};
pub use server::{run, AppState};
pub use telemetry::{MetricsTelemetry, Telemetry, TelemetryEvent};
