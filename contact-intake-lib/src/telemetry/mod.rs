pub mod endpoints;
pub mod events;
pub mod metrics;
pub mod server;
pub mod tracing;

pub use events::{names as event_names, MetricsTelemetry, Telemetry, TelemetryEvent};
pub use endpoints::{
    handle_metrics, health_check_response, live_check_response, ready_check_response,
};
pub use metrics::{init_metrics, Metrics};
pub use server::{serve_observability, start_observability_server};
pub use self::tracing::init_tracing;
