use opentelemetry::global;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::sync::Arc;

pub mod labels {
    pub const OUTCOME: &str = "outcome";
    pub const EVENT: &str = "event";
    pub const STATUS_CODE: &str = "status_code";
    pub const METHOD: &str = "method";
    pub const ERROR_TYPE: &str = "error_type";
    pub const VERSION: &str = "version";
    pub const RUST_VERSION: &str = "rust_version";
}

pub mod values {
    pub const OUTCOME_ACCEPTED: &str = "accepted";
    pub const OUTCOME_SPAM: &str = "spam";
    pub const OUTCOME_REJECTED: &str = "rejected";
}

#[derive(Clone)]
pub struct Metrics {
    pub requests_total: Counter<u64>,
    pub requests_duration_seconds: Histogram<f64>,

    // Submission outcomes
    pub submissions_total: Counter<u64>,

    // Rate limiting metrics
    pub rate_limit_allowed_total: Counter<u64>,
    pub rate_limit_rejected_total: Counter<u64>,

    // Downstream dispatch
    pub recorder_failures_total: Counter<u64>,
    pub fanout_timeouts_total: Counter<u64>,
    pub telemetry_events_total: Counter<u64>,

    // Build info
    pub build_info: Gauge<u64>,
}

impl Metrics {
    /// Build the instruments on `meter`.
    ///
    /// With a meter from an unconfigured global provider the instruments are
    /// no-ops, which is what tests use.
    pub fn new(meter: Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("contact_intake_requests_total")
                .with_description("Total number of HTTP requests processed")
                .build(),
            requests_duration_seconds: meter
                .f64_histogram("contact_intake_requests_duration_seconds")
                .with_description("Request duration in seconds")
                .build(),

            submissions_total: meter
                .u64_counter("contact_intake_submissions_total")
                .with_description("Total number of submissions by outcome")
                .build(),

            rate_limit_allowed_total: meter
                .u64_counter("contact_intake_rate_limit_allowed_total")
                .with_description("Total number of submissions allowed by the rate limiter")
                .build(),
            rate_limit_rejected_total: meter
                .u64_counter("contact_intake_rate_limit_rejected_total")
                .with_description("Total number of submissions rejected by the rate limiter")
                .build(),

            recorder_failures_total: meter
                .u64_counter("contact_intake_recorder_failures_total")
                .with_description("Total number of failed spreadsheet appends")
                .build(),
            fanout_timeouts_total: meter
                .u64_counter("contact_intake_fanout_timeouts_total")
                .with_description("Total number of recorder/telemetry dispatches that timed out")
                .build(),
            telemetry_events_total: meter
                .u64_counter("contact_intake_events_total")
                .with_description("Total number of telemetry events emitted")
                .build(),

            build_info: meter
                .u64_gauge("contact_intake_build_info")
                .with_description("Build information (version, rust version)")
                .build(),
        }
    }

    /// Set build info metric with version labels
    pub fn set_build_info(&self) {
        let version = env!("CARGO_PKG_VERSION");
        let rust_version = env!("CARGO_PKG_RUST_VERSION");

        self.build_info.record(
            1,
            &[
                KeyValue::new(labels::VERSION, version),
                KeyValue::new(labels::RUST_VERSION, rust_version),
            ],
        );
    }

    pub fn record_request(&self, method: &str, status_code: u16, duration_secs: f64) {
        let attrs = [
            KeyValue::new(labels::METHOD, method.to_string()),
            KeyValue::new(labels::STATUS_CODE, i64::from(status_code)),
        ];
        self.requests_total.add(1, &attrs);
        self.requests_duration_seconds.record(duration_secs, &attrs);
    }

    pub fn record_accepted(&self) {
        self.submissions_total
            .add(1, &[KeyValue::new(labels::OUTCOME, values::OUTCOME_ACCEPTED)]);
    }

    pub fn record_spam(&self) {
        self.submissions_total
            .add(1, &[KeyValue::new(labels::OUTCOME, values::OUTCOME_SPAM)]);
    }

    pub fn record_rejected(&self, error_type: &'static str) {
        self.submissions_total.add(
            1,
            &[
                KeyValue::new(labels::OUTCOME, values::OUTCOME_REJECTED),
                KeyValue::new(labels::ERROR_TYPE, error_type),
            ],
        );
    }

    pub fn record_rate_limit_allowed(&self) {
        self.rate_limit_allowed_total.add(1, &[]);
    }

    pub fn record_rate_limit_rejected(&self) {
        self.rate_limit_rejected_total.add(1, &[]);
    }

    pub fn record_recorder_failure(&self) {
        self.recorder_failures_total.add(1, &[]);
    }

    pub fn record_fanout_timeout(&self) {
        self.fanout_timeouts_total.add(1, &[]);
    }

    pub fn record_event(&self, event: &str) {
        self.telemetry_events_total
            .add(1, &[KeyValue::new(labels::EVENT, event.to_string())]);
    }
}

/// Install the Prometheus-backed meter provider and build the instruments.
pub fn init_metrics() -> Result<(Arc<Metrics>, Registry), Box<dyn std::error::Error + Send + Sync>>
{
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();

    global::set_meter_provider(meter_provider);

    let meter = global::meter("contact-intake");
    let metrics = Arc::new(Metrics::new(meter));

    metrics.set_build_info();

    Ok((metrics, registry))
}
