//! Analytics events emitted by the intake pipeline.
//!
//! Events are fire-and-forget: the pipeline never waits on them for the
//! user-visible response, and a failed emission is only logged.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use super::metrics::Metrics;
use crate::error::Result;

pub mod names {
    pub const SUBMITTED: &str = "contact_form_submitted";
    pub const VALIDATION_ERROR: &str = "contact_form_validation_error";
    pub const RATE_LIMITED: &str = "contact_form_rate_limited";
    pub const ERROR: &str = "contact_form_error";
}

/// Value used for optional form fields the submitter left empty
pub const NOT_SPECIFIED: &str = "not_specified";

/// A named event with flat text attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryEvent {
    pub name: &'static str,
    pub attributes: BTreeMap<String, String>,
}

impl TelemetryEvent {
    pub fn new(name: &'static str) -> Self {
        Self { name, attributes: BTreeMap::new() }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Sink for pipeline events.
#[async_trait]
pub trait Telemetry: Send + Sync {
    async fn track(&self, event: TelemetryEvent) -> Result<()>;
}

/// Counts events in the metrics registry and logs them.
pub struct MetricsTelemetry {
    metrics: Option<Arc<Metrics>>,
}

impl MetricsTelemetry {
    pub fn new(metrics: Option<Arc<Metrics>>) -> Self {
        Self { metrics }
    }
}

#[async_trait]
impl Telemetry for MetricsTelemetry {
    async fn track(&self, event: TelemetryEvent) -> Result<()> {
        if let Some(m) = &self.metrics {
            m.record_event(event.name);
        }
        info!(event = event.name, attributes = ?event.attributes, "telemetry event");
        Ok(())
    }
}
