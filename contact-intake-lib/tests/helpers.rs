//! Shared test doubles for the intake pipeline

#![allow(dead_code)]

use async_trait::async_trait;
use contact_intake_lib::config::Config;
use contact_intake_lib::intake::SubmissionRecord;
use contact_intake_lib::security::rate_limit::{ManualClock, Quota};
use contact_intake_lib::telemetry::{Telemetry, TelemetryEvent};
use contact_intake_lib::{IntakeError, IntakePipeline, RateLimiter, Recorder, RecorderError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorder that keeps every record it is given
#[derive(Default)]
pub struct RecordingRecorder {
    records: Mutex<Vec<SubmissionRecord>>,
}

impl RecordingRecorder {
    pub fn records(&self) -> Vec<SubmissionRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Recorder for RecordingRecorder {
    async fn record(&self, record: &SubmissionRecord) -> Result<(), RecorderError> {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
        Ok(())
    }
}

/// Recorder that always fails as if no spreadsheet were configured
#[derive(Default)]
pub struct FailingRecorder {
    calls: Mutex<usize>,
}

impl FailingRecorder {
    pub fn calls(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or_default()
    }
}

#[async_trait]
impl Recorder for FailingRecorder {
    async fn record(&self, _record: &SubmissionRecord) -> Result<(), RecorderError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
        Err(RecorderError::NotConfigured("GOOGLE_SHEET_ID"))
    }
}

/// Recorder that never finishes within any reasonable fan-out timeout
#[derive(Default)]
pub struct StalledRecorder;

#[async_trait]
impl Recorder for StalledRecorder {
    async fn record(&self, _record: &SubmissionRecord) -> Result<(), RecorderError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

/// Telemetry sink that keeps every event
#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetry {
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.name).collect()
    }
}

#[async_trait]
impl Telemetry for RecordingTelemetry {
    async fn track(&self, event: TelemetryEvent) -> contact_intake_lib::Result<()> {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
        Ok(())
    }
}

/// Telemetry sink that always errors
pub struct FailingTelemetry;

#[async_trait]
impl Telemetry for FailingTelemetry {
    async fn track(&self, _event: TelemetryEvent) -> contact_intake_lib::Result<()> {
        Err(IntakeError::Telemetry("analytics endpoint unreachable".to_string()))
    }
}

/// Pipeline wired to recording doubles and a manual clock
pub struct Harness {
    pub pipeline: IntakePipeline,
    pub limiter: Arc<RateLimiter>,
    pub clock: ManualClock,
    pub recorder: Arc<RecordingRecorder>,
    pub telemetry: Arc<RecordingTelemetry>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_quota(Quota::default())
    }

    pub fn with_quota(quota: Quota) -> Self {
        let clock = ManualClock::default();
        let limiter = Arc::new(RateLimiter::with_clock(Arc::new(clock.clone())));
        let recorder = Arc::new(RecordingRecorder::default());
        let telemetry = Arc::new(RecordingTelemetry::default());
        let pipeline = IntakePipeline::new(limiter.clone(), recorder.clone(), telemetry.clone())
            .with_quota(quota);
        Self { pipeline, limiter, clock, recorder, telemetry }
    }
}

/// Minimal configuration listening on an ephemeral port
pub fn test_config() -> Config {
    toml::from_str(
        r#"
listen = "127.0.0.1:0"

[timeout]
shutdown_secs = 1
"#,
    )
    .unwrap_or_else(|e| panic!("test config should parse: {e}"))
}

pub fn valid_body() -> Vec<u8> {
    br#"{"name":"Jo Smith","email":"JO@Example.com ","message":"Hello"}"#.to_vec()
}
