//! Contact submission intake.
//!
//! Each submission moves through
//! `Received -> SpamChecked -> Validated -> RateChecked -> Recorded -> Completed`,
//! leaving early at any gate that rejects it:
//!
//! | gate         | failure            | status |
//! |--------------|--------------------|--------|
//! | Received     | `MalformedRequest` | 500    |
//! | SpamChecked  | (silent success)   | 200    |
//! | Validated    | `MissingFields`, `InvalidEmail` | 400 |
//! | RateChecked  | `RateLimited`      | 429    |
//!
//! Recording and telemetry run on detached tasks once the response is
//! decided. Their failures are logged and never change the response.

use chrono::Utc;
use http::HeaderMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::payload::{SubmissionPayload, SubmissionRecord};
use super::rejection::Rejection;
use super::response::{IntakeResponse, RateLimitInfo};
use super::validator::validate;
use crate::config::Config;
use crate::recorder::Recorder;
use crate::security::rate_limit::{Quota, RateLimitResult, RateLimiter};
use crate::security::{is_spam, resolve_client_identity};
use crate::telemetry::events::{names, NOT_SPECIFIED};
use crate::telemetry::{Metrics, Telemetry, TelemetryEvent};

const DEFAULT_FANOUT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct IntakePipeline {
    limiter: Arc<RateLimiter>,
    quota: Quota,
    recorder: Arc<dyn Recorder>,
    telemetry: Arc<dyn Telemetry>,
    metrics: Option<Arc<Metrics>>,
    trust_proxy_headers: bool,
    fanout_timeout: Duration,
    tasks: TaskTracker,
}

impl IntakePipeline {
    /// Pipeline with the default quota (3 per hour), trusting proxy headers.
    pub fn new(
        limiter: Arc<RateLimiter>,
        recorder: Arc<dyn Recorder>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self {
            limiter,
            quota: Quota::default(),
            recorder,
            telemetry,
            metrics: None,
            trust_proxy_headers: true,
            fanout_timeout: DEFAULT_FANOUT_TIMEOUT,
            tasks: TaskTracker::new(),
        }
    }

    pub fn from_config(
        config: &Config,
        limiter: Arc<RateLimiter>,
        recorder: Arc<dyn Recorder>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self::new(limiter, recorder, telemetry)
            .with_quota(Quota::from(&config.security.rate_limit))
            .with_trust_proxy_headers(config.security.trust_proxy_headers)
            .with_fanout_timeout(config.timeout.fanout())
    }

    pub fn with_quota(mut self, quota: Quota) -> Self {
        self.quota = quota;
        self
    }

    pub fn with_trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    pub fn with_fanout_timeout(mut self, timeout: Duration) -> Self {
        self.fanout_timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn quota(&self) -> Quota {
        self.quota
    }

    /// Run one submission through the pipeline.
    ///
    /// `body` is the raw request body, `peer` the socket address of the
    /// connection (used as identity only when proxy headers are not trusted).
    /// Must be called from within a Tokio runtime.
    pub fn handle(
        &self,
        body: &[u8],
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
    ) -> IntakeResponse {
        match self.process(body, headers, peer) {
            Ok(response) => response,
            Err(rejection) => {
                debug!(error_type = rejection.error_type(), "submission rejected");
                self.reject(rejection)
            }
        }
    }

    /// Reject a submission before it reaches the pipeline (e.g. an oversized
    /// or unreadable body), with the same accounting as in-pipeline rejections.
    pub fn reject(&self, rejection: Rejection) -> IntakeResponse {
        if let Some(m) = &self.metrics {
            m.record_rejected(rejection.error_type());
        }
        self.emit(rejection_event(&rejection));
        IntakeResponse::rejected(&rejection)
    }

    /// Wait until every dispatched recorder/telemetry task has finished.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Number of dispatch tasks still running.
    pub fn pending_dispatches(&self) -> usize {
        self.tasks.len()
    }

    fn process(
        &self,
        body: &[u8],
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
    ) -> Result<IntakeResponse, Rejection> {
        // Received
        let payload: SubmissionPayload = serde_json::from_slice(body).map_err(|e| {
            debug!(error = %e, "unparseable submission body");
            Rejection::MalformedRequest
        })?;

        // SpamChecked: indistinguishable from success, nothing consumed or dispatched
        if is_spam(&payload) {
            debug!("honeypot filled, discarding submission");
            if let Some(m) = &self.metrics {
                m.record_spam();
            }
            return Ok(IntakeResponse::accepted(new_submission_id(), None));
        }

        // Validated
        let submission = validate(&payload)?;

        // RateChecked
        let client_ip = resolve_client_identity(headers, peer, self.trust_proxy_headers);
        let (limit, remaining) = match self.limiter.check(&client_ip, self.quota) {
            RateLimitResult::Allowed { limit, remaining, .. } => {
                if let Some(m) = &self.metrics {
                    m.record_rate_limit_allowed();
                }
                (limit, remaining)
            }
            RateLimitResult::Limited { limit, reset_after, .. } => {
                info!(client = %client_ip, ?reset_after, "submission rate limited");
                if let Some(m) = &self.metrics {
                    m.record_rate_limit_rejected();
                }
                return Err(Rejection::RateLimited { limit, reset_after });
            }
        };

        // Recorded (detached)
        let submission_id = new_submission_id();
        let record =
            SubmissionRecord::new(submission, submission_id.clone(), client_ip, Utc::now());
        self.dispatch(record);

        // Completed
        if let Some(m) = &self.metrics {
            m.record_accepted();
        }
        info!(submission_id = %submission_id, remaining, "submission accepted");
        Ok(IntakeResponse::accepted(
            submission_id,
            Some(RateLimitInfo { limit, remaining, retry_after: None }),
        ))
    }

    /// Record the submission, then report it.
    ///
    /// The recorder call and each telemetry call are bounded by the fan-out
    /// timeout separately; a recorder timeout counts as a recorder failure.
    fn dispatch(&self, record: SubmissionRecord) {
        let recorder = Arc::clone(&self.recorder);
        let telemetry = Arc::clone(&self.telemetry);
        let metrics = self.metrics.clone();
        let timeout = self.fanout_timeout;

        self.tasks.spawn(async move {
            let recorded = match bounded(timeout, &metrics, recorder.record(&record)).await {
                Some(Ok(())) => true,
                Some(Err(e)) => {
                    warn!(submission_id = %record.submission_id, error = %e, "failed to record submission");
                    false
                }
                None => {
                    debug!(submission_id = %record.submission_id, "recorder did not finish in time");
                    false
                }
            };
            if !recorded {
                if let Some(m) = &metrics {
                    m.record_recorder_failure();
                }
                let event = TelemetryEvent::new(names::ERROR).with("stage", "recorder");
                bounded(timeout, &metrics, track(&*telemetry, event)).await;
            }
            bounded(timeout, &metrics, track(&*telemetry, submitted_event(&record, recorded))).await;
        });
    }

    fn emit(&self, event: TelemetryEvent) {
        let telemetry = Arc::clone(&self.telemetry);
        let metrics = self.metrics.clone();
        let timeout = self.fanout_timeout;
        self.tasks.spawn(async move {
            bounded(timeout, &metrics, track(&*telemetry, event)).await;
        });
    }
}

/// Run `work` for at most `timeout`; `None` (and a fan-out timeout metric) when it expires.
async fn bounded<F>(timeout: Duration, metrics: &Option<Arc<Metrics>>, work: F) -> Option<F::Output>
where
    F: Future,
{
    match tokio::time::timeout(timeout, work).await {
        Ok(output) => Some(output),
        Err(_) => {
            warn!(?timeout, "submission dispatch step timed out");
            if let Some(m) = metrics {
                m.record_fanout_timeout();
            }
            None
        }
    }
}

async fn track(telemetry: &dyn Telemetry, event: TelemetryEvent) {
    let name = event.name;
    if let Err(e) = telemetry.track(event).await {
        debug!(event = name, error = %e, "telemetry event dropped");
    }
}

fn new_submission_id() -> String {
    Uuid::new_v4().to_string()
}

fn submitted_event(record: &SubmissionRecord, recorded: bool) -> TelemetryEvent {
    let or_unspecified = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_SPECIFIED.to_string());
    TelemetryEvent::new(names::SUBMITTED)
        .with("projectType", or_unspecified(&record.project_type))
        .with("budget", or_unspecified(&record.budget))
        .with("timeline", or_unspecified(&record.timeline))
        .with("recorded", recorded.to_string())
}

fn rejection_event(rejection: &Rejection) -> TelemetryEvent {
    match rejection {
        Rejection::MissingFields(_) | Rejection::InvalidEmail => {
            TelemetryEvent::new(names::VALIDATION_ERROR).with("reason", rejection.error_type())
        }
        Rejection::RateLimited { .. } => TelemetryEvent::new(names::RATE_LIMITED),
        Rejection::MalformedRequest | Rejection::PayloadTooLarge | Rejection::Internal => {
            TelemetryEvent::new(names::ERROR).with("stage", rejection.error_type())
        }
    }
}
