use crate::helpers::{
    valid_body, FailingRecorder, FailingTelemetry, Harness, RecordingRecorder, RecordingTelemetry,
    StalledRecorder,
};
use contact_intake_lib::intake::rejection::GENERIC_FAILURE_MESSAGE;
use contact_intake_lib::telemetry::event_names;
use contact_intake_lib::{IntakePipeline, RateLimiter};
use http::{HeaderMap, HeaderValue, StatusCode};
use std::sync::Arc;
use std::time::Duration;

fn from_ip(ip: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("cf-connecting-ip", HeaderValue::from_static(ip));
    headers
}

#[tokio::test]
async fn test_missing_fields_rejected_without_consuming_quota() {
    let h = Harness::new();
    let body = br#"{"name":"Jo","email":"","message":"   "}"#;

    let response = h.pipeline.handle(body, &from_ip("1.2.3.4"), None);
    h.pipeline.drain().await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(!response.is_success());
    assert_eq!(response.body.message, "Please fill in all required fields: email, message.");
    assert!(h.limiter.peek("1.2.3.4").is_none());
    assert!(h.recorder.records().is_empty());

    let events = h.telemetry.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, event_names::VALIDATION_ERROR);
    assert_eq!(events[0].attribute("reason"), Some("missing_fields"));
}

#[tokio::test]
async fn test_invalid_email_rejected() {
    let h = Harness::new();
    let body = br#"{"name":"Jo","email":"jo@example","message":"Hello"}"#;

    let response = h.pipeline.handle(body, &from_ip("1.2.3.4"), None);
    h.pipeline.drain().await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body.message, "Please enter a valid email address.");
    assert!(h.limiter.peek("1.2.3.4").is_none());
    assert_eq!(h.telemetry.events()[0].attribute("reason"), Some("invalid_email"));
}

#[tokio::test]
async fn test_honeypot_silently_accepted() {
    let h = Harness::new();
    let body = br#"{"name":"Bot","email":"bot@spam.io","message":"buy","honeypot":"x"}"#;

    let response = h.pipeline.handle(body, &from_ip("1.2.3.4"), None);
    h.pipeline.drain().await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.is_success());
    assert!(response.submission_id().is_some());
    assert!(response.rate_limit.is_none());
    assert!(h.limiter.peek("1.2.3.4").is_none(), "spam must not consume quota");
    assert!(h.recorder.records().is_empty());
    assert!(h.telemetry.events().is_empty());
}

#[tokio::test]
async fn test_honeypot_checked_before_validation() {
    let h = Harness::new();
    let body = br#"{"honeypot":"filled"}"#;

    let response = h.pipeline.handle(body, &HeaderMap::new(), None);

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.is_success());
}

#[tokio::test]
async fn test_malformed_body_gets_generic_failure() {
    let h = Harness::new();

    let response = h.pipeline.handle(b"{not json", &from_ip("1.2.3.4"), None);
    h.pipeline.drain().await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body.message, GENERIC_FAILURE_MESSAGE);
    assert!(h.limiter.peek("1.2.3.4").is_none());
    assert_eq!(h.telemetry.names(), vec![event_names::ERROR]);
}

#[tokio::test]
async fn test_accepted_submission_is_recorded_and_reported() {
    let h = Harness::new();
    let body = br#"{
        "name": "  Jo Smith ",
        "email": "JO@Example.com",
        "phone": "   ",
        "projectType": "Website",
        "message": "Hello"
    }"#;

    let response = h.pipeline.handle(body, &from_ip("1.2.3.4"), None);
    h.pipeline.drain().await;

    assert_eq!(response.status, StatusCode::OK);
    let id = response.submission_id().map(str::to_string);
    assert!(id.is_some());

    let records = h.recorder.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(Some(record.submission_id.clone()), id);
    assert_eq!(record.name, "Jo Smith");
    assert_eq!(record.email, "jo@example.com");
    assert_eq!(record.phone, None);
    assert_eq!(record.project_type.as_deref(), Some("Website"));
    assert_eq!(record.client_ip, "1.2.3.4");

    let events = h.telemetry.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, event_names::SUBMITTED);
    assert_eq!(events[0].attribute("projectType"), Some("Website"));
    assert_eq!(events[0].attribute("budget"), Some("not_specified"));
    assert_eq!(events[0].attribute("timeline"), Some("not_specified"));
    assert_eq!(events[0].attribute("recorded"), Some("true"));
}

#[tokio::test]
async fn test_recorder_failure_does_not_change_response() {
    let recorder = Arc::new(FailingRecorder::default());
    let telemetry = Arc::new(RecordingTelemetry::default());
    let pipeline =
        IntakePipeline::new(Arc::new(RateLimiter::new()), recorder.clone(), telemetry.clone());

    let response = pipeline.handle(&valid_body(), &from_ip("1.2.3.4"), None);
    pipeline.drain().await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.is_success());
    assert_eq!(recorder.calls(), 1);

    let events = telemetry.events();
    assert_eq!(
        events.iter().map(|e| e.name).collect::<Vec<_>>(),
        vec![event_names::ERROR, event_names::SUBMITTED]
    );
    assert_eq!(events[0].attribute("stage"), Some("recorder"));
    assert_eq!(events[1].attribute("recorded"), Some("false"));
}

#[tokio::test]
async fn test_telemetry_failure_does_not_change_response() {
    let recorder = Arc::new(RecordingRecorder::default());
    let pipeline = IntakePipeline::new(
        Arc::new(RateLimiter::new()),
        recorder.clone(),
        Arc::new(FailingTelemetry),
    );

    let response = pipeline.handle(&valid_body(), &from_ip("1.2.3.4"), None);
    pipeline.drain().await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(recorder.records().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_recorder_bounded_by_fanout_timeout() {
    let telemetry = Arc::new(RecordingTelemetry::default());
    let pipeline = IntakePipeline::new(
        Arc::new(RateLimiter::new()),
        Arc::new(StalledRecorder),
        telemetry.clone(),
    )
    .with_fanout_timeout(Duration::from_secs(5));

    let response = pipeline.handle(&valid_body(), &from_ip("1.2.3.4"), None);
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(pipeline.pending_dispatches(), 1);

    pipeline.drain().await;

    assert_eq!(pipeline.pending_dispatches(), 0);
    let events = telemetry.events();
    assert_eq!(
        events.iter().map(|e| e.name).collect::<Vec<_>>(),
        vec![event_names::ERROR, event_names::SUBMITTED],
        "a timed-out recording is still reported"
    );
    assert_eq!(events[0].attribute("stage"), Some("recorder"));
    assert_eq!(events[1].attribute("recorded"), Some("false"));
}

#[tokio::test]
async fn test_null_required_field_reported_missing() {
    let h = Harness::new();
    let body = br#"{"name":null,"email":"a@b.co","message":"hi"}"#;

    let response = h.pipeline.handle(body, &from_ip("1.2.3.4"), None);
    h.pipeline.drain().await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body.message, "Please fill in all required fields: name.");
    assert!(h.limiter.peek("1.2.3.4").is_none());
    assert_eq!(h.telemetry.events()[0].attribute("reason"), Some("missing_fields"));
}

#[tokio::test]
async fn test_untrusted_headers_key_on_peer() {
    let h = Harness::new();
    let pipeline = h.pipeline.with_trust_proxy_headers(false);
    let peer = "192.0.2.7:40000".parse().ok();

    let response = pipeline.handle(&valid_body(), &from_ip("1.2.3.4"), peer);
    pipeline.drain().await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(h.limiter.peek("1.2.3.4").is_none());
    assert_eq!(h.limiter.peek("192.0.2.7").map(|e| e.count), Some(1));
    assert_eq!(h.recorder.records()[0].client_ip, "192.0.2.7");
}
