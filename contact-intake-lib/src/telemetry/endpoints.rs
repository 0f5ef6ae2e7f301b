//! Response bodies of the observability server.

use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};
use prometheus::{Encoder, Registry, TextEncoder};
use serde_json::{json, Value};

use crate::error::{IntakeError, Result};

pub(crate) type RespBody = BoxBody<Bytes, hyper::Error>;

/// `/health`: 200 while the process runs.
pub fn health_check_response() -> Result<Response<RespBody>> {
    json_response(&json!({"status": "healthy"}))
}

/// `/ready`: always 200 once the server is accepting.
///
/// `recorder` reports whether accepted submissions reach a spreadsheet.
pub fn ready_check_response(recorder_configured: bool) -> Result<Response<RespBody>> {
    let recorder = if recorder_configured { "sheets" } else { "unconfigured" };
    json_response(&json!({"status": "ready", "recorder": recorder}))
}

/// `/live`: 200 while the process runs.
pub fn live_check_response() -> Result<Response<RespBody>> {
    json_response(&json!({"status": "alive"}))
}

/// `/metrics`: Prometheus text exposition of `registry`.
pub fn handle_metrics(registry: &Registry) -> Result<Response<RespBody>> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buffer)
        .map_err(|e| IntakeError::Http(format!("Failed to encode metrics: {e}")))?;
    respond(StatusCode::OK, encoder.format_type(), buffer)
}

fn json_response(body: &Value) -> Result<Response<RespBody>> {
    let bytes = serde_json::to_vec(body)
        .map_err(|e| IntakeError::Http(format!("Failed to serialize health response: {e}")))?;
    respond(StatusCode::OK, "application/json", bytes)
}

pub(crate) fn respond(
    status: StatusCode,
    content_type: &str,
    body: impl Into<Bytes>,
) -> Result<Response<RespBody>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .body(Full::new(body.into()).map_err(|never| match never {}).boxed())
        .map_err(|e| IntakeError::Http(format!("Failed to build response: {e}")))
}
