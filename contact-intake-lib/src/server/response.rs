use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use http::StatusCode;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Bytes;
use hyper::Response;
use serde_json::json;

use crate::error::{IntakeError, Result};
use crate::intake::rejection::GENERIC_FAILURE_MESSAGE;
use crate::intake::IntakeResponse;

pub type RespBody = BoxBody<Bytes, hyper::Error>;

const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Serialize a pipeline outcome into an HTTP response.
pub fn intake_response(outcome: &IntakeResponse) -> Result<Response<RespBody>> {
    let body = serde_json::to_vec(&outcome.body)
        .map_err(|e| IntakeError::Http(format!("Failed to serialize response: {e}")))?;

    let mut builder = Response::builder()
        .status(outcome.status)
        .header(CONTENT_TYPE, "application/json");

    if let Some(rl) = outcome.rate_limit {
        builder = builder
            .header(X_RATELIMIT_LIMIT, HeaderValue::from(rl.limit))
            .header(X_RATELIMIT_REMAINING, HeaderValue::from(rl.remaining));
        if let Some(retry_after) = rl.retry_after {
            // Round up so clients never retry before the window resets
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            builder = builder.header(RETRY_AFTER, HeaderValue::from(secs));
        }
    }

    builder
        .body(full(body))
        .map_err(|e| IntakeError::Http(format!("Failed to build response: {e}")))
}

/// JSON failure response outside the pipeline (unknown path, wrong method).
pub fn error_response(status: StatusCode, message: &str) -> Response<RespBody> {
    let body = json!({"success": false, "message": message}).to_string();
    let mut resp = Response::new(full(body));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

/// Last-resort 500 when even building a response failed.
pub fn internal_error() -> Response<RespBody> {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE_MESSAGE)
}

fn full(body: impl Into<Bytes>) -> RespBody {
    Full::new(body.into())
        .map_err(|never| match never {})
        .boxed()
}
