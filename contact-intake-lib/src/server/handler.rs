use http::{Method, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::response::{error_response, intake_response, internal_error, RespBody};
use crate::config::Config;
use crate::intake::{IntakePipeline, Rejection};
use crate::telemetry::Metrics;

/// Shared state of the submission server
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IntakePipeline>,
    pub path: String,
    pub max_body_bytes: usize,
    pub body_read_timeout: Duration,
    pub metrics: Option<Arc<Metrics>>,
}

impl AppState {
    pub fn new(config: &Config, pipeline: Arc<IntakePipeline>, metrics: Option<Arc<Metrics>>) -> Self {
        Self {
            pipeline,
            path: config.intake.path.clone(),
            max_body_bytes: config.intake.max_body_bytes,
            body_read_timeout: config.timeout.body_read(),
            metrics,
        }
    }
}

/// Route one HTTP request.
pub async fn handle_request(
    req: Request<Incoming>,
    state: &AppState,
    peer: SocketAddr,
) -> Response<RespBody> {
    let started = Instant::now();
    let method = req.method().clone();

    let resp = if req.uri().path() != state.path {
        error_response(StatusCode::NOT_FOUND, "Not Found")
    } else if method != Method::POST {
        let mut resp = error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        resp.headers_mut()
            .insert(http::header::ALLOW, http::HeaderValue::from_static("POST"));
        resp
    } else {
        submit(req, state, peer).await
    };

    if let Some(m) = &state.metrics {
        m.record_request(method.as_str(), resp.status().as_u16(), started.elapsed().as_secs_f64());
    }
    resp
}

async fn submit(req: Request<Incoming>, state: &AppState, peer: SocketAddr) -> Response<RespBody> {
    let (parts, body) = req.into_parts();

    let outcome = match read_body(body, state.max_body_bytes, state.body_read_timeout).await {
        Ok(bytes) => state.pipeline.handle(&bytes, &parts.headers, Some(peer)),
        Err(rejection) => state.pipeline.reject(rejection),
    };

    intake_response(&outcome).unwrap_or_else(|e| {
        warn!(error = %e, "failed to build intake response");
        internal_error()
    })
}

async fn read_body(
    body: Incoming,
    max_bytes: usize,
    timeout: Duration,
) -> Result<Bytes, Rejection> {
    let collect = Limited::new(body, max_bytes).collect();
    match tokio::time::timeout(timeout, collect).await {
        Ok(Ok(collected)) => Ok(collected.to_bytes()),
        Ok(Err(e)) if e.downcast_ref::<LengthLimitError>().is_some() => {
            debug!(max_bytes, "submission body over limit");
            Err(Rejection::PayloadTooLarge)
        }
        Ok(Err(e)) => {
            debug!(error = %e, "failed to read submission body");
            Err(Rejection::Internal)
        }
        Err(_) => {
            debug!(?timeout, "timed out reading submission body");
            Err(Rejection::Internal)
        }
    }
}
