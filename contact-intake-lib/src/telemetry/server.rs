use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use prometheus::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::endpoints::{
    handle_metrics, health_check_response, live_check_response, ready_check_response, respond,
    RespBody,
};
use crate::error::Result;

/// Start the observability server on a dedicated port.
///
/// Serves:
/// - `/metrics` - Prometheus metrics
/// - `/health` - Health check endpoint
/// - `/ready` - Readiness check endpoint
/// - `/live` - Liveness check endpoint
pub async fn start_observability_server(
    port: u16,
    registry: Registry,
    recorder_configured: bool,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    serve_observability(listener, Arc::new(registry), recorder_configured, shutdown).await
}

/// Accept loop of the observability server on an already bound listener.
pub async fn serve_observability(
    listener: TcpListener,
    registry: Arc<Registry>,
    recorder_configured: bool,
    shutdown: CancellationToken,
) -> Result<()> {
    info!(addr = ?listener.local_addr().ok(), "Observability server started (metrics + health checks)");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Observability server: shutting down");
                break;
            }
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok((stream, peer)) => (stream, peer),
                    Err(e) => {
                        warn!(error = %e, "Observability server: accept error");
                        continue;
                    }
                };

                let registry = registry.clone();
                tokio::spawn(async move {
                    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let registry = registry.clone();
                        async move {
                            let resp = match req.uri().path() {
                                "/health" => or_internal_error(health_check_response()),
                                "/ready" => or_internal_error(ready_check_response(recorder_configured)),
                                "/live" => or_internal_error(live_check_response()),
                                "/metrics" => or_internal_error(handle_metrics(&registry)),
                                _ => or_internal_error(respond(StatusCode::NOT_FOUND, "text/plain", "Not Found")),
                            };
                            Ok::<_, hyper::Error>(resp)
                        }
                    });

                    let builder = ConnBuilder::new(TokioExecutor::new());
                    if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                        warn!(?peer, error = %e, "Observability server: serve_connection error");
                    }
                });
            }
        }
    }

    info!("Observability server stopped");
    Ok(())
}

fn or_internal_error(result: Result<Response<RespBody>>) -> Response<RespBody> {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "Observability server: failed to build response");
        let mut resp = Response::new(RespBody::default());
        *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        resp
    })
}
