use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::handler::{handle_request, AppState};
use crate::config::Config;
use crate::error::{IntakeError, Result};

/// Guard to decrement active connections counter when dropped
struct ConnectionGuard(Arc<AtomicUsize>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Bind `config.listen` and serve submissions until `shutdown` is cancelled.
pub async fn run(config: Arc<Config>, state: AppState, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(config.listen).await.map_err(IntakeError::Io)?;
    serve(listener, state, config.timeout.shutdown(), shutdown).await
}

/// Accept loop on an already bound listener.
///
/// After `shutdown` fires, new connections are no longer accepted; open ones
/// and pending recorder/telemetry dispatches get up to `shutdown_timeout`.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown_timeout: Duration,
    shutdown: CancellationToken,
) -> Result<()> {
    let builder = ConnBuilder::new(TokioExecutor::new());
    let active_connections = Arc::new(AtomicUsize::new(0));

    info!(addr = ?listener.local_addr().ok(), path = %state.path, "contact intake server listening");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok((stream, peer)) => (stream, peer),
                    Err(e) => {
                        warn!(error = %e, "accept error");
                        continue;
                    }
                };

                active_connections.fetch_add(1, Ordering::Relaxed);

                let builder = builder.clone();
                let state = state.clone();
                let active_connections = active_connections.clone();

                tokio::spawn(async move {
                    let _guard = ConnectionGuard(active_connections);

                    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let state = state.clone();
                        async move { Ok::<_, hyper::Error>(handle_request(req, &state, peer).await) }
                    });

                    if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                        warn!(?peer, error = %e, "serve_connection error");
                    }
                });
            }
        }
    }

    info!(
        "Waiting for active connections to finish (timeout: {}s)",
        shutdown_timeout.as_secs()
    );
    let start = std::time::Instant::now();
    loop {
        let active = active_connections.load(Ordering::Relaxed);
        if active == 0 {
            info!("All connections closed");
            break;
        }
        if start.elapsed() >= shutdown_timeout {
            warn!(active_connections = active, "Shutdown timeout reached with connections still active");
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }

    let remaining = shutdown_timeout.saturating_sub(start.elapsed());
    if tokio::time::timeout(remaining, state.pipeline.drain()).await.is_err() {
        warn!(
            pending = state.pipeline.pending_dispatches(),
            "Shutdown timeout reached with submission dispatches still pending"
        );
    }

    info!("Contact intake server stopped");
    Ok(())
}

/// Cancel `shutdown` on SIGTERM or SIGINT.
pub async fn shutdown_on_signal(shutdown: CancellationToken) -> Result<()> {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).map_err(|e| {
        IntakeError::Io(std::io::Error::other(format!("Failed to setup SIGTERM handler: {e}")))
    })?;
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).map_err(|e| {
        IntakeError::Io(std::io::Error::other(format!("Failed to setup SIGINT handler: {e}")))
    })?;

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
        _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
        _ = shutdown.cancelled() => return Ok(()),
    }
    shutdown.cancel();
    Ok(())
}
