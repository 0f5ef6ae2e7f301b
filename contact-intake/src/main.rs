#![forbid(unsafe_code)]

use clap::Parser;
use contact_intake_lib::config::load_from_path;
use contact_intake_lib::server::shutdown_on_signal;
use contact_intake_lib::telemetry::{init_metrics, init_tracing, start_observability_server};
use contact_intake_lib::{
    run, AppState, Config, IntakePipeline, MetricsTelemetry, RateLimiter, SheetsRecorder,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Contact form intake service")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(short, long, value_name = "FILE", env = "CONTACT_INTAKE_CONFIG", default_value = "config/contact.toml")]
    config: PathBuf,

    /// Write the column titles into the spreadsheet's first row and exit
    #[arg(long)]
    init_sheet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = init_tracing(
        &cfg.logging.level,
        cfg.logging.show_target,
        &cfg.telemetry.otel_log_level,
    ) {
        eprintln!("failed to initialize tracing: {err}");
        std::process::exit(1);
    }

    let recorder = match SheetsRecorder::new(cfg.sheets.clone()) {
        Ok(r) => Arc::new(r),
        Err(err) => {
            error!(%err, "failed to build spreadsheet client");
            std::process::exit(1);
        }
    };

    if cli.init_sheet {
        if let Err(err) = recorder.initialize_sheet().await {
            error!(%err, "failed to initialize spreadsheet");
            std::process::exit(1);
        }
        return;
    }

    if let Err(err) = serve(Arc::new(cfg), recorder).await {
        error!(%err, "contact intake server exited with error");
        std::process::exit(1);
    }
}

async fn serve(
    cfg: Arc<Config>,
    recorder: Arc<SheetsRecorder>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!(listen = ?cfg.listen, path = %cfg.intake.path, "configuration loaded");

    let recorder_configured = recorder.is_configured();
    if !recorder_configured {
        warn!("no spreadsheet configured, accepted submissions will not be persisted");
    }

    let (metrics, registry) = init_metrics()?;
    let shutdown = CancellationToken::new();

    if let Some(port) = cfg.telemetry.metrics_port {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(err) =
                start_observability_server(port, registry, recorder_configured, shutdown).await
            {
                error!(%err, "observability server exited with error");
            }
        });
    }

    let limiter = Arc::new(RateLimiter::new());
    let sweeper = limiter.spawn_sweeper(cfg.security.rate_limit.sweep_interval(), shutdown.clone());

    let telemetry = Arc::new(MetricsTelemetry::new(Some(metrics.clone())));
    let pipeline = Arc::new(
        IntakePipeline::from_config(&cfg, limiter, recorder, telemetry)
            .with_metrics(metrics.clone()),
    );
    let state = AppState::new(&cfg, pipeline, Some(metrics));

    let signals = tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let result = run(cfg, state, shutdown.clone()).await;

    shutdown.cancel();
    let _ = sweeper.await;
    signals.abort();

    result.map_err(Into::into)
}
