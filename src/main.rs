//! Lifecycle-managed TCP echo service.
//!
//! # Architecture Overview
//!
//! ```text
//!   main
//!    ├─ config (TOML → ServiceConfig, validated)
//!    ├─ observability (tracing subscriber, optional Prometheus exporter)
//!    └─ Service::serve("listener", addr, start, stop)
//!          start: EchoServer::run  ── accepts until Shutdown fires
//!          stop:  Shutdown::trigger → ConnectionTracker::drain
//!          SIGINT / SIGTERM ──────────▶ stop ──▶ worker result ──▶ exit
//! ```

use std::path::PathBuf;

use clap::Parser;

use svc_lifecycle::config::{load_config, validate_config, ConfigError, ServiceConfig};
use svc_lifecycle::lifecycle::{Service, Shutdown};
use svc_lifecycle::net::connection::ConnectionTracker;
use svc_lifecycle::net::echo::EchoServer;
use svc_lifecycle::net::listener::Listener;
use svc_lifecycle::observability::{init_tracing, metrics};

#[derive(Parser)]
#[command(name = "svc-lifecycle")]
#[command(about = "TCP echo service with signal-driven graceful shutdown", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    init_tracing(&config.logging)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "svc-lifecycle starting");

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let listener = Listener::bind(&config.listener).await?;
    let mut service = Service::new().with_logging(config.logging.clone());
    if let Some(timeout) = config.shutdown.worker_timeout() {
        service = service.with_worker_timeout(timeout);
    }
    service.set_addr(listener.local_addr()?.to_string());

    let shutdown = Shutdown::new();
    let tracker = ConnectionTracker::new();
    let server = EchoServer::new(listener, tracker.clone());
    let worker_shutdown = shutdown.subscribe();
    let drain_timeout = config.shutdown.drain_timeout();

    let addr = service.get_addr();
    service
        .serve(
            &config.listener.name,
            &addr,
            move |result| async move { result.send(server.run(worker_shutdown).await) },
            move |logger| async move {
                shutdown.trigger();
                if !tracker.drain(drain_timeout).await {
                    logger.warn("Connections still open after drain timeout");
                }
            },
        )
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
