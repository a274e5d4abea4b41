use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use svc_lifecycle::config::{load_config, ConfigError, ProbeConfig};
use svc_lifecycle::net::tls::load_client_config;
use svc_lifecycle::probe::{Probe, RpcDialOptions};
use svc_lifecycle::resilience::Backoff;

#[derive(Parser)]
#[command(name = "svc-probe")]
#[command(about = "Wait until a network endpoint is reachable", long_about = None)]
struct Cli {
    /// Read the [probe] section of this config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of connection attempts.
    #[arg(short, long)]
    tries: Option<u32>,

    /// Per-attempt timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Constant delay between attempts in milliseconds.
    #[arg(long)]
    backoff_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plain TCP connect
    Tcp { addr: String },
    /// TCP connect plus TLS handshake
    Tls {
        addr: String,
        /// PEM file with the CA certificates to trust.
        #[arg(long)]
        ca_file: PathBuf,
    },
    /// RPC channel construction
    Rpc {
        addr: String,
        /// Wait for the connection instead of building the channel lazily.
        #[arg(long)]
        block: bool,
    },
}

/// Probe settings: config file (or defaults), then command-line overrides.
fn probe_settings(cli: &Cli) -> Result<ProbeConfig, ConfigError> {
    let mut settings = match &cli.config {
        Some(path) => load_config(path)?.probe,
        None => ProbeConfig::default(),
    };
    if let Some(tries) = cli.tries {
        settings.tries = tries;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        settings.timeout_ms = timeout_ms;
    }
    if let Some(backoff_ms) = cli.backoff_ms {
        settings.backoff = Backoff::constant(Duration::from_millis(backoff_ms));
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let probe = Probe::from_config(&probe_settings(&cli)?);
    let timeout = probe.timeout();

    let addr = match cli.command {
        Commands::Tcp { addr } => {
            probe.tcp(&addr).await?;
            addr
        }
        Commands::Tls { addr, ca_file } => {
            let config = load_client_config(&ca_file)?;
            probe.tls(&addr, config).await?;
            addr
        }
        Commands::Rpc { addr, block } => {
            let mut options = RpcDialOptions::default().with_connect_timeout(timeout);
            options.block = block;
            probe.rpc(&addr, &options).await?;
            addr
        }
    };

    println!("{} is reachable", addr);
    Ok(())
}
